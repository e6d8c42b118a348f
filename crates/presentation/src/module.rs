use anyhow::Result;

/// A named presentation unit driven by the [`ModuleManager`](crate::ModuleManager).
///
/// `init` must not double-register anything when called twice without an
/// intervening `destroy`. `destroy` must release every observer, task and
/// listener acquired by `init` and revert every class or style it applied;
/// once it returns, nothing from the module may fire again.
pub trait Module {
    fn name(&self) -> &str;

    /// # Errors
    /// Returns an error if the module cannot attach to the document.
    fn init(&mut self) -> Result<()>;

    /// # Errors
    /// Returns an error if teardown could not complete.
    fn destroy(&mut self) -> Result<()>;
}
