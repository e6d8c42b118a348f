//! Lifecycle-managed presentation modules for the host document.
//!
//! A [`ModuleManager`] owns a set of [`Module`]s and drives their `init` and
//! `destroy` in registration order. Each module watches the document through
//! the `dom_sync` primitives and applies idempotent visual corrections.

pub mod bootstrap;
pub mod config;
pub mod env;
pub mod manager;
pub mod module;
pub mod modules;

pub use bootstrap::{default_manager, register_default_modules};
pub use config::ProjectConfig;
pub use env::Environment;
pub use manager::{LifecycleReport, ModuleManager, UiState, UiStatePatch};
pub use module::Module;
