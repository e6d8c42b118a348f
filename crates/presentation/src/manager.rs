//! Registry owning every presentation module.
//!
//! Modules are initialized and destroyed in registration order. A failing
//! module is logged and reported but never stops its siblings.

use crate::config::ClassNames;
use crate::env::Environment;
use crate::module::Module;
use core::fmt;
use dom::Document;
use log::{debug, error, info, warn};

/// Snapshot of UI flags. Readers always get a copy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UiState {
    pub is_dark_mode: bool,
    pub is_full_screen: bool,
    pub is_mobile: bool,
}

impl UiState {
    pub fn detect(document: &Document, environment: &Environment, classes: &ClassNames) -> Self {
        let is_dark_mode = document
            .document_element()
            .is_some_and(|root| document.has_class(root, &classes.dark_mode));
        Self {
            is_dark_mode,
            is_full_screen: document.fullscreen_element().is_some(),
            is_mobile: environment.is_mobile,
        }
    }

    /// Copy with every field set in `patch` replaced.
    #[must_use]
    pub fn merged(self, patch: UiStatePatch) -> Self {
        Self {
            is_dark_mode: patch.is_dark_mode.unwrap_or(self.is_dark_mode),
            is_full_screen: patch.is_full_screen.unwrap_or(self.is_full_screen),
            is_mobile: patch.is_mobile.unwrap_or(self.is_mobile),
        }
    }
}

/// Partial update for [`UiState`]; `None` leaves a field untouched.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UiStatePatch {
    pub is_dark_mode: Option<bool>,
    pub is_full_screen: Option<bool>,
    pub is_mobile: Option<bool>,
}

impl UiStatePatch {
    pub const fn dark_mode(is_dark_mode: bool) -> Self {
        Self {
            is_dark_mode: Some(is_dark_mode),
            is_full_screen: None,
            is_mobile: None,
        }
    }
}

/// Outcome of a lifecycle sweep, by module name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LifecycleReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl LifecycleReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

struct ModuleRecord {
    name: String,
    instance: Box<dyn Module>,
}

pub struct ModuleManager {
    modules: Vec<ModuleRecord>,
    ui_state: UiState,
}

impl ModuleManager {
    pub const fn new(ui_state: UiState) -> Self {
        Self {
            modules: Vec::new(),
            ui_state,
        }
    }

    /// Register `module` under `name`. A duplicate name is ignored with a
    /// warning; the first registration stays. Returns whether it was added.
    pub fn register_module(&mut self, name: &str, module: Box<dyn Module>) -> bool {
        if self.modules.iter().any(|record| record.name == name) {
            warn!("Module {name} already exists");
            return false;
        }
        debug!("registered module {name} ({})", module.name());
        self.modules.push(ModuleRecord {
            name: name.to_owned(),
            instance: module,
        });
        true
    }

    pub fn initialize_modules(&mut self) -> LifecycleReport {
        let mut report = LifecycleReport::default();
        for record in &mut self.modules {
            match record.instance.init() {
                Ok(()) => report.succeeded.push(record.name.clone()),
                Err(err) => {
                    error!("Failed to initialize module {}: {err:#}", record.name);
                    report.failed.push(record.name.clone());
                }
            }
        }
        info!(
            "initialized {} modules ({} failed)",
            report.succeeded.len(),
            report.failed.len()
        );
        report
    }

    /// Destroy every module, then clear the registry.
    pub fn destroy_modules(&mut self) -> LifecycleReport {
        let mut report = LifecycleReport::default();
        for mut record in self.modules.drain(..) {
            match record.instance.destroy() {
                Ok(()) => report.succeeded.push(record.name),
                Err(err) => {
                    error!("Failed to destroy module {}: {err:#}", record.name);
                    report.failed.push(record.name);
                }
            }
        }
        report
    }

    pub const fn ui_state(&self) -> UiState {
        self.ui_state
    }

    pub fn update_ui_state(&mut self, patch: UiStatePatch) {
        self.ui_state = self.ui_state.merged(patch);
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules
            .iter()
            .map(|record| record.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for ModuleManager {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ModuleManager")
            .field("modules", &self.module_names())
            .field("ui_state", &self.ui_state)
            .finish()
    }
}
