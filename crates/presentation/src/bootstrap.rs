use crate::config::ProjectConfig;
use crate::env::Environment;
use crate::manager::{ModuleManager, UiState};
use crate::module::Module;
use crate::modules::{
    DockOverlayModule, EditorVisualModule, LayoutSpacingModule, ThemeTransitionModule,
};
use dom::Document;
use std::rc::Rc;

/// Register the editor, theme, layout and dock modules, in that order.
/// Returns the names that were newly registered.
pub fn register_default_modules(
    manager: &mut ModuleManager,
    document: &Document,
    config: &Rc<ProjectConfig>,
) -> Vec<String> {
    let defaults: [(&str, Box<dyn Module>); 4] = [
        (
            "editor",
            Box::new(EditorVisualModule::new(document, Rc::clone(config))),
        ),
        (
            "theme",
            Box::new(ThemeTransitionModule::new(document, Rc::clone(config))),
        ),
        (
            "layout",
            Box::new(LayoutSpacingModule::new(document, Rc::clone(config))),
        ),
        (
            "dock",
            Box::new(DockOverlayModule::new(document, Rc::clone(config))),
        ),
    ];
    defaults
        .into_iter()
        .filter_map(|(name, module)| manager.register_module(name, module).then(|| name.to_owned()))
        .collect()
}

/// A manager seeded from the document's current state, with the default modules registered.
pub fn default_manager(document: &Document, config: &Rc<ProjectConfig>) -> ModuleManager {
    let environment = Environment::detect(document);
    let mut manager = ModuleManager::new(UiState::detect(document, &environment, &config.class_names));
    register_default_modules(&mut manager, document, config);
    manager
}
