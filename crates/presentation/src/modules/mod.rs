//! The concrete presentation modules.

mod dock;
mod editor;
mod layout;
mod theme;

pub use dock::DockOverlayModule;
pub use editor::EditorVisualModule;
pub use layout::{LayoutSpacingModule, PREVIOUS_PADDING_KEY, SPACING_PROPERTY};
pub use theme::{
    THEME_CHANGE_EVENT, TRANSITION_DURATION_PROPERTY, TRANSITION_TIMING_PROPERTY, Theme,
    ThemeTransitionModule,
};

use dom::Document;
use tokio::task::AbortHandle;

/// Remove `class` from every element matching `selector`, returning how many changed.
fn sweep_class(document: &Document, selector: &str, class: &str) -> usize {
    document
        .query_selector_all(selector)
        .into_iter()
        .filter(|element| document.remove_class(*element, class))
        .count()
}

fn abort_task(task: &mut Option<AbortHandle>) {
    if let Some(handle) = task.take() {
        handle.abort();
    }
}
