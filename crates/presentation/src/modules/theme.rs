//! Theme transition class, dark-mode change broadcast and theme toggling.

use crate::config::ProjectConfig;
use crate::module::Module;
use anyhow::{Result, anyhow};
use core::cell::Cell;
use core::fmt;
use core::time::Duration;
use dom::{Document, Event, NodeId, ObserveOptions};
use dom_sync::{Debouncer, DomObserverBinding};
use log::{debug, info};
use serde_json::json;
use std::rc::Rc;

/// Name of the custom event dispatched when dark mode flips.
pub const THEME_CHANGE_EVENT: &str = "themeChange";
pub const TRANSITION_DURATION_PROPERTY: &str = "--theme-transition-duration";
pub const TRANSITION_TIMING_PROPERTY: &str = "--theme-transition-timing";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

pub struct ThemeTransitionModule {
    document: Document,
    config: Rc<ProjectConfig>,
    observer: Option<DomObserverBinding>,
}

impl ThemeTransitionModule {
    pub fn new(document: &Document, config: Rc<ProjectConfig>) -> Self {
        Self {
            document: document.clone(),
            config,
            observer: None,
        }
    }

    fn root(&self) -> Result<NodeId> {
        self.document
            .document_element()
            .ok_or_else(|| anyhow!("document has no root element"))
    }

    pub fn current_theme(&self) -> Theme {
        let dark = self
            .document
            .document_element()
            .is_some_and(|root| self.document.has_class(root, &self.config.class_names.dark_mode));
        if dark { Theme::Dark } else { Theme::Light }
    }

    /// Flip the dark-mode class on the root, returning the new theme.
    pub fn toggle_theme(&self) -> Theme {
        if let Some(root) = self.document.document_element() {
            self.document
                .toggle_class(root, &self.config.class_names.dark_mode);
        }
        self.current_theme()
    }
}

fn publish_theme_change(document: &Document, root: NodeId, config: &ProjectConfig, is_dark_mode: bool) {
    document.set_style_property(
        root,
        TRANSITION_DURATION_PROPERTY,
        &config.transition_duration_css(),
    );
    document.set_style_property(root, TRANSITION_TIMING_PROPERTY, &config.ui.animation_timing);
    let listeners = document.dispatch(&Event::custom(
        THEME_CHANGE_EVENT,
        json!({ "isDarkMode": is_dark_mode }),
    ));
    debug!("theme change (dark: {is_dark_mode}) delivered to {listeners} listeners");
}

impl Module for ThemeTransitionModule {
    fn name(&self) -> &str {
        "theme"
    }

    fn init(&mut self) -> Result<()> {
        if self.observer.is_some() {
            debug!("theme module already initialized");
            return Ok(());
        }
        let root = self.root()?;
        let classes = &self.config.class_names;
        self.document.add_class(root, &classes.theme_transition);

        let last_dark = Rc::new(Cell::new(self.current_theme() == Theme::Dark));
        let document = self.document.clone();
        let config = Rc::clone(&self.config);
        let debouncer = Debouncer::new(Duration::ZERO, move |_records| {
            let is_dark_mode = document.has_class(root, &config.class_names.dark_mode);
            if last_dark.replace(is_dark_mode) != is_dark_mode {
                publish_theme_change(&document, root, &config, is_dark_mode);
            }
            async {}
        });
        let observer = DomObserverBinding::new(&self.document, debouncer);
        observer.observe(root, ObserveOptions::attributes(["class"]));
        self.observer = Some(observer);
        info!("theme transitions enabled ({})", self.current_theme());
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        let Some(root) = self.document.document_element() else {
            return Ok(());
        };
        self.document
            .remove_class(root, &self.config.class_names.theme_transition);
        self.document
            .remove_style_property(root, TRANSITION_DURATION_PROPERTY);
        self.document
            .remove_style_property(root, TRANSITION_TIMING_PROPERTY);
        Ok(())
    }
}
