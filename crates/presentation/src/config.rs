//! Configuration for the presentation modules.
//!
//! Defaults mirror the constants the host theme ships with. Values can be
//! overridden from a camelCase JSON file and then from `ASRI_*` environment
//! variables, in that order.

use anyhow::{Context as _, Result};
use core::time::Duration;
use dom_sync::WaitOptions;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeInfo {
    pub name: String,
    pub version: String,
    pub author: String,
}

impl Default for ThemeInfo {
    fn default() -> Self {
        Self {
            name: "Asri".to_owned(),
            version: "3.1.0".to_owned(),
            author: "mustakshif".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Quiet period before the background pass runs.
    pub debounce_ms: u64,
    /// Upper bound on how long a selection change waits for input to settle.
    pub selection_change_delay_ms: u64,
    /// Block types that draw their own selection and never get the mark.
    pub excluded_block_types: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            selection_change_delay_ms: 300,
            excluded_block_types: ["NodeAttributeView", "NodeCodeBlock", "NodeList", "NodeHTMLBlock"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiConfig {
    /// Host CSS transition length. Also the delay before layout measurement.
    pub transition_duration_ms: u64,
    pub animation_timing: String,
    /// Polling cadence of bounded DOM waits.
    pub poll_interval_ms: u64,
    /// Give-up point of bounded DOM waits.
    pub anchor_timeout_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            transition_duration_ms: 300,
            animation_timing: "var(--asri-ease-spring-2)".to_owned(),
            poll_interval_ms: 100,
            anchor_timeout_ms: 3000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassNames {
    pub selected_block: String,
    pub without_icon: String,
    pub theme_transition: String,
    pub dark_mode: String,
    pub dock_layout_expanded: String,
    pub hidden: String,
    pub floating_layout: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            selected_block: "asri-selected-block".to_owned(),
            without_icon: "without-icon".to_owned(),
            theme_transition: "theme-transition".to_owned(),
            dark_mode: "theme--dark".to_owned(),
            dock_layout_expanded: "dock-layout-expanded".to_owned(),
            hidden: "fn__none".to_owned(),
            floating_layout: "layout--float".to_owned(),
        }
    }
}

/// Host DOM anchors the modules look for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Selectors {
    pub protyle: String,
    pub background: String,
    pub background_image: String,
    pub background_icon: String,
    pub block: String,
    pub layout_root: String,
    pub window: String,
    pub file_tree: String,
    pub wysiwyg: String,
    pub dock_left: String,
    pub dock_right: String,
    pub layout_dock_left: String,
    pub layout_dock_right: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            protyle: ".protyle".to_owned(),
            background: ".protyle-top>.protyle-background".to_owned(),
            background_image: ".protyle-background__img img".to_owned(),
            background_icon: ".protyle-background__icon".to_owned(),
            block: "[data-node-id]".to_owned(),
            layout_root: "#layouts".to_owned(),
            window: r#"[data-type="wnd"]"#.to_owned(),
            file_tree: ".file-tree".to_owned(),
            wysiwyg: ".protyle-wysiwyg".to_owned(),
            dock_left: "#dockLeft".to_owned(),
            dock_right: "#dockRight".to_owned(),
            layout_dock_left: ".layout__dockl".to_owned(),
            layout_dock_right: ".layout__dockr".to_owned(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub theme: ThemeInfo,
    pub editor: EditorConfig,
    pub ui: UiConfig,
    pub class_names: ClassNames,
    pub selectors: Selectors,
}

fn env_millis(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|val| val.trim().parse::<u64>().ok())
}

impl ProjectConfig {
    /// Defaults with environment overrides applied.
    ///
    /// Reads the following environment variables:
    /// - `ASRI_DEBOUNCE_MS`: background pass debounce (default: 300)
    /// - `ASRI_SELECTION_DELAY_MS`: selection settle timeout (default: 300)
    /// - `ASRI_TRANSITION_MS`: host transition duration (default: 300)
    /// - `ASRI_ANIMATION_TIMING`: transition timing function
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(millis) = env_millis("ASRI_DEBOUNCE_MS") {
            self.editor.debounce_ms = millis;
        }
        if let Some(millis) = env_millis("ASRI_SELECTION_DELAY_MS") {
            self.editor.selection_change_delay_ms = millis;
        }
        if let Some(millis) = env_millis("ASRI_TRANSITION_MS") {
            self.ui.transition_duration_ms = millis;
        }
        if let Ok(timing) = env::var("ASRI_ANIMATION_TIMING")
            && !timing.trim().is_empty()
        {
            self.ui.animation_timing = timing;
        }
        self
    }

    /// Parse a (possibly partial) camelCase JSON config. Missing fields keep their defaults.
    ///
    /// # Errors
    /// Returns an error if `json` is not a valid config document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid project config")
    }

    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("parsing config {}", path.display()))
    }

    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.editor.debounce_ms)
    }

    pub const fn selection_change_delay(&self) -> Duration {
        Duration::from_millis(self.editor.selection_change_delay_ms)
    }

    pub const fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.ui.transition_duration_ms)
    }

    /// `--theme-transition-duration` value, e.g. `300ms`.
    pub fn transition_duration_css(&self) -> String {
        format!("{}ms", self.ui.transition_duration_ms)
    }

    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            interval: Duration::from_millis(self.ui.poll_interval_ms),
            timeout: Duration::from_millis(self.ui.anchor_timeout_ms),
        }
    }
}
