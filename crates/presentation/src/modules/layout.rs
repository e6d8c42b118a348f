//! Mirrors each editor surface's left padding into `--protyle-spacing`.
//!
//! A pass waits out the host's panel transition, reads every surface first
//! and only then writes, and skips surfaces whose padding has not changed
//! since the marker was last written.

use super::abort_task;
use crate::config::ProjectConfig;
use crate::module::Module;
use anyhow::Result;
use dom::{Document, NodeId, ObserveOptions};
use dom_sync::{Debouncer, DomObserverBinding, await_selector};
use log::{debug, trace};
use std::rc::Rc;
use tokio::task::{AbortHandle, spawn_local};

pub const SPACING_PROPERTY: &str = "--protyle-spacing";
/// `data-prevpadding`
pub const PREVIOUS_PADDING_KEY: &str = "prevpadding";

pub struct LayoutSpacingModule {
    document: Document,
    config: Rc<ProjectConfig>,
    observer: Option<Rc<DomObserverBinding>>,
    attach: Option<AbortHandle>,
}

struct Measurement {
    surface: NodeId,
    padding: Option<String>,
}

impl LayoutSpacingModule {
    pub fn new(document: &Document, config: Rc<ProjectConfig>) -> Self {
        Self {
            document: document.clone(),
            config,
            observer: None,
            attach: None,
        }
    }

    /// Editor surfaces inside windows that do not host a file tree.
    fn tracked_surfaces(document: &Document, config: &ProjectConfig) -> Vec<NodeId> {
        document
            .query_selector_all(&config.selectors.window)
            .into_iter()
            .filter(|window| {
                document
                    .query_selector_in(*window, &config.selectors.file_tree)
                    .is_none()
            })
            .flat_map(|window| document.query_selector_all_in(window, &config.selectors.wysiwyg))
            .collect()
    }
}

fn apply_spacings(document: &Document, config: &ProjectConfig) {
    let measurements: Vec<Measurement> = LayoutSpacingModule::tracked_surfaces(document, config)
        .into_iter()
        .filter_map(|surface| {
            let padding = document.style_property(surface, "padding-left");
            let previous = document.dataset(surface, PREVIOUS_PADDING_KEY);
            (padding != previous).then_some(Measurement { surface, padding })
        })
        .collect();

    trace!("{} surfaces need a spacing update", measurements.len());
    for Measurement { surface, padding } in measurements {
        match padding {
            Some(padding) => {
                document.set_style_property(surface, SPACING_PROPERTY, &padding);
                document.set_dataset(surface, PREVIOUS_PADDING_KEY, &padding);
            }
            None => {
                document.remove_style_property(surface, SPACING_PROPERTY);
                document.remove_dataset(surface, PREVIOUS_PADDING_KEY);
            }
        }
    }
}

impl Module for LayoutSpacingModule {
    fn name(&self) -> &str {
        "layout"
    }

    fn init(&mut self) -> Result<()> {
        if self.observer.is_some() {
            debug!("layout module already initialized");
            return Ok(());
        }
        let document = self.document.clone();
        let config = Rc::clone(&self.config);
        // The quiet period doubles as the host transition delay.
        let debouncer = Debouncer::new(self.config.transition_duration(), move |_records| {
            apply_spacings(&document, &config);
            async {}
        });
        let observer = Rc::new(DomObserverBinding::new(&self.document, debouncer));

        let document = self.document.clone();
        let config = Rc::clone(&self.config);
        let binding = Rc::clone(&observer);
        self.attach = Some(
            spawn_local(async move {
                let Some(layouts) =
                    await_selector(&document, &config.selectors.layout_root, config.wait_options())
                        .await
                else {
                    debug!("layout root never appeared; spacing updates idle");
                    return;
                };
                binding.observe(layouts, ObserveOptions::subtree(["class", "style"]));
                binding.debouncer().invoke(Vec::new());
            })
            .abort_handle(),
        );
        self.observer = Some(observer);
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        abort_task(&mut self.attach);
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        for surface in self.document.query_selector_all(&self.config.selectors.wysiwyg) {
            self.document.remove_style_property(surface, SPACING_PROPERTY);
            self.document.remove_dataset(surface, PREVIOUS_PADDING_KEY);
        }
        Ok(())
    }
}
