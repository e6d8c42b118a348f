//! Dock overlay: `dock-layout-expanded` on a dock whose layout region is pinned and expanded.
//!
//! The host re-renders dock regions freely, so the whole body is observed and
//! both regions are re-queried on every settled batch.

use super::{abort_task, sweep_class};
use crate::config::ProjectConfig;
use crate::module::Module;
use anyhow::Result;
use core::time::Duration;
use dom::{Document, ObserveOptions};
use dom_sync::{Debouncer, DomObserverBinding, await_selector};
use log::debug;
use std::rc::Rc;
use tokio::task::{AbortHandle, spawn_local};

/// Marks a dock whose layout region is both pinned and expanded.
pub struct DockOverlayModule {
    document: Document,
    config: Rc<ProjectConfig>,
    observer: Option<Rc<DomObserverBinding>>,
    attach: Option<AbortHandle>,
}

impl DockOverlayModule {
    pub fn new(document: &Document, config: Rc<ProjectConfig>) -> Self {
        Self {
            document: document.clone(),
            config,
            observer: None,
            attach: None,
        }
    }
}

fn dock_pairs(config: &ProjectConfig) -> [(&str, &str); 2] {
    let selectors = &config.selectors;
    [
        (selectors.dock_left.as_str(), selectors.layout_dock_left.as_str()),
        (selectors.dock_right.as_str(), selectors.layout_dock_right.as_str()),
    ]
}

fn update_docks(document: &Document, config: &ProjectConfig) {
    let classes = &config.class_names;
    for (dock_selector, layout_selector) in dock_pairs(config) {
        let Some(dock) = document.query_selector(dock_selector) else {
            continue;
        };
        let layout = document.query_selector(layout_selector);
        let pinned = layout.is_some_and(|region| !document.has_class(region, &classes.floating_layout));
        let expanded = layout.is_some_and(|region| !document.has_class(region, &classes.hidden));
        if pinned && expanded {
            document.add_class(dock, &classes.dock_layout_expanded);
        } else {
            document.remove_class(dock, &classes.dock_layout_expanded);
        }
    }
}

impl Module for DockOverlayModule {
    fn name(&self) -> &str {
        "dock"
    }

    fn init(&mut self) -> Result<()> {
        if self.observer.is_some() {
            debug!("dock module already initialized");
            return Ok(());
        }
        let document = self.document.clone();
        let config = Rc::clone(&self.config);
        let debouncer = Debouncer::new(Duration::ZERO, move |_records| {
            update_docks(&document, &config);
            async {}
        });
        let observer = Rc::new(DomObserverBinding::new(&self.document, debouncer));

        let document = self.document.clone();
        let config = Rc::clone(&self.config);
        let binding = Rc::clone(&observer);
        self.attach = Some(
            spawn_local(async move {
                let wait = config.wait_options();
                let selectors = &config.selectors;
                if await_selector(&document, &selectors.dock_left, wait).await.is_none()
                    || await_selector(&document, &selectors.layout_dock_left, wait).await.is_none()
                {
                    debug!("left dock never appeared; dock overlay idle");
                    return;
                }
                update_docks(&document, &config);
                let Some(scope) = document.body().or_else(|| document.document_element()) else {
                    return;
                };
                // Our own class writes land in this scope too; the repeat pass writes nothing.
                binding.observe(scope, ObserveOptions::subtree(["class"]));
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
        let class = &self.config.class_names.dock_layout_expanded;
        let swept = sweep_class(&self.document, &format!(".{class}"), class);
        debug!("dock overlay removed from {swept} elements");
        Ok(())
    }
}
