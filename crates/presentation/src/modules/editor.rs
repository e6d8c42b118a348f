//! Editor visuals: the `without-icon` background class and the selected-block mark.

use super::{abort_task, sweep_class};
use crate::config::ProjectConfig;
use crate::module::Module;
use anyhow::Result;
use dom::{Document, EventKind, EventSubscription, NodeId, ObserveOptions};
use dom_sync::{Debouncer, DomObserverBinding, Signal, await_all_selector, race_first};
use log::{debug, trace};
use std::rc::Rc;
use tokio::task::{AbortHandle, spawn_local};

pub struct EditorVisualModule {
    document: Document,
    config: Rc<ProjectConfig>,
    background: Option<Rc<DomObserverBinding>>,
    attach: Option<AbortHandle>,
    selection: Option<AbortHandle>,
}

impl EditorVisualModule {
    pub fn new(document: &Document, config: Rc<ProjectConfig>) -> Self {
        Self {
            document: document.clone(),
            config,
            background: None,
            attach: None,
            selection: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.background.is_some()
    }

    fn start_background(&mut self) {
        let document = self.document.clone();
        let config = Rc::clone(&self.config);
        let debouncer = Debouncer::new(self.config.debounce(), move |_records| {
            format_backgrounds(&document, &config);
            async {}
        });
        let binding = Rc::new(DomObserverBinding::new(&self.document, debouncer));

        let document = self.document.clone();
        let config = Rc::clone(&self.config);
        let observer = Rc::clone(&binding);
        self.attach = Some(
            spawn_local(async move {
                let Some(editors) =
                    await_all_selector(&document, &config.selectors.protyle, config.wait_options())
                        .await
                else {
                    debug!("no editors appeared; background handling idle");
                    return;
                };
                // Only the editors present now are watched; ones opened later keep host styling.
                debug!("watching {} editors for background changes", editors.len());
                for editor in editors {
                    observer.observe(editor, ObserveOptions::subtree(["class"]));
                }
                format_backgrounds(&document, &config);
            })
            .abort_handle(),
        );
        self.background = Some(binding);
    }

    fn start_selection(&mut self) {
        let changes = self.document.listen(EventKind::SelectionChange);
        let document = self.document.clone();
        let config = Rc::clone(&self.config);
        self.selection =
            Some(spawn_local(track_selection(document, config, changes)).abort_handle());
    }
}

/// Background element state: an image and an icon, each hidden by the hidden class.
fn format_backgrounds(document: &Document, config: &ProjectConfig) {
    let hidden = &config.class_names.hidden;
    let class = &config.class_names.without_icon;
    let visible = |background: NodeId, selector: &str| {
        document
            .query_selector_in(background, selector)
            .is_some_and(|element| !document.has_class(element, hidden))
    };

    let verdicts: Vec<(NodeId, bool)> = document
        .query_selector_all(&config.selectors.background)
        .into_iter()
        .map(|background| {
            let has_image = visible(background, config.selectors.background_image.as_str());
            let has_icon = visible(background, config.selectors.background_icon.as_str());
            (background, has_image && !has_icon)
        })
        .collect();

    for (background, without_icon) in verdicts {
        if without_icon {
            document.add_class(background, class);
        } else {
            document.remove_class(background, class);
        }
    }
}

/// Each selection change starts a race between input release and a timeout.
/// A change arriving mid-race drops it and starts over.
async fn track_selection(
    document: Document,
    config: Rc<ProjectConfig>,
    mut changes: EventSubscription,
) {
    while changes.next().await.is_some() {
        loop {
            let settled = race_first(vec![
                Signal::event(&document, EventKind::MouseUp),
                Signal::event(&document, EventKind::KeyUp),
                Signal::timeout(config.selection_change_delay()),
            ]);
            tokio::select! {
                biased;
                change = changes.next() => {
                    if change.is_none() {
                        return;
                    }
                    trace!("selection changed mid-race; restarting");
                }
                _ = settled => {
                    mark_selected_block(&document, &config);
                    break;
                }
            }
        }
    }
}

fn mark_selected_block(document: &Document, config: &ProjectConfig) {
    let Some(common) = document.selection_common_ancestor() else {
        return;
    };
    let start = if document.is_element(common) {
        Some(common)
    } else {
        document.parent_element(common)
    };
    let Some(block) = start.and_then(|node| document.closest(node, &config.selectors.block)) else {
        return;
    };

    let class = &config.class_names.selected_block;
    sweep_class(document, &format!(".{class}"), class);

    let markable = document.attr(block, "data-type").is_some_and(|block_type| {
        !config
            .editor
            .excluded_block_types
            .iter()
            .any(|excluded| *excluded == block_type)
    });
    if markable {
        document.add_class(block, class);
    }
}

impl Module for EditorVisualModule {
    fn name(&self) -> &str {
        "editor"
    }

    fn init(&mut self) -> Result<()> {
        if self.is_active() {
            debug!("editor module already initialized");
            return Ok(());
        }
        self.start_background();
        self.start_selection();
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        abort_task(&mut self.attach);
        abort_task(&mut self.selection);
        if let Some(binding) = self.background.take() {
            binding.disconnect();
        }
        let classes = &self.config.class_names;
        sweep_class(
            &self.document,
            &format!(
                "{} .protyle-background.{}",
                self.config.selectors.protyle, classes.without_icon
            ),
            &classes.without_icon,
        );
        sweep_class(
            &self.document,
            &format!(".{}", classes.selected_block),
            &classes.selected_block,
        );
        Ok(())
    }
}
