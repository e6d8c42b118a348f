//! Mutation observation over the document tree.
//!
//! Records are queued synchronously while the document is mutated and are
//! drained by the observing task the next time it runs, so everything that
//! changed within one task arrives as a single batch.

use crate::document::DocumentState;
use core::cell::RefCell;
use indextree::NodeId;
use log::trace;
use std::rc::Weak;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(pub(crate) u64);

/// What a registration on one target wants to hear about.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub subtree: bool,
    pub attributes: bool,
    /// Restricts attribute records to these names. Empty means all attributes.
    pub attribute_filter: Vec<String>,
}

impl ObserveOptions {
    /// Attribute changes on the target only, limited to `names`.
    pub fn attributes<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributes: true,
            attribute_filter: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Child list and (filtered) attribute changes anywhere under the target.
    pub fn subtree<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            child_list: true,
            subtree: true,
            ..Self::attributes(names)
        }
    }

    pub(crate) fn accepts(&self, kind: &MutationKind) -> bool {
        match kind {
            MutationKind::ChildList { .. } => self.child_list,
            MutationKind::Attributes { name, .. } => {
                self.attributes
                    && (self.attribute_filter.is_empty()
                        || self.attribute_filter.iter().any(|allowed| allowed == name))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationKind {
    ChildList {
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Attributes {
        name: String,
        old_value: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
}

impl MutationRecord {
    pub fn attribute_name(&self) -> Option<&str> {
        match &self.kind {
            MutationKind::Attributes { name, .. } => Some(name),
            MutationKind::ChildList { .. } => None,
        }
    }
}

/// Document-side state of one observer.
#[derive(Debug)]
pub(crate) struct ObserverSlot {
    pub(crate) sender: UnboundedSender<MutationRecord>,
    pub(crate) registrations: Vec<(NodeId, ObserveOptions)>,
}

impl ObserverSlot {
    /// `chain` is the record target followed by its ancestors.
    pub(crate) fn wants(&self, record: &MutationRecord, chain: &[NodeId]) -> bool {
        self.registrations.iter().any(|(target, options)| {
            let in_scope = *target == record.target || (options.subtree && chain.contains(target));
            in_scope && options.accepts(&record.kind)
        })
    }
}

/// Registration handle for an observer. Dropping it disconnects.
#[derive(Debug)]
pub struct MutationObserver {
    id: ObserverId,
    state: Weak<RefCell<DocumentState>>,
}

impl MutationObserver {
    pub(crate) const fn new(id: ObserverId, state: Weak<RefCell<DocumentState>>) -> Self {
        Self { id, state }
    }

    pub const fn id(&self) -> ObserverId {
        self.id
    }

    /// Start (or re-configure) observation of `target`.
    /// Returns false when the target is gone or the observer was disconnected.
    pub fn observe(&self, target: NodeId, options: ObserveOptions) -> bool {
        let Some(state) = self.state.upgrade() else {
            return false;
        };
        let mut guard = state.borrow_mut();
        if target.is_removed(&guard.arena) {
            return false;
        }
        let Some(slot) = guard.observers.get_mut(&self.id) else {
            return false;
        };
        if let Some(existing) = slot
            .registrations
            .iter_mut()
            .find(|(registered, _)| *registered == target)
        {
            existing.1 = options;
        } else {
            slot.registrations.push((target, options));
        }
        true
    }

    /// Remove every registration. Safe to call repeatedly.
    pub fn disconnect(&self) {
        if let Some(state) = self.state.upgrade()
            && let Ok(mut guard) = state.try_borrow_mut()
            && guard.observers.remove(&self.id).is_some()
        {
            trace!("mutation observer {:?} disconnected", self.id);
        }
    }

    /// True while the document still holds this observer.
    pub fn is_connected(&self) -> bool {
        self.state
            .upgrade()
            .is_some_and(|state| state.borrow().observers.contains_key(&self.id))
    }

    /// Number of live target registrations.
    pub fn target_count(&self) -> usize {
        self.state.upgrade().map_or(0, |state| {
            state
                .borrow()
                .observers
                .get(&self.id)
                .map_or(0, |slot| slot.registrations.len())
        })
    }
}

impl Drop for MutationObserver {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Receiving side of an observer; yields one batch per wake-up.
#[derive(Debug)]
pub struct MutationReceiver {
    receiver: UnboundedReceiver<MutationRecord>,
}

impl MutationReceiver {
    pub(crate) const fn new(receiver: UnboundedReceiver<MutationRecord>) -> Self {
        Self { receiver }
    }

    /// Wait for the next record, then drain everything already queued behind it.
    /// Returns `None` once the observer is disconnected and drained.
    pub async fn next_batch(&mut self) -> Option<Vec<MutationRecord>> {
        let first = self.receiver.recv().await?;
        let mut batch = vec![first];
        while let Ok(record) = self.receiver.try_recv() {
            batch.push(record);
        }
        Some(batch)
    }

    /// Drain without waiting.
    pub fn take_pending(&mut self) -> Vec<MutationRecord> {
        let mut batch = Vec::new();
        while let Ok(record) = self.receiver.try_recv() {
            batch.push(record);
        }
        batch
    }
}
