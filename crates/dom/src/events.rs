//! Document-level event listeners.
//!
//! A listener is an [`EventSubscription`]: events are queued into its channel
//! on dispatch and it unregisters itself when dropped, so cancelling whatever
//! future owns a subscription also removes the listener.

use crate::document::DocumentState;
use core::cell::RefCell;
use serde_json::Value;
use std::rc::Weak;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    SelectionChange,
    MouseDown,
    MouseUp,
    KeyDown,
    KeyUp,
    /// A named event dispatched by presentation code.
    Custom(String),
}

impl EventKind {
    pub fn custom(name: &str) -> Self {
        Self::Custom(name.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub detail: Value,
}

impl Event {
    pub const fn new(kind: EventKind) -> Self {
        Self {
            kind,
            detail: Value::Null,
        }
    }

    pub fn custom(name: &str, detail: Value) -> Self {
        Self {
            kind: EventKind::custom(name),
            detail,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct ListenerId(pub(crate) u64);

#[derive(Debug)]
pub(crate) struct ListenerSlot {
    pub(crate) kind: EventKind,
    pub(crate) sender: UnboundedSender<Event>,
}

/// A registered listener for one event kind.
#[derive(Debug)]
pub struct EventSubscription {
    id: ListenerId,
    kind: EventKind,
    receiver: UnboundedReceiver<Event>,
    state: Weak<RefCell<DocumentState>>,
}

impl EventSubscription {
    pub(crate) const fn new(
        id: ListenerId,
        kind: EventKind,
        receiver: UnboundedReceiver<Event>,
        state: Weak<RefCell<DocumentState>>,
    ) -> Self {
        Self {
            id,
            kind,
            receiver,
            state,
        }
    }

    pub const fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Wait for the next event. `None` means the document is gone.
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    pub fn try_next(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        // If the document is busy the closed channel is pruned on the next dispatch.
        if let Some(state) = self.state.upgrade()
            && let Ok(mut guard) = state.try_borrow_mut()
        {
            guard.listeners.remove(&self.id);
        }
    }
}
