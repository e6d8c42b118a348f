//! In-memory host document for the presentation layer.
//!
//! Provides the tree, selector queries, attribute/class/inline-style edits,
//! mutation observers, document-level events and the current selection.
#![allow(
    clippy::redundant_pub_crate,
    reason = "crate-internal state is shared between private modules"
)]

mod document;
mod events;
mod mutation;
mod node;
mod parser;
mod printing;
mod selection;

pub use document::Document;
pub use events::{Event, EventKind, EventSubscription};
pub use indextree::NodeId;
pub use mutation::{
    MutationKind, MutationObserver, MutationReceiver, MutationRecord, ObserveOptions, ObserverId,
};
pub use node::{DomNode, NodeKind};
pub use selection::SelectionRange;
