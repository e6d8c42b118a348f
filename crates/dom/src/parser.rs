//! Build a [`Document`] from HTML source.
//!
//! html5ever does the parsing into an `RcDom`, which is then walked once and
//! copied into the arena. Comments, doctypes and whitespace-only text are
//! dropped. No mutation records are produced while loading.

use crate::document::{Document, DocumentState};
use crate::node::DomNode;
use anyhow::Result;
use html5ever::tendril::TendrilSink as _;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{ParseOpts, parse_document};
use indextree::NodeId;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

fn walk_tree(handle: &Handle, parent: NodeId, state: &mut DocumentState) -> Result<()> {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let mut element = DomNode::element(&name.local);
            for attribute in attrs.borrow().iter() {
                element.set_attr(&attribute.name.local, attribute.value.to_string());
            }
            let node = state.append_silently(parent, element)?;
            for child in handle.children.borrow().iter() {
                walk_tree(child, node, state)?;
            }
        }
        NodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            if !text.trim().is_empty() {
                state.append_silently(parent, DomNode::text(&text))?;
            }
        }
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                walk_tree(child, parent, state)?;
            }
        }
        _ => {
            // Ignore comments, doctypes, etc.
        }
    }
    Ok(())
}

impl Document {
    /// Parse a full HTML document.
    ///
    /// # Errors
    /// Returns error if the source cannot be read by the parser.
    pub fn parse_html(html: &str) -> Result<Self> {
        let opts = ParseOpts {
            tree_builder: TreeBuilderOpts {
                exact_errors: false,
                scripting_enabled: false,
                ..TreeBuilderOpts::default()
            },
            ..ParseOpts::default()
        };

        let dom = parse_document(RcDom::default(), opts)
            .from_utf8()
            .read_from(&mut html.as_bytes())?;

        let mut state = DocumentState::empty();
        let root = state.root;
        walk_tree(&dom.document, root, &mut state)?;
        Ok(Self::from_state(state))
    }
}
