use crate::document::{Document, DocumentState};
use crate::node::{DomNode, NodeKind};
use indextree::NodeId;
use serde_json::{Map, Value, json};

fn flush_text(children: &mut Vec<Value>, text_buf: &mut String) {
    if !text_buf.trim().is_empty() {
        children.push(json!({ "type": "text", "text": text_buf.clone() }));
    }
    text_buf.clear();
}

fn coalesce_children(state: &DocumentState, id: NodeId) -> Vec<Value> {
    let mut children: Vec<Value> = Vec::new();
    let mut text_buf = String::new();
    for child in id.children(&state.arena) {
        let Some(node) = state.node(child) else {
            continue;
        };
        if let NodeKind::Text { text } = &node.kind {
            text_buf.push_str(text);
            continue;
        }
        flush_text(&mut children, &mut text_buf);
        let value = node_to_json(state, child);
        if !value.is_null() {
            children.push(value);
        }
    }
    flush_text(&mut children, &mut text_buf);
    children
}

fn node_to_json(state: &DocumentState, id: NodeId) -> Value {
    let Some(DomNode { kind, attrs }) = state.node(id) else {
        return Value::Null;
    };
    match kind {
        NodeKind::Document => json!({ "type": "document", "children": coalesce_children(state, id) }),
        NodeKind::Element { tag } => {
            // Sorted by key for determinism
            let mut pairs: Vec<&(String, String)> = attrs.iter().collect();
            pairs.sort_by(|left, right| left.0.cmp(&right.0));
            let mut attrs_obj = Map::new();
            for (key, value) in pairs {
                attrs_obj.insert(key.clone(), Value::String(value.clone()));
            }
            json!({
                "type": "element",
                "tag": tag,
                "attrs": Value::Object(attrs_obj),
                "children": coalesce_children(state, id),
            })
        }
        NodeKind::Text { text } => {
            if text.trim().is_empty() {
                Value::Null
            } else {
                json!({ "type": "text", "text": text })
            }
        }
    }
}

impl Document {
    /// Build a deterministic JSON representation of the document.
    /// Schema:
    /// - Document: { "type":"document", "children":[ ... ] }
    /// - Element: { "type":"element", "tag": "div", "attrs": {..}, "children":[ ... ] }
    /// - Text: { "type":"text", "text":"..." }
    pub fn to_json_value(&self) -> Value {
        self.with_state(|state| node_to_json(state, state.root))
    }

    /// Snapshot of a single subtree.
    pub fn node_to_json_value(&self, node: NodeId) -> Value {
        self.with_state(|state| node_to_json(state, node))
    }

    /// Pretty JSON string for snapshots and test comparisons.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json_value()).unwrap_or_else(|_| String::from("{}"))
    }
}
