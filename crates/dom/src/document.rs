//! The shared, host-owned document.
//!
//! [`Document`] is a cheap clonable handle used from a single thread. Every
//! method borrows the state only for its own duration, so no borrow is ever
//! held across an await point. Writes that do not change the stored value are
//! no-ops and queue no mutation records.

use crate::events::{Event, EventKind, EventSubscription, ListenerId, ListenerSlot};
use crate::mutation::{
    MutationKind, MutationObserver, MutationReceiver, MutationRecord, ObserverId, ObserverSlot,
};
use crate::node::{self, DomNode, NodeKind};
use crate::selection::SelectionRange;
use anyhow::{Result, anyhow, bail};
use core::cell::RefCell;
use css_selectors::{ElementAdapter, SelectorList, matches_selector_list, parse_selector_list};
use indextree::{Arena, Node as ArenaNode, NodeId};
use log::{error, trace};
use std::collections::BTreeMap;
use std::rc::Rc;
use tokio::sync::mpsc;

#[derive(Debug)]
pub struct DocumentState {
    pub(crate) arena: Arena<DomNode>,
    pub(crate) root: NodeId,
    pub(crate) observers: BTreeMap<ObserverId, ObserverSlot>,
    pub(crate) listeners: BTreeMap<ListenerId, ListenerSlot>,
    next_observer_id: u64,
    next_listener_id: u64,
    selection: Option<SelectionRange>,
    fullscreen: Option<NodeId>,
    user_agent: String,
}

impl DocumentState {
    /// A state holding only the document node.
    pub(crate) fn empty() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(DomNode::default());
        Self {
            arena,
            root,
            observers: BTreeMap::new(),
            listeners: BTreeMap::new(),
            next_observer_id: 1,
            next_listener_id: 1,
            selection: None,
            fullscreen: None,
            user_agent: String::new(),
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&DomNode> {
        if id.is_removed(&self.arena) {
            return None;
        }
        self.arena.get(id).map(ArenaNode::get)
    }

    fn element(&self, id: NodeId) -> Option<&DomNode> {
        self.node(id).filter(|node| node.is_element())
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut DomNode> {
        if id.is_removed(&self.arena) {
            return None;
        }
        self.arena
            .get_mut(id)
            .map(ArenaNode::get_mut)
            .filter(|node| node.is_element())
    }

    /// Append a fresh node under `parent` without queueing records (parser use).
    pub(crate) fn append_silently(&mut self, parent: NodeId, data: DomNode) -> Result<NodeId> {
        match self.node(parent) {
            None => bail!("parent {parent:?} is not in the document"),
            Some(DomNode {
                kind: NodeKind::Text { .. },
                ..
            }) => bail!("text node {parent:?} cannot have children"),
            Some(_) => {}
        }
        let child = self.arena.new_node(data);
        parent
            .checked_append(child, &mut self.arena)
            .map_err(|err| anyhow!("cannot append under {parent:?}: {err}"))?;
        Ok(child)
    }

    fn append(&mut self, parent: NodeId, data: DomNode) -> Result<NodeId> {
        let child = self.append_silently(parent, data)?;
        self.queue_mutation(MutationRecord {
            target: parent,
            kind: MutationKind::ChildList {
                added: vec![child],
                removed: Vec::new(),
            },
        });
        Ok(child)
    }

    fn remove(&mut self, node: NodeId) -> bool {
        if self.node(node).is_none() {
            return false;
        }
        let Some(parent) = node.parent(&self.arena) else {
            // The document node itself.
            return false;
        };
        node.remove_subtree(&mut self.arena);
        let arena = &self.arena;
        for slot in self.observers.values_mut() {
            slot.registrations
                .retain(|(target, _)| !target.is_removed(arena));
        }
        if self
            .selection
            .is_some_and(|range| range.touches_removed(arena))
        {
            self.selection = None;
        }
        if self.fullscreen.is_some_and(|element| element.is_removed(arena)) {
            self.fullscreen = None;
        }
        self.queue_mutation(MutationRecord {
            target: parent,
            kind: MutationKind::ChildList {
                added: Vec::new(),
                removed: vec![node],
            },
        });
        true
    }

    /// Write (`Some`) or remove (`None`) an attribute, recording real changes only.
    fn write_attr(&mut self, node: NodeId, name: &str, value: Option<String>) -> bool {
        let Some(element) = self.element_mut(node) else {
            return false;
        };
        let old_value = match value {
            Some(value) => {
                if element.attr(name) == Some(value.as_str()) {
                    return false;
                }
                element.set_attr(name, value)
            }
            None => match element.remove_attr(name) {
                Some(old) => Some(old),
                None => return false,
            },
        };
        self.queue_mutation(MutationRecord {
            target: node,
            kind: MutationKind::Attributes {
                name: name.to_owned(),
                old_value,
            },
        });
        true
    }

    fn write_style(&mut self, node: NodeId, name: &str, value: Option<&str>) -> bool {
        let Some(element) = self.element(node) else {
            return false;
        };
        let mut declarations = node::parse_declarations(element.attr("style").unwrap_or_default());
        let position = declarations.iter().position(|(key, _)| key == name);
        match (value, position) {
            (Some(value), Some(index)) => {
                if declarations.get(index).is_some_and(|(_, current)| current == value) {
                    return false;
                }
                if let Some(slot) = declarations.get_mut(index) {
                    slot.1 = value.to_owned();
                }
            }
            (Some(value), None) => declarations.push((name.to_owned(), value.to_owned())),
            (None, Some(index)) => {
                declarations.remove(index);
            }
            (None, None) => return false,
        }
        if declarations.is_empty() {
            self.write_attr(node, "style", None)
        } else {
            self.write_attr(node, "style", Some(node::serialize_declarations(&declarations)))
        }
    }

    /// Hand a record to every observer with a matching registration.
    pub(crate) fn queue_mutation(&mut self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }
        let chain: Vec<NodeId> = record.target.ancestors(&self.arena).collect();
        self.observers.retain(|id, slot| {
            if !slot.wants(&record, &chain) {
                return !slot.sender.is_closed();
            }
            let delivered = slot.sender.send(record.clone()).is_ok();
            if !delivered {
                trace!("dropping observer {id:?}: receiver is gone");
            }
            delivered
        });
    }

    fn dispatch(&mut self, event: &Event) -> usize {
        let mut delivered = 0_usize;
        self.listeners.retain(|_, slot| {
            if slot.kind != event.kind {
                return !slot.sender.is_closed();
            }
            let sent = slot.sender.send(event.clone()).is_ok();
            if sent {
                delivered = delivered.saturating_add(1);
            }
            sent
        });
        delivered
    }

    fn select_all(&self, scope: NodeId, list: &SelectorList, first_only: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        if list.is_empty() || self.node(scope).is_none() {
            return out;
        }
        for candidate in scope.descendants(&self.arena).skip(1) {
            if matches_selector_list(self, candidate, list) {
                out.push(candidate);
                if first_only {
                    break;
                }
            }
        }
        out
    }

    fn document_element(&self) -> Option<NodeId> {
        self.root
            .children(&self.arena)
            .find(|child| self.element(*child).is_some())
    }
}

impl ElementAdapter for DocumentState {
    type Handle = NodeId;

    fn parent(&self, element: NodeId) -> Option<NodeId> {
        element
            .parent(&self.arena)
            .filter(|parent| self.element(*parent).is_some())
    }

    fn previous_sibling_element(&self, element: NodeId) -> Option<NodeId> {
        element
            .preceding_siblings(&self.arena)
            .skip(1)
            .find(|sibling| self.element(*sibling).is_some())
    }

    fn tag_name(&self, element: NodeId) -> Option<&str> {
        self.element(element).and_then(DomNode::tag)
    }

    fn has_class(&self, element: NodeId, class: &str) -> bool {
        self.element(element).is_some_and(|node| node.has_class(class))
    }

    fn attr(&self, element: NodeId, name: &str) -> Option<&str> {
        self.element(element).and_then(|node| node.attr(name))
    }
}

/// Handle to the document shared by the host and every presentation module.
#[derive(Clone, Debug)]
pub struct Document {
    state: Rc<RefCell<DocumentState>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty `html` / `head` / `body` document.
    pub fn new() -> Self {
        let mut state = DocumentState::empty();
        let root = state.root;
        let skeleton = state
            .append_silently(root, DomNode::element("html"))
            .and_then(|html| {
                state.append_silently(html, DomNode::element("head"))?;
                state.append_silently(html, DomNode::element("body"))
            });
        if let Err(err) = skeleton {
            error!("failed to build document skeleton: {err}");
        }
        Self::from_state(state)
    }

    pub(crate) fn from_state(state: DocumentState) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// The document node, parent of the root element.
    pub fn root(&self) -> NodeId {
        self.state.borrow().root
    }

    /// The root element (`<html>`).
    pub fn document_element(&self) -> Option<NodeId> {
        self.state.borrow().document_element()
    }

    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        let state = self.state.borrow();
        html.children(&state.arena)
            .find(|child| state.tag_name(*child) == Some("body"))
    }

    /// Append a new element under `parent`.
    ///
    /// # Errors
    /// Fails if `parent` was removed or is a text node.
    pub fn append_element(&self, parent: NodeId, tag: &str) -> Result<NodeId> {
        self.state.borrow_mut().append(parent, DomNode::element(tag))
    }

    /// Append a new text node under `parent`.
    ///
    /// # Errors
    /// Fails if `parent` was removed or is a text node.
    pub fn append_text(&self, parent: NodeId, text: &str) -> Result<NodeId> {
        self.state.borrow_mut().append(parent, DomNode::text(text))
    }

    /// Remove `node` and its subtree. Observers registered on removed nodes are dropped.
    pub fn remove_node(&self, node: NodeId) -> bool {
        self.state.borrow_mut().remove(node)
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.state.borrow().node(node).is_some()
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.state.borrow().element(node).is_some()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.state.borrow().tag_name(node).map(str::to_owned)
    }

    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        let state = self.state.borrow();
        if state.node(node).is_none() {
            return None;
        }
        state.parent(node)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        let state = self.state.borrow();
        if state.node(node).is_none() {
            return Vec::new();
        }
        node.children(&state.arena).collect()
    }

    /// Concatenated text of every text node under `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        let state = self.state.borrow();
        if state.node(node).is_none() {
            return String::new();
        }
        node.descendants(&state.arena)
            .filter_map(|descendant| match state.node(descendant).map(|data| &data.kind) {
                Some(NodeKind::Text { text }) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.state.borrow().attr(node, name).map(str::to_owned)
    }

    /// Returns true if the stored value changed.
    pub fn set_attr(&self, node: NodeId, name: &str, value: &str) -> bool {
        self.state
            .borrow_mut()
            .write_attr(node, &name.to_ascii_lowercase(), Some(value.to_owned()))
    }

    pub fn remove_attr(&self, node: NodeId, name: &str) -> bool {
        self.state
            .borrow_mut()
            .write_attr(node, &name.to_ascii_lowercase(), None)
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.state.borrow().has_class(node, class)
    }

    pub fn class_list(&self, node: NodeId) -> Vec<String> {
        self.attr(node, "class")
            .map(|value| value.split_ascii_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    /// Returns true if the class was added.
    pub fn add_class(&self, node: NodeId, class: &str) -> bool {
        let mut state = self.state.borrow_mut();
        if state.element(node).is_none() {
            return false;
        }
        let updated = node::class_list_with(state.attr(node, "class"), class);
        match updated {
            Some(value) => state.write_attr(node, "class", Some(value)),
            None => false,
        }
    }

    /// Returns true if the class was removed.
    pub fn remove_class(&self, node: NodeId, class: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let updated = node::class_list_without(state.attr(node, "class"), class);
        match updated {
            Some(value) => state.write_attr(node, "class", Some(value)),
            None => false,
        }
    }

    /// Flip `class`, returning whether it is present afterwards.
    pub fn toggle_class(&self, node: NodeId, class: &str) -> bool {
        if self.remove_class(node, class) {
            false
        } else {
            self.add_class(node, class)
        }
    }

    /// Inline style declaration, e.g. `padding-left` or `--protyle-spacing`.
    pub fn style_property(&self, node: NodeId, name: &str) -> Option<String> {
        let state = self.state.borrow();
        let style = state.attr(node, "style")?;
        node::parse_declarations(style)
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn set_style_property(&self, node: NodeId, name: &str, value: &str) -> bool {
        self.state.borrow_mut().write_style(node, name, Some(value))
    }

    /// Removing the last declaration removes the `style` attribute.
    pub fn remove_style_property(&self, node: NodeId, name: &str) -> bool {
        self.state.borrow_mut().write_style(node, name, None)
    }

    /// `data-<key>` attribute.
    pub fn dataset(&self, node: NodeId, key: &str) -> Option<String> {
        self.attr(node, &format!("data-{key}"))
    }

    pub fn set_dataset(&self, node: NodeId, key: &str, value: &str) -> bool {
        self.set_attr(node, &format!("data-{key}"), value)
    }

    pub fn remove_dataset(&self, node: NodeId, key: &str) -> bool {
        self.remove_attr(node, &format!("data-{key}"))
    }

    /// First element in document order matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.query_selector_in(self.root(), selector)
    }

    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        self.query_selector_all_in(self.root(), selector)
    }

    /// First descendant of `scope` (excluding `scope`) matching `selector`.
    pub fn query_selector_in(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        let list = parse_selector_list(selector);
        self.state
            .borrow()
            .select_all(scope, &list, true)
            .into_iter()
            .next()
    }

    pub fn query_selector_all_in(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let list = parse_selector_list(selector);
        self.state.borrow().select_all(scope, &list, false)
    }

    pub fn matches(&self, node: NodeId, selector: &str) -> bool {
        let list = parse_selector_list(selector);
        let state = self.state.borrow();
        state.element(node).is_some() && matches_selector_list(&*state, node, &list)
    }

    /// Nearest inclusive ancestor element matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &str) -> Option<NodeId> {
        let list = parse_selector_list(selector);
        let state = self.state.borrow();
        if state.node(node).is_none() {
            return None;
        }
        node.ancestors(&state.arena).find(|candidate| {
            state.element(*candidate).is_some() && matches_selector_list(&*state, *candidate, &list)
        })
    }

    /// Register a new observer with no targets yet.
    pub fn create_observer(&self) -> (MutationObserver, MutationReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.state.borrow_mut();
        let id = ObserverId(state.next_observer_id);
        state.next_observer_id = state.next_observer_id.saturating_add(1);
        state.observers.insert(
            id,
            ObserverSlot {
                sender,
                registrations: Vec::new(),
            },
        );
        (
            MutationObserver::new(id, Rc::downgrade(&self.state)),
            MutationReceiver::new(receiver),
        )
    }

    pub fn observer_count(&self) -> usize {
        self.state.borrow().observers.len()
    }

    /// Register a listener; it stays registered until the subscription is dropped.
    pub fn listen(&self, kind: EventKind) -> EventSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_listener_id);
        state.next_listener_id = state.next_listener_id.saturating_add(1);
        state.listeners.insert(
            id,
            ListenerSlot {
                kind: kind.clone(),
                sender,
            },
        );
        EventSubscription::new(id, kind, receiver, Rc::downgrade(&self.state))
    }

    /// Queue `event` for every listener of its kind, returning how many there were.
    pub fn dispatch(&self, event: &Event) -> usize {
        self.state.borrow_mut().dispatch(event)
    }

    pub fn listener_count(&self, kind: &EventKind) -> usize {
        self.state
            .borrow()
            .listeners
            .values()
            .filter(|slot| slot.kind == *kind && !slot.sender.is_closed())
            .count()
    }

    pub fn selection(&self) -> Option<SelectionRange> {
        self.state.borrow().selection
    }

    /// Replace the selection and dispatch a selection-change event.
    pub fn set_selection(&self, range: Option<SelectionRange>) {
        let mut state = self.state.borrow_mut();
        let range = range.filter(|candidate| !candidate.touches_removed(&state.arena));
        state.selection = range;
        state.dispatch(&Event::new(EventKind::SelectionChange));
    }

    /// Collapse the selection onto `node`.
    pub fn select_node(&self, node: NodeId) {
        self.set_selection(Some(SelectionRange::collapsed(node)));
    }

    /// The deepest node containing the whole selection.
    pub fn selection_common_ancestor(&self) -> Option<NodeId> {
        let state = self.state.borrow();
        state
            .selection
            .and_then(|range| range.common_ancestor(&state.arena))
    }

    pub fn fullscreen_element(&self) -> Option<NodeId> {
        self.state.borrow().fullscreen
    }

    pub fn set_fullscreen_element(&self, element: Option<NodeId>) {
        let mut state = self.state.borrow_mut();
        let element = element.filter(|candidate| state.element(*candidate).is_some());
        state.fullscreen = element;
    }

    pub fn user_agent(&self) -> String {
        self.state.borrow().user_agent.clone()
    }

    pub fn set_user_agent(&self, user_agent: &str) {
        user_agent.clone_into(&mut self.state.borrow_mut().user_agent);
    }

    pub(crate) fn with_state<R>(&self, read: impl FnOnce(&DocumentState) -> R) -> R {
        read(&self.state.borrow())
    }
}
