use indextree::{Arena, NodeId};

/// A selection between two nodes. A collapsed caret has `anchor == focus`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SelectionRange {
    pub anchor: NodeId,
    pub focus: NodeId,
}

impl SelectionRange {
    pub const fn collapsed(node: NodeId) -> Self {
        Self {
            anchor: node,
            focus: node,
        }
    }

    /// The deepest node containing both ends, or `None` if either end is gone.
    pub(crate) fn common_ancestor<T>(&self, arena: &Arena<T>) -> Option<NodeId> {
        if self.anchor.is_removed(arena) || self.focus.is_removed(arena) {
            return None;
        }
        let anchor_chain: Vec<NodeId> = self.anchor.ancestors(arena).collect();
        self.focus
            .ancestors(arena)
            .find(|candidate| anchor_chain.contains(candidate))
    }

    pub(crate) fn touches_removed<T>(&self, arena: &Arena<T>) -> bool {
        self.anchor.is_removed(arena) || self.focus.is_removed(arena)
    }
}
