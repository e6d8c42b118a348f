//! Selector parsing and matching for host DOM queries.
//! Selectors Level 3: <https://www.w3.org/TR/selectors-3/>
//!
//! Only the subset the presentation modules query with is supported:
//! - Type, class, id, universal, `[attr]` and `[attr=value]` selectors
//! - Combinators: descendant, child, adjacent sibling, general sibling
//! - Comma separated selector lists

mod matcher;
mod parser;

pub use matcher::{matches_complex, matches_compound, matches_selector_list};
pub use parser::{parse_complex_selector, parse_selector_list};

/// An adapter that abstracts DOM access for selector matching.
/// Implement this for your DOM layer.
pub trait ElementAdapter {
    type Handle: Copy + Eq;

    /// Parent element if any. Document nodes are not elements.
    fn parent(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Previous sibling element, skipping text nodes.
    fn previous_sibling_element(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Tag name in ASCII lowercase.
    fn tag_name(&self, element: Self::Handle) -> Option<&str>;

    /// True if the element's class list contains `class`.
    fn has_class(&self, element: Self::Handle, class: &str) -> bool;

    /// Returns the attribute value if present.
    fn attr(&self, element: Self::Handle, name: &str) -> Option<&str>;
}

/// Simple selectors (subset).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    Type(String),
    Class(String),
    IdSelector(String),
    AttrExists { name: String },
    AttrEquals { name: String, value: String },
    Universal,
}

/// A compound selector is a sequence of simple selectors (no combinators).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub simples: Vec<SimpleSelector>,
}

/// Combinators between compounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

/// A complex selector: `first`, then each `(combinator, compound)` pair to its right.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ComplexSelector {
    pub first: CompoundSelector,
    pub rest: Vec<(Combinator, CompoundSelector)>,
}

impl ComplexSelector {
    /// True when the selector has no simple selectors at all.
    pub fn is_empty(&self) -> bool {
        self.first.simples.is_empty() && self.rest.is_empty()
    }
}

/// A selector list separated by commas.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// True when nothing could be parsed. An empty list matches no element.
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}
