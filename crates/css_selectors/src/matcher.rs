//! Selector matching engine.
//! Selectors Level 3: <https://www.w3.org/TR/selectors-3/>

use crate::{
    Combinator, ComplexSelector, CompoundSelector, ElementAdapter, SelectorList, SimpleSelector,
};

/// Match a selector list against an element.
pub fn matches_selector_list<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    list: &SelectorList,
) -> bool {
    list.selectors
        .iter()
        .any(|selector_item| matches_complex(adapter, element, selector_item))
}

/// Match a complex selector against an element, right to left.
///
/// Descendant and general sibling combinators backtrack: if the nearest
/// candidate fails further left, the next candidate is tried.
pub fn matches_complex<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    sel: &ComplexSelector,
) -> bool {
    let last = sel.rest.len();
    compound_at(sel, last).is_some_and(|compound| matches_compound(adapter, element, compound))
        && match_leftward(adapter, element, sel, last)
}

/// Match a compound selector against a single element.
pub fn matches_compound<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    compound: &CompoundSelector,
) -> bool {
    let Some(tag) = adapter.tag_name(element) else {
        return false;
    };
    compound.simples.iter().all(|simple| match simple {
        SimpleSelector::Universal => true,
        SimpleSelector::Type(type_name) => tag == type_name.as_str(),
        SimpleSelector::Class(class_name) => adapter.has_class(element, class_name),
        SimpleSelector::IdSelector(id_value) => adapter
            .attr(element, "id")
            .is_some_and(|value| value == id_value.as_str()),
        SimpleSelector::AttrExists { name } => adapter.attr(element, name).is_some(),
        SimpleSelector::AttrEquals { name, value } => adapter
            .attr(element, name)
            .is_some_and(|attr_value| attr_value == value.as_str()),
    })
}

/// Compound number `index`, counting `sel.first` as zero.
fn compound_at(sel: &ComplexSelector, index: usize) -> Option<&CompoundSelector> {
    match index.checked_sub(1) {
        None => Some(&sel.first),
        Some(rest_index) => sel.rest.get(rest_index).map(|pair| &pair.1),
    }
}

/// `element` already matches compound `index`; relate the compounds to its left.
fn match_leftward<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    sel: &ComplexSelector,
    index: usize,
) -> bool {
    let Some(left_index) = index.checked_sub(1) else {
        return true;
    };
    let (Some(&(combinator, _)), Some(left)) = (sel.rest.get(left_index), compound_at(sel, left_index))
    else {
        return false;
    };
    let candidate_matches = |candidate: A::Handle| {
        matches_compound(adapter, candidate, left) && match_leftward(adapter, candidate, sel, left_index)
    };
    match combinator {
        Combinator::Descendant => {
            let mut current = adapter.parent(element);
            while let Some(ancestor) = current {
                if candidate_matches(ancestor) {
                    return true;
                }
                current = adapter.parent(ancestor);
            }
            false
        }
        Combinator::Child => adapter.parent(element).is_some_and(candidate_matches),
        Combinator::AdjacentSibling => adapter
            .previous_sibling_element(element)
            .is_some_and(candidate_matches),
        Combinator::GeneralSibling => {
            let mut current = adapter.previous_sibling_element(element);
            while let Some(sibling) = current {
                if candidate_matches(sibling) {
                    return true;
                }
                current = adapter.previous_sibling_element(sibling);
            }
            false
        }
    }
}
