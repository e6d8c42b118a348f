//! CSS selector parsing.
//! Selectors Level 3: <https://www.w3.org/TR/selectors-3/>

use crate::{Combinator, ComplexSelector, CompoundSelector, SelectorList, SimpleSelector};
use core::mem::take;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Internal tokenizer token kinds.
enum Tok {
    /// An explicit combinator token (child, adjacent or general sibling).
    Combinator(Combinator),
    /// Whitespace that implies a descendant combinator.
    DescendantWS,
    /// A simple selector token.
    Simple(SimpleSelector),
    /// A byte the supported subset cannot express (pseudo classes, namespaces, ...).
    Invalid,
}

/// Tokenizer over a selector string.
struct SelectorTokenizer<'input> {
    input_bytes: &'input [u8],
    index: usize,
}

impl<'input> SelectorTokenizer<'input> {
    fn new(input: &'input str) -> Self {
        Self {
            input_bytes: input.as_bytes(),
            index: 0,
        }
    }

    fn next_token(&mut self) -> Option<Tok> {
        // Trailing whitespace implies nothing.
        if self.skip_whitespace() && self.index < self.input_bytes.len() {
            return Some(Tok::DescendantWS);
        }
        let current = self.peek()?;
        let token = match current {
            b'*' => {
                self.index = self.index.saturating_add(1);
                Tok::Simple(SimpleSelector::Universal)
            }
            b'.' => self.consume_prefixed(SimpleSelector::Class),
            b'#' => self.consume_prefixed(SimpleSelector::IdSelector),
            b'[' => self.consume_attr(),
            b'>' => self.consume_combinator(Combinator::Child),
            b'+' => self.consume_combinator(Combinator::AdjacentSibling),
            b'~' => self.consume_combinator(Combinator::GeneralSibling),
            _ => self.consume_type(),
        };
        Some(token)
    }

    /// Skip whitespace, returning whether any was seen.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.index;
        self.skip_spaces();
        self.index > start
    }

    /// Explicit combinators swallow the whitespace around them.
    fn consume_combinator(&mut self, combinator: Combinator) -> Tok {
        self.index = self.index.saturating_add(1);
        self.skip_spaces();
        Tok::Combinator(combinator)
    }

    /// Consume an identifier of ASCII alphanumerics, '-' and '_', case preserved.
    fn consume_ident(&mut self) -> String {
        let start = self.index;
        while let Some(&byte) = self.input_bytes.get(self.index) {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                self.index = self.index.saturating_add(1);
            } else {
                break;
            }
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        String::from_utf8_lossy(slice).into_owned()
    }

    /// Type selectors match case-insensitively, so they are lowercased here.
    fn consume_type(&mut self) -> Tok {
        let ident = self.consume_ident();
        if ident.is_empty() {
            return Tok::Invalid;
        }
        Tok::Simple(SimpleSelector::Type(ident.to_ascii_lowercase()))
    }

    /// Class and id selectors: skip the prefix byte, keep the identifier verbatim.
    fn consume_prefixed(&mut self, build: fn(String) -> SimpleSelector) -> Tok {
        self.index = self.index.saturating_add(1);
        let ident = self.consume_ident();
        if ident.is_empty() {
            return Tok::Invalid;
        }
        Tok::Simple(build(ident))
    }

    /// Parse `[name]` or `[name=value]` with a quoted or unquoted value.
    fn consume_attr(&mut self) -> Tok {
        self.index = self.index.saturating_add(1);
        self.skip_spaces();
        let name = self.consume_ident().to_ascii_lowercase();
        if name.is_empty() {
            return Tok::Invalid;
        }
        self.skip_spaces();
        let value = if self.peek() == Some(b'=') {
            self.index = self.index.saturating_add(1);
            self.skip_spaces();
            match self.peek() {
                Some(quote @ (b'"' | b'\'')) => {
                    self.index = self.index.saturating_add(1);
                    Some(self.consume_quoted_attr_value(quote))
                }
                _ => Some(self.consume_unquoted_attr_value()),
            }
        } else {
            None
        };
        self.skip_spaces();
        if self.peek() != Some(b']') {
            return Tok::Invalid;
        }
        self.index = self.index.saturating_add(1);
        Tok::Simple(match value {
            Some(value) => SimpleSelector::AttrEquals { name, value },
            None => SimpleSelector::AttrExists { name },
        })
    }

    fn consume_unquoted_attr_value(&mut self) -> String {
        let start = self.index;
        while let Some(&byte) = self.input_bytes.get(self.index) {
            if byte.is_ascii_whitespace() || byte == b']' {
                break;
            }
            self.index = self.index.saturating_add(1);
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        String::from_utf8_lossy(slice).into_owned()
    }

    fn consume_quoted_attr_value(&mut self, quote: u8) -> String {
        let start = self.index;
        while matches!(self.input_bytes.get(self.index), Some(&byte) if byte != quote) {
            self.index = self.index.saturating_add(1);
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        let out = String::from_utf8_lossy(slice).into_owned();
        if self.peek().is_some() {
            self.index = self.index.saturating_add(1);
        }
        out
    }

    fn peek(&self) -> Option<u8> {
        self.input_bytes.get(self.index).copied()
    }

    fn skip_spaces(&mut self) {
        while matches!(self.peek(), Some(byte) if byte.is_ascii_whitespace()) {
            self.index = self.index.saturating_add(1);
        }
    }
}

/// Accumulates compounds left to right, remembering which combinator joined each one.
#[derive(Default)]
struct ComplexBuilder {
    first: Option<CompoundSelector>,
    rest: Vec<(Combinator, CompoundSelector)>,
    current: CompoundSelector,
    joined_by: Option<Combinator>,
}

impl ComplexBuilder {
    fn close_current(&mut self) {
        if self.current.simples.is_empty() {
            return;
        }
        let compound = take(&mut self.current);
        if self.first.is_none() {
            self.first = Some(compound);
        } else {
            self.rest
                .push((self.joined_by.unwrap_or(Combinator::Descendant), compound));
        }
    }

    fn finish(mut self) -> ComplexSelector {
        self.close_current();
        ComplexSelector {
            first: self.first.unwrap_or_default(),
            rest: self.rest,
        }
    }
}

/// Parse a selector list from CSS text. Unparseable members are dropped.
pub fn parse_selector_list(input: &str) -> SelectorList {
    let selectors = input
        .split(',')
        .filter_map(|part| parse_complex_selector(part.trim()))
        .filter(|sel| !sel.is_empty())
        .collect();
    SelectorList { selectors }
}

/// Parse one complex selector, or `None` when it uses syntax outside the supported subset.
pub fn parse_complex_selector(input: &str) -> Option<ComplexSelector> {
    let mut tokens = SelectorTokenizer::new(input);
    let mut builder = ComplexBuilder::default();
    let mut pending_combinator: Option<Combinator> = None;

    while let Some(token) = tokens.next_token() {
        match token {
            Tok::Invalid => return None,
            // An explicit combinator always wins over the whitespace before it.
            Tok::Combinator(comb) => pending_combinator = Some(comb),
            Tok::DescendantWS => {
                if pending_combinator.is_none() {
                    pending_combinator = Some(Combinator::Descendant);
                }
            }
            Tok::Simple(simple) => {
                if let Some(comb) = pending_combinator.take() {
                    builder.close_current();
                    builder.joined_by = Some(comb);
                }
                builder.current.simples.push(simple);
            }
        }
    }
    Some(builder.finish())
}
