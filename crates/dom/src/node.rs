use core::mem;
use smallvec::SmallVec;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeKind {
    #[default]
    Document,
    Element { tag: String },
    Text { text: String },
}

/// One arena slot. Attributes keep insertion order so snapshots stay stable.
#[derive(Debug, Clone, Default)]
pub struct DomNode {
    pub kind: NodeKind,
    pub attrs: SmallVec<(String, String), 4>,
}

impl DomNode {
    pub fn element(tag: &str) -> Self {
        Self {
            kind: NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
            },
            attrs: SmallVec::new(),
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            kind: NodeKind::Text {
                text: text.to_owned(),
            },
            attrs: SmallVec::new(),
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag } => Some(tag),
            NodeKind::Document | NodeKind::Text { .. } => None,
        }
    }

    pub const fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Insert or overwrite, returning the previous value.
    pub fn set_attr(&mut self, name: &str, value: String) -> Option<String> {
        if let Some(slot) = self.attrs.iter_mut().find(|(key, _)| key == name) {
            return Some(mem::replace(&mut slot.1, value));
        }
        self.attrs.push((name.to_owned(), value));
        None
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(index).1)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|value| value.split_ascii_whitespace().any(|token| token == class))
    }
}

/// Class attribute value with `class` appended, or `None` if already present.
pub fn class_list_with(current: Option<&str>, class: &str) -> Option<String> {
    let current = current.unwrap_or_default();
    if current.split_ascii_whitespace().any(|token| token == class) {
        return None;
    }
    let mut tokens: Vec<&str> = current.split_ascii_whitespace().collect();
    tokens.push(class);
    Some(tokens.join(" "))
}

/// Class attribute value with every `class` token dropped, or `None` if absent.
pub fn class_list_without(current: Option<&str>, class: &str) -> Option<String> {
    let current = current?;
    if !current.split_ascii_whitespace().any(|token| token == class) {
        return None;
    }
    let tokens: Vec<&str> = current
        .split_ascii_whitespace()
        .filter(|token| *token != class)
        .collect();
    Some(tokens.join(" "))
}

/// Parse an inline `style` attribute into ordered `(property, value)` declarations.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            // Custom properties are case-sensitive, everything else is not.
            let name = if name.starts_with("--") {
                name.to_owned()
            } else {
                name.to_ascii_lowercase()
            };
            Some((name, value.trim().to_owned()))
        })
        .collect()
}

pub fn serialize_declarations(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}
