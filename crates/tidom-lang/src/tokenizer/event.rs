use smol_str::SmolStr;
use std::fmt::{self, Display, Formatter};

use crate::range::Range;

/// Attributes of one tag in declaration order.
///
/// A name can only appear once; the first occurrence wins, matching how browsers treat
/// duplicated attributes.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Attributes(Vec<(SmolStr, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts an attribute, returning `false` when the name was already present.
    pub fn insert(&mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> bool {
        let name = name.into();

        if self.contains(&name) {
            return false;
        }

        self.0.push((name, value.into()));
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(n, _)| n == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.0.iter().position(|(n, _)| n == name)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<SmolStr>, V: Into<String>> FromIterator<(N, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut attributes = Attributes::new();

        for (name, value) in iter {
            attributes.insert(name, value);
        }

        attributes
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum TagEvent {
    Open {
        name: SmolStr,
        attributes: Attributes,
        range: Range,
    },
    Text {
        text: String,
        range: Range,
    },
    Close {
        name: SmolStr,
        range: Range,
    },
}

impl TagEvent {
    pub fn range(&self) -> Range {
        match self {
            TagEvent::Open { range, .. }
            | TagEvent::Text { range, .. }
            | TagEvent::Close { range, .. } => *range,
        }
    }
}

impl Display for TagEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TagEvent::Open {
                name, attributes, ..
            } => {
                write!(f, "<{}", name)?;
                for (name, value) in attributes.iter() {
                    write!(f, " {}=\"{}\"", name, value)?;
                }
                write!(f, ">")
            }
            TagEvent::Text { text, .. } => write!(f, "{}", text),
            TagEvent::Close { name, .. } => write!(f, "</{}>", name),
        }
    }
}
