use smol_str::{SmolStr, format_smolstr};

use crate::interpolation::quote;

/// Source of the opaque identifiers used to keep generated keys apart.
///
/// A fresh source is created for every compile, so sequential sources yield the same ids for the
/// same template.
pub trait IdSource {
    fn next_id(&mut self) -> SmolStr;
}

#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    prefix: SmolStr,
    counter: usize,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<SmolStr>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> SmolStr {
        self.counter += 1;
        format_smolstr!("{}{}", self.prefix, self.counter)
    }
}

impl<F: FnMut() -> SmolStr> IdSource for F {
    fn next_id(&mut self) -> SmolStr {
        self()
    }
}

/// The `key` attribute as written on an element.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub enum ExplicitKey {
    #[default]
    Absent,
    /// `key=""` switches the element to no-statics mode.
    Empty,
    Literal(String),
}

impl ExplicitKey {
    pub fn from_attribute(value: Option<String>) -> Self {
        match value {
            None => ExplicitKey::Absent,
            Some(value) if value.is_empty() => ExplicitKey::Empty,
            Some(value) => ExplicitKey::Literal(value),
        }
    }
}

/// `binding[, itemKey] in target`
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct EachClause<'a> {
    pub binding: &'a str,
    pub item_key: Option<&'a str>,
    pub target: &'a str,
}

impl<'a> EachClause<'a> {
    pub fn parse(expr: &'a str) -> Option<Self> {
        let (head, target) = expr.split_once(" in ")?;
        let (binding, item_key) = match head.split_once(',') {
            Some((binding, item_key)) => (binding.trim(), Some(item_key.trim())),
            None => (head.trim(), None),
        };
        let target = target.trim();

        if binding.is_empty() || target.is_empty() {
            return None;
        }

        Some(Self {
            binding,
            item_key: item_key.filter(|key| !key.is_empty()),
            target,
        })
    }

    /// An item key that is a bare name gets declared as the loop's item identifier.
    pub fn item_binding(&self) -> Option<&'a str> {
        self.item_key
            .filter(|key| is_identifier(key) && *key != self.binding)
    }
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();

    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Per-item key of a loop: enclosing loop key, item identity, then the loop's disambiguator.
pub fn loop_key(outer: Option<&str>, item_key: Option<&str>, disambiguator: &str) -> String {
    let item = match item_key {
        Some(expr) => format!("({})", expr),
        None => "$item".to_string(),
    };
    let suffix = quote(&format!("_{}", disambiguator));

    match outer {
        Some(outer) => format!("{} + \"_\" + {} + {}", outer, item, suffix),
        None => format!("{} + {}", item, suffix),
    }
}

/// Ordinal keys handed to unkeyed children of one each-body.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct EachScope {
    pub key_var: SmolStr,
    ordinal: usize,
}

impl EachScope {
    pub fn new(key_var: impl Into<SmolStr>) -> Self {
        Self {
            key_var: key_var.into(),
            ordinal: 0,
        }
    }

    pub fn next_child_key(&mut self) -> String {
        self.ordinal += 1;
        format!("{} + \"_{}\"", self.key_var, self.ordinal)
    }
}

/// Picks the key expression of a plain element, in priority order: explicit key, the element's
/// own loop key, then an ordinal key when it sits directly in an each-body.
pub fn element_key(
    explicit: &ExplicitKey,
    own_loop_key: Option<&str>,
    each_scope: Option<&mut EachScope>,
) -> Option<String> {
    match (explicit, own_loop_key) {
        (ExplicitKey::Literal(key), _) => Some(quote(key)),
        (_, Some(loop_key)) => Some(loop_key.to_string()),
        _ => each_scope.map(|scope| scope.next_child_key()),
    }
}
