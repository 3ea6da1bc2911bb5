use itertools::Itertools;
use smol_str::SmolStr;

use crate::interpolation::{self, InterpolationIssue, quote};
use crate::tokenizer::event::Attributes;

pub const DIRECTIVE_ATTRIBUTES: [&str; 5] = ["each", "if", "elseif", "else", "skip"];
const EVENT_PREFIX: &str = "on";

/// Control directives found on a plain element.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Directives {
    pub if_: Option<String>,
    pub each: Option<String>,
    pub skip: Option<String>,
    /// `elseif` / `else` attributes; chaining only exists in tag form.
    pub unsupported: Vec<SmolStr>,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Static {
    pub name: SmolStr,
    pub value: String,
}

/// An attribute rendered as a dynamic `elementOpen` argument pair.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Property {
    pub name: SmolStr,
    pub expr: String,
}

#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct ClassifiedAttributes {
    pub directives: Directives,
    /// Sorted by name.
    pub statics: Vec<Static>,
    /// In declaration order.
    pub properties: Vec<Property>,
    pub issues: Vec<(SmolStr, InterpolationIssue)>,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
enum Kind {
    Directive,
    EventHandler,
    StyleObject,
    Expression,
    Interpolated,
    Literal,
}

fn kind(name: &str, value: &str) -> Kind {
    if DIRECTIVE_ATTRIBUTES.contains(&name) {
        Kind::Directive
    } else if value.starts_with('{') && name.starts_with(EVENT_PREFIX) {
        Kind::EventHandler
    } else if value.starts_with('{') && name == "style" {
        Kind::StyleObject
    } else if is_brace_wrapped(value) {
        Kind::Expression
    } else if interpolation::contains_expression(value) {
        Kind::Interpolated
    } else {
        Kind::Literal
    }
}

/// `{expr}` where the first `}` is the last character.
pub fn is_brace_wrapped(value: &str) -> bool {
    value.len() >= 2
        && value.starts_with('{')
        && value.find('}') == Some(value.len() - 1)
}

pub fn event_handler(value: &str) -> String {
    let body = value.strip_prefix('{').unwrap_or(value);
    let body = body.strip_suffix('}').unwrap_or(body).trim();

    if body.is_empty() {
        "function ($event) {\n  var $element = this;\n}".to_string()
    } else {
        format!(
            "function ($event) {{\n  var $element = this;\n  {}\n}}",
            body
        )
    }
}

pub fn classify(attributes: &Attributes, no_statics: bool) -> ClassifiedAttributes {
    let mut classified = ClassifiedAttributes::default();

    for (name, value) in attributes.iter() {
        match kind(name, value) {
            Kind::Directive => {
                let directives = &mut classified.directives;
                match name {
                    "if" => directives.if_ = Some(value.to_string()),
                    "each" => directives.each = Some(value.to_string()),
                    "skip" => directives.skip = Some(value.to_string()),
                    _ => directives.unsupported.push(name.into()),
                }
            }
            Kind::EventHandler => classified.properties.push(Property {
                name: name.into(),
                expr: event_handler(value),
            }),
            Kind::StyleObject => classified.properties.push(Property {
                name: name.into(),
                expr: value.to_string(),
            }),
            Kind::Expression => {
                let expr = &value[1..value.len() - 1];
                let expr = if expr.trim().is_empty() {
                    classified.issues.push((
                        SmolStr::new(name),
                        InterpolationIssue::EmptyExpression { offset: 0 },
                    ));
                    quote("")
                } else {
                    expr.to_string()
                };

                classified.properties.push(Property {
                    name: name.into(),
                    expr,
                });
            }
            Kind::Interpolated => {
                let interpolated = interpolation::interpolate(value);
                classified.issues.extend(
                    interpolated
                        .issues
                        .into_iter()
                        .map(|issue| (SmolStr::new(name), issue)),
                );
                classified.properties.push(Property {
                    name: name.into(),
                    expr: interpolated.expr,
                });
            }
            Kind::Literal if no_statics => classified.properties.push(Property {
                name: name.into(),
                expr: quote(value),
            }),
            Kind::Literal => classified.statics.push(Static {
                name: name.into(),
                value: value.to_string(),
            }),
        }
    }

    // `sort_by` is stable, so equal names keep their declaration order.
    classified.statics.sort_by(|a, b| a.name.cmp(&b.name));
    classified
}

/// Canonical text of a static attribute set, which is also its hoisted declaration.
pub fn serialize_statics(statics: &[Static]) -> String {
    format!(
        "[{}]",
        statics
            .iter()
            .map(|s| format!("{}, {}", quote(&s.name), quote(&s.value)))
            .join(", ")
    )
}
