//! Rewrites text with `{expression}` holes into a single string concatenation expression.
//!
//! ```text
//! Hello {name}!   =>   "Hello " + (name) + "!"
//! ```
//!
//! Expressions are copied verbatim. Braces inside an expression are not supported; such input is
//! reported through [`InterpolationIssue`] and compiled on a best-effort basis.
use itertools::Itertools;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Segment<'a> {
    Literal(&'a str),
    Expr(&'a str),
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum InterpolationIssue {
    /// `{` without a closing `}`; the rest of the text is kept literal.
    UnclosedBrace { offset: usize },
    /// `{` inside an expression, e.g. `{ {a: 1} }`.
    NestedBrace { offset: usize },
    /// `}` outside any expression; kept literal.
    StrayClosingBrace { offset: usize },
    /// `{}` or `{  }`; renders as an empty string.
    EmptyExpression { offset: usize },
}

impl InterpolationIssue {
    pub fn offset(&self) -> usize {
        match self {
            InterpolationIssue::UnclosedBrace { offset }
            | InterpolationIssue::NestedBrace { offset }
            | InterpolationIssue::StrayClosingBrace { offset }
            | InterpolationIssue::EmptyExpression { offset } => *offset,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            InterpolationIssue::UnclosedBrace { .. } => "`{` is never closed",
            InterpolationIssue::NestedBrace { .. } => "nested braces are not supported",
            InterpolationIssue::StrayClosingBrace { .. } => "`}` has no matching `{`",
            InterpolationIssue::EmptyExpression { .. } => "`{}` holds no expression",
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Interpolated {
    pub expr: String,
    pub issues: Vec<InterpolationIssue>,
}

pub fn contains_expression(text: &str) -> bool {
    text.contains('{')
}

/// Splits text into literal and expression segments.
///
/// An expression runs from a `{` to the next `}`.
pub fn segments(text: &str) -> (Vec<Segment<'_>>, Vec<InterpolationIssue>) {
    let mut segments = Vec::new();
    let mut issues = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find(['{', '}']) {
        let at = cursor + found;

        if text.as_bytes()[at] == b'}' {
            issues.push(InterpolationIssue::StrayClosingBrace { offset: at });
            cursor = at + 1;
            continue;
        }

        let Some(close) = text[at + 1..].find('}').map(|i| at + 1 + i) else {
            issues.push(InterpolationIssue::UnclosedBrace { offset: at });
            break;
        };

        let expr = &text[at + 1..close];

        if let Some(nested) = expr.find('{') {
            issues.push(InterpolationIssue::NestedBrace {
                offset: at + 1 + nested,
            });
        }

        if at > literal_start {
            segments.push(Segment::Literal(&text[literal_start..at]));
        }

        if expr.trim().is_empty() {
            issues.push(InterpolationIssue::EmptyExpression { offset: at });
        } else {
            segments.push(Segment::Expr(expr));
        }
        cursor = close + 1;
        literal_start = cursor;
    }

    if literal_start < text.len() {
        segments.push(Segment::Literal(&text[literal_start..]));
    }

    (segments, issues)
}

/// Quotes a literal as a double-quoted string that may span lines through `\` continuations.
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');

    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str(" \\\n"),
            '\r' => {}
            c => quoted.push(c),
        }
    }

    quoted.push('"');
    quoted
}

pub fn interpolate(text: &str) -> Interpolated {
    let (segments, issues) = segments(text);

    if segments.is_empty() {
        return Interpolated {
            expr: quote(""),
            issues,
        };
    }

    let mut parts = segments.iter().map(|segment| match segment {
        Segment::Literal(literal) => quote(literal),
        Segment::Expr(expr) => format!("({})", expr.replace('\r', "")),
    });

    // A leading empty string forces string concatenation when the text starts with an
    // expression.
    let expr = if matches!(segments.first(), Some(Segment::Expr(_))) {
        std::iter::once(quote("")).chain(parts).join(" + ")
    } else {
        parts.join(" + ")
    };

    Interpolated { expr, issues }
}
