use smol_str::SmolStr;

use crate::keys::EachScope;
use crate::range::Range;
use crate::tokenizer::event::Attributes;

/// How the driver handles an opening tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// A rendered element; may carry `if`, `each` and `skip` attributes.
    PlainElement,
    IfDirective,
    ElseIfDirective,
    ElseDirective,
    EachDirective,
    SkipDirective,
    /// `<script>` without `type`: its text is passed through uncompiled.
    ScriptCapture,
    /// `<template name="..." args="...">` naming the compiled function.
    TemplateMetadata,
}

impl Tag {
    pub fn classify(name: &str, attributes: &Attributes) -> Self {
        match name {
            "if" => Tag::IfDirective,
            "elseif" => Tag::ElseIfDirective,
            "else" => Tag::ElseDirective,
            "each" => Tag::EachDirective,
            "skip" => Tag::SkipDirective,
            "script" if !attributes.contains("type") => Tag::ScriptCapture,
            "template" if attributes.contains("name") || attributes.contains("args") => {
                Tag::TemplateMetadata
            }
            _ => Tag::PlainElement,
        }
    }
}

/// What an open tag still owes the output when it closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    /// Root `<template>` whose attributes became the signature. Owes nothing.
    Template,
    Literal {
        hoisted: bool,
    },
    /// `<if>`, or a chained directive that had to start its own conditional. Owes `}`.
    Conditional {
        else_seen: bool,
    },
    /// `<elseif>` / `<else>` inside a conditional. Owes nothing.
    Branch,
    /// Owes the `}` of the skip guard.
    Skip,
    /// Owes the loop and guard closers, unless the iteration could not be parsed.
    Each(Option<EachScope>),
    Element(ElementFrame),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementFrame {
    /// Wrapped in an `if` attribute guard.
    pub guarded: bool,
    /// Key variable of the element's own `each` attribute loop.
    pub loop_key: Option<SmolStr>,
    /// Children are wrapped in a skip guard.
    pub skip: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub name: SmolStr,
    pub kind: FrameKind,
    /// Range of the opening tag.
    pub range: Range,
}

impl Frame {
    pub fn new(name: impl Into<SmolStr>, kind: FrameKind, range: Range) -> Self {
        Self {
            name: name.into(),
            kind,
            range,
        }
    }

    /// Key variable that nested loops extend.
    pub fn loop_key(&self) -> Option<&SmolStr> {
        match &self.kind {
            FrameKind::Each(Some(scope)) => Some(&scope.key_var),
            FrameKind::Element(ElementFrame {
                loop_key: Some(key),
                ..
            }) => Some(key),
            _ => None,
        }
    }

    /// Pseudo-elements that render no element of their own, so their children count as
    /// children of the enclosing element.
    pub fn is_transparent(&self) -> bool {
        matches!(
            self.kind,
            FrameKind::Conditional { .. } | FrameKind::Branch | FrameKind::Skip
        )
    }
}
