use smol_str::SmolStr;

use super::control_flow::directive_expression;
use super::frame::{ElementFrame, Frame, FrameKind, Tag};
use crate::attrs::{self, serialize_statics};
use crate::emitter::Emitter;
use crate::error::CompileError;
use crate::hoist::HoistPool;
use crate::interpolation::{self, quote};
use crate::keys::{self, EachScope, ExplicitKey, IdSource, is_identifier};
use crate::options::Options;
use crate::package::{Program, Signature};
use crate::range::Range;
use crate::tokenizer::event::{Attributes, TagEvent};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Metadata {
    name: Option<SmolStr>,
    args: Option<String>,
}

/// State of one compile.
///
/// Events are consumed in document order. Every open tag pushes exactly one [`Frame`] recording
/// the closers it owes, and an end tag pays them back by unwinding to its frame.
pub(crate) struct Session<'a> {
    options: &'a Options,
    pub(super) ids: &'a mut dyn IdSource,
    pub(super) emitter: Emitter,
    pub(super) hoist: HoistPool,
    pub(super) frames: Vec<Frame>,
    /// Loops opened so far; numbers the `__target` and `$key` variables.
    pub(super) loops: usize,
    metadata: Option<Metadata>,
    diagnostics: Vec<CompileError>,
    source_len: usize,
}

impl<'a> Session<'a> {
    pub(crate) fn new(options: &'a Options, ids: &'a mut dyn IdSource, source_len: usize) -> Self {
        Self {
            options,
            ids,
            emitter: Emitter::new(options.indent_width),
            hoist: HoistPool::new(),
            frames: Vec::new(),
            loops: 0,
            metadata: None,
            diagnostics: Vec::new(),
            source_len,
        }
    }

    pub(crate) fn feed(&mut self, event: TagEvent) {
        log::trace!("{} (depth {})", event, self.frames.len());

        match event {
            TagEvent::Open {
                name,
                attributes,
                range,
            } => self.open(name, attributes, range),
            TagEvent::Text { text, range } => self.text(&text, range),
            TagEvent::Close { name, range } => self.close(&name, range),
        }
    }

    /// Closes whatever is still open and resolves the signature.
    pub(crate) fn finish(mut self) -> (Program, Vec<CompileError>) {
        let end = Range::new(self.source_len, self.source_len);

        while let Some(frame) = self.frames.pop() {
            if frame.kind != FrameKind::Branch {
                self.report(CompileError::UnbalancedElement {
                    name: frame.name.clone(),
                    reason: "never closed",
                    range: Range::new(frame.range.start, end.end),
                });
            }

            self.close_frame(frame);
        }

        let metadata = self.metadata.take().unwrap_or_default();
        let name = metadata
            .name
            .unwrap_or_else(|| SmolStr::new(self.options.default_name()));
        let args = metadata
            .args
            .unwrap_or_else(|| self.options.default_args().to_string());

        let program = Program {
            signature: Signature::new(name, &args),
            body: self.emitter.into_lines(),
            prologue: self.hoist.build(),
        };

        (program, self.diagnostics)
    }

    pub(super) fn report(&mut self, error: CompileError) {
        log::debug!("{}", error);
        self.diagnostics.push(error);
    }

    pub(super) fn push(&mut self, frame: Frame) {
        log::trace!("push {:?} for <{}>", frame.kind, frame.name);
        self.frames.push(frame);
    }

    fn open(&mut self, name: SmolStr, attributes: Attributes, range: Range) {
        match Tag::classify(&name, &attributes) {
            Tag::IfDirective => {
                let condition =
                    self.resolve_condition(&name, directive_expression(&attributes), range);
                self.open_conditional(name, condition, range);
            }
            tag @ (Tag::ElseIfDirective | Tag::ElseDirective) => {
                let condition =
                    self.resolve_condition(&name, directive_expression(&attributes), range);
                self.open_branch(tag, name, condition, range);
            }
            Tag::EachDirective => {
                let expression = attributes.get("expression").unwrap_or_default();
                self.open_each(name, expression, range);
            }
            Tag::SkipDirective => {
                let condition =
                    self.resolve_condition(&name, directive_expression(&attributes), range);
                self.open_skip(condition);
                self.push(Frame::new(name, FrameKind::Skip, range));
            }
            Tag::ScriptCapture => {
                let hoisted = attributes.contains("hoisted");
                self.push(Frame::new(name, FrameKind::Literal { hoisted }, range));
            }
            Tag::TemplateMetadata if self.frames.is_empty() && self.metadata.is_none() => {
                self.metadata = Some(self.resolve_metadata(&attributes, range));
                self.push(Frame::new(name, FrameKind::Template, range));
            }
            Tag::TemplateMetadata => {
                self.report(CompileError::UnresolvedMetadata {
                    reason: "only a single outermost `<template>` can name the function"
                        .to_string(),
                    range,
                });
                self.open_element(name, attributes, range);
            }
            Tag::PlainElement => self.open_element(name, attributes, range),
        }
    }

    fn resolve_metadata(&mut self, attributes: &Attributes, range: Range) -> Metadata {
        let name = match attributes.get("name").map(str::trim) {
            Some(name) if is_identifier(name) => Some(SmolStr::new(name)),
            Some(name) => {
                self.report(CompileError::UnresolvedMetadata {
                    reason: format!("`{}` is not a valid function name", name),
                    range,
                });
                None
            }
            None => None,
        };
        let args = attributes
            .get("args")
            .filter(|args| !args.trim().is_empty())
            .map(str::to_string);

        Metadata { name, args }
    }

    fn open_element(&mut self, name: SmolStr, mut attributes: Attributes, range: Range) {
        let explicit = ExplicitKey::from_attribute(attributes.remove("key"));
        let no_statics = explicit == ExplicitKey::Empty || self.options.no_statics;
        let classified = attrs::classify(&attributes, no_statics);

        for directive in &classified.directives.unsupported {
            self.report(CompileError::UnmatchedDirective {
                directive: directive.clone(),
                reason: "chaining is only available with `<elseif>` and `<else>` tags",
                range,
            });
        }

        for (attribute, issue) in &classified.issues {
            self.report(CompileError::UnsupportedInterpolation {
                context: format!("attribute `{}`", attribute),
                reason: issue.message(),
                range,
            });
        }

        let guarded = match &classified.directives.if_ {
            Some(value) => {
                let condition = self.resolve_condition("if", Some(value), range);
                self.emitter.open_block(&format!("if ({}) {{", condition));
                true
            }
            None => false,
        };
        let loop_key = classified
            .directives
            .each
            .as_deref()
            .and_then(|expression| self.open_loop(expression, range));

        let mut key = keys::element_key(&explicit, loop_key.as_deref(), self.each_scope());
        let statics = if classified.statics.is_empty() {
            None
        } else {
            let identifier = self.hoist.add_statics(&serialize_statics(&classified.statics));

            // Statics only apply when an element is created, so it needs a key to be reused.
            if key.is_none() {
                key = Some(quote(&self.ids.next_id()));
            }

            Some(identifier)
        };

        self.emitter.element_open(
            &name,
            key.as_deref(),
            statics.as_deref(),
            &classified.properties,
        );
        self.emitter.indent();

        let skip = match &classified.directives.skip {
            Some(value) => {
                let condition = self.resolve_condition("skip", Some(value), range);
                self.open_skip(condition);
                true
            }
            None => false,
        };

        self.push(Frame::new(
            name,
            FrameKind::Element(ElementFrame {
                guarded,
                loop_key,
                skip,
            }),
            range,
        ));
    }

    /// Ordinal keys of the each-body the next element is a direct child of.
    fn each_scope(&mut self) -> Option<&mut EachScope> {
        let frame = self
            .frames
            .iter_mut()
            .rev()
            .find(|frame| !frame.is_transparent())?;

        match &mut frame.kind {
            FrameKind::Each(Some(scope)) => Some(scope),
            _ => None,
        }
    }

    fn text(&mut self, text: &str, range: Range) {
        if text.trim().is_empty() {
            return;
        }

        if let Some(FrameKind::Literal { hoisted }) = self.frames.last().map(|frame| &frame.kind) {
            if *hoisted {
                self.hoist.add_literal(text.trim());
            } else {
                self.emitter.write(text.trim());
            }
            return;
        }

        let interpolated = interpolation::interpolate(text);

        for issue in &interpolated.issues {
            let offset = (range.start + issue.offset()).min(range.end);
            self.report(CompileError::UnsupportedInterpolation {
                context: "text".to_string(),
                reason: issue.message(),
                range: Range::new(offset, offset + 1),
            });
        }

        self.emitter.text(&interpolated.expr);
    }

    /// Closes the innermost frame named `name`. Frames above it were left open and are closed
    /// first; open branches need no end tag.
    fn close(&mut self, name: &str, range: Range) {
        let Some(position) = self.frames.iter().rposition(|frame| frame.name == name) else {
            self.report(CompileError::UnbalancedElement {
                name: name.into(),
                reason: "closed without being opened",
                range,
            });
            return;
        };

        while self.frames.len() > position + 1 {
            let Some(frame) = self.frames.pop() else {
                break;
            };

            if frame.kind != FrameKind::Branch {
                self.report(CompileError::UnbalancedElement {
                    name: frame.name.clone(),
                    reason: "closed implicitly by an enclosing end tag",
                    range: frame.range,
                });
            }

            self.close_frame(frame);
        }

        if let Some(frame) = self.frames.pop() {
            self.close_frame(frame);
        }
    }

    fn close_frame(&mut self, frame: Frame) {
        log::trace!("pop {:?} for <{}>", frame.kind, frame.name);

        match frame.kind {
            FrameKind::Template | FrameKind::Literal { .. } | FrameKind::Branch => {}
            FrameKind::Conditional { .. } | FrameKind::Skip => self.emitter.close_block("}"),
            FrameKind::Each(scope) => {
                if scope.is_some() {
                    self.close_loop();
                }
            }
            FrameKind::Element(element) => {
                if element.skip {
                    self.emitter.close_block("}");
                }

                self.emitter.dedent();
                self.emitter.element_close(&frame.name);

                if element.loop_key.is_some() {
                    self.close_loop();
                }

                if element.guarded {
                    self.emitter.close_block("}");
                }
            }
        }
    }
}
