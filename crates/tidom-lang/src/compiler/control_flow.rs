//! Guarded blocks for `if`, `elseif`, `else`, `each` and `skip`, in tag and attribute form.

use smol_str::{SmolStr, format_smolstr};

use super::frame::{Frame, FrameKind, Tag};
use super::session::Session;
use crate::attrs::is_brace_wrapped;
use crate::error::CompileError;
use crate::interpolation::InterpolationIssue;
use crate::keys::{self, EachClause, EachScope};
use crate::range::Range;
use crate::tokenizer::event::Attributes;

/// Condition of an `if`, `elseif` or `skip`; an empty one is always true.
///
/// `{}` is an error, since braces promise an expression.
pub(crate) fn condition(value: Option<&str>) -> Result<&str, InterpolationIssue> {
    match value.map(str::trim) {
        None | Some("") => Ok("true"),
        Some(value) if is_brace_wrapped(value) => match value[1..value.len() - 1].trim() {
            "" => Err(InterpolationIssue::EmptyExpression { offset: 0 }),
            inner => Ok(inner),
        },
        Some(value) => Ok(value),
    }
}

/// Directive tags take their expression from `condition` or `expression`.
pub(crate) fn directive_expression(attributes: &Attributes) -> Option<&str> {
    attributes
        .get("condition")
        .or_else(|| attributes.get("expression"))
}

impl Session<'_> {
    /// Resolves the condition of `directive`, reporting an unusable one and falling back to
    /// `true`.
    pub(crate) fn resolve_condition<'v>(
        &mut self,
        directive: &str,
        value: Option<&'v str>,
        range: Range,
    ) -> &'v str {
        condition(value).unwrap_or_else(|issue| {
            self.report(CompileError::UnsupportedInterpolation {
                context: format!("`{}` condition", directive),
                reason: issue.message(),
                range,
            });
            "true"
        })
    }

    pub(crate) fn open_conditional(&mut self, name: SmolStr, condition: &str, range: Range) {
        self.emitter.open_block(&format!("if ({}) {{", condition));
        self.push(Frame::new(
            name,
            FrameKind::Conditional { else_seen: false },
            range,
        ));
    }

    /// `<elseif>` and `<else>` continue the nearest conditional. Without one to continue they are
    /// reported and compiled as a conditional of their own.
    pub(crate) fn open_branch(&mut self, tag: Tag, name: SmolStr, condition: &str, range: Range) {
        let header = match tag {
            Tag::ElseDirective => "} else {".to_string(),
            _ => format!("}} else if ({}) {{", condition),
        };

        let reason = match self.innermost_conditional() {
            Some(FrameKind::Conditional { else_seen }) if !*else_seen => {
                *else_seen = tag == Tag::ElseDirective;
                None
            }
            Some(_) => Some("the enclosing `<if>` already has an `<else>`"),
            None => Some("not inside an `<if>`"),
        };

        match reason {
            None => {
                self.emitter.dedent();
                self.emitter.open_block(&header);
                self.push(Frame::new(name, FrameKind::Branch, range));
            }
            Some(reason) => {
                self.report(CompileError::UnmatchedDirective {
                    directive: name.clone(),
                    reason,
                    range,
                });
                self.open_conditional(name, condition, range);
            }
        }
    }

    /// Conditional that an `<elseif>` or `<else>` opened here would continue, looking through
    /// branches that were left open.
    fn innermost_conditional(&mut self) -> Option<&mut FrameKind> {
        self.frames
            .iter_mut()
            .rev()
            .find(|frame| frame.kind != FrameKind::Branch)
            .map(|frame| &mut frame.kind)
            .filter(|kind| matches!(kind, FrameKind::Conditional { .. }))
    }

    /// Opens a null guard and an iteration over `target`, returning the per-item key variable.
    ///
    /// Arrays are walked directly, anything else through its own keys:
    ///
    /// ```text
    /// var __target1 = items
    /// if (__target1 != null) {
    ///   ;(__target1.forEach ? __target1 : Object.keys(__target1)).forEach(function ($value, $item) {
    ///     if (!__target1.forEach) { $item = $value; $value = __target1[$item] }
    ///     var item = $value
    ///     var $key1 = $item + "_k1"
    /// ```
    pub(crate) fn open_loop(&mut self, expression: &str, range: Range) -> Option<SmolStr> {
        let Some(clause) = EachClause::parse(expression) else {
            self.report(CompileError::InvalidIteration {
                expression: expression.to_string(),
                range,
            });
            return None;
        };

        self.loops += 1;
        let target = format_smolstr!("__target{}", self.loops);
        let key_var = format_smolstr!("$key{}", self.loops);
        let outer = self.enclosing_loop_key();
        let disambiguator = self.ids.next_id();

        self.emitter
            .write(&format!("var {} = {}", target, clause.target));
        self.emitter
            .open_block(&format!("if ({} != null) {{", target));
        self.emitter.open_block(&format!(
            ";({0}.forEach ? {0} : Object.keys({0})).forEach(function ($value, $item) {{",
            target
        ));
        self.emitter.write(&format!(
            "if (!{0}.forEach) {{ $item = $value; $value = {0}[$item] }}",
            target
        ));
        self.emitter
            .write(&format!("var {} = $value", clause.binding));

        if let Some(item) = clause.item_binding() {
            self.emitter.write(&format!("var {} = $item", item));
        }

        self.emitter.write(&format!(
            "var {} = {}",
            key_var,
            keys::loop_key(outer.as_deref(), clause.item_key, &disambiguator)
        ));

        log::trace!("loop {} over `{}`", key_var, clause.target);
        Some(key_var)
    }

    pub(crate) fn close_loop(&mut self) {
        self.emitter.close_block("}, this)");
        self.emitter.close_block("}");
    }

    pub(crate) fn open_each(&mut self, name: SmolStr, expression: &str, range: Range) {
        let scope = self.open_loop(expression, range).map(EachScope::new);
        self.push(Frame::new(name, FrameKind::Each(scope), range));
    }

    /// `if (<condition>) { skip() } else {`, leaving the else branch open for the children.
    pub(crate) fn open_skip(&mut self, condition: &str) {
        self.emitter.open_block(&format!("if ({}) {{", condition));
        self.emitter.write("skip()");
        self.emitter.dedent();
        self.emitter.open_block("} else {");
    }

    fn enclosing_loop_key(&self) -> Option<SmolStr> {
        self.frames.iter().rev().find_map(|frame| frame.loop_key().cloned())
    }
}
