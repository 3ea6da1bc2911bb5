use miette::{Diagnostic, LabeledSpan, Severity, SourceSpan};
use smol_str::SmolStr;

use crate::range::Range;
use crate::tokenizer::error::TokenizeError;

/// Structural problems found while compiling.
///
/// None of these stop compilation: the compiler records them and keeps the output
/// brace-balanced. Strict compiles turn the first one into an [`Error`].
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum CompileError {
    #[error("Unmatched directive `{directive}`: {reason}")]
    UnmatchedDirective {
        directive: SmolStr,
        reason: &'static str,
        range: Range,
    },
    #[error("Unsupported interpolation in {context}: {reason}")]
    UnsupportedInterpolation {
        context: String,
        reason: &'static str,
        range: Range,
    },
    #[error("Unresolved template metadata: {reason}")]
    UnresolvedMetadata { reason: String, range: Range },
    #[error("Invalid iteration `{expression}`: expected `item[, key] in target`")]
    InvalidIteration { expression: String, range: Range },
    #[error("Unbalanced element `<{name}>`: {reason}")]
    UnbalancedElement {
        name: SmolStr,
        reason: &'static str,
        range: Range,
    },
}

impl CompileError {
    pub fn range(&self) -> Range {
        match self {
            CompileError::UnmatchedDirective { range, .. }
            | CompileError::UnsupportedInterpolation { range, .. }
            | CompileError::UnresolvedMetadata { range, .. }
            | CompileError::InvalidIteration { range, .. }
            | CompileError::UnbalancedElement { range, .. } => *range,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InnerError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Represents a high-level error with diagnostic information for the user.
#[derive(PartialEq, Debug, thiserror::Error)]
#[error("{cause}")]
pub struct Error {
    /// The underlying cause of the error.
    pub cause: InnerError,
    /// The template source the error points into.
    pub source_code: String,
    /// The location in the source code for diagnostics.
    pub location: SourceSpan,
}

impl Error {
    pub fn from_error(source_code: impl Into<String>, cause: InnerError) -> Self {
        let source_code = source_code.into();
        let range = match &cause {
            InnerError::Tokenize(err) => err.range(),
            InnerError::Compile(err) => err.range(),
        };
        // Clamp so that a stale range can never point past the source.
        let start = range.start.min(source_code.len());
        let end = range.end.min(source_code.len());

        Self {
            cause,
            location: Range::new(start, end).into(),
            source_code,
        }
    }
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match &self.cause {
            InnerError::Tokenize(TokenizeError::Malformed { .. }) => "TokenizeError::Malformed",
            InnerError::Tokenize(TokenizeError::UnterminatedRawText { .. }) => {
                "TokenizeError::UnterminatedRawText"
            }
            InnerError::Compile(CompileError::UnmatchedDirective { .. }) => {
                "CompileError::UnmatchedDirective"
            }
            InnerError::Compile(CompileError::UnsupportedInterpolation { .. }) => {
                "CompileError::UnsupportedInterpolation"
            }
            InnerError::Compile(CompileError::UnresolvedMetadata { .. }) => {
                "CompileError::UnresolvedMetadata"
            }
            InnerError::Compile(CompileError::InvalidIteration { .. }) => {
                "CompileError::InvalidIteration"
            }
            InnerError::Compile(CompileError::UnbalancedElement { .. }) => {
                "CompileError::UnbalancedElement"
            }
        };

        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let msg = match &self.cause {
            InnerError::Tokenize(TokenizeError::Malformed { .. }) => {
                Some("Check that tags are closed and attribute values are quoted.")
            }
            InnerError::Tokenize(TokenizeError::UnterminatedRawText { .. }) => {
                Some("Add the missing end tag.")
            }
            InnerError::Compile(CompileError::UnmatchedDirective { .. }) => Some(
                "Place `<elseif>` and `<else>` inside the `<if>` they belong to, before its end tag.",
            ),
            InnerError::Compile(CompileError::UnsupportedInterpolation { .. }) => Some(
                "Expressions cannot contain braces; move object literals into a helper function.",
            ),
            InnerError::Compile(CompileError::UnresolvedMetadata { .. }) => Some(
                "Use a single top-level `<template name=\"...\" args=\"...\">` with a valid function name.",
            ),
            InnerError::Compile(CompileError::InvalidIteration { .. }) => {
                Some("Write the iteration as `item in items` or `item, key in items`.")
            }
            InnerError::Compile(CompileError::UnbalancedElement { .. }) => None,
        };

        msg.map(|m| Box::new(m) as Box<dyn std::fmt::Display>)
    }

    fn severity(&self) -> Option<Severity> {
        match self.cause {
            InnerError::Tokenize(_) => Some(Severity::Error),
            InnerError::Compile(_) => Some(Severity::Warning),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(format!("{}", self.cause)),
            self.location,
        ))))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.source_code)
    }
}
