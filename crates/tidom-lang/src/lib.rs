//! `tidom-lang` compiles HTML-like templates into functions that render through the
//! [incremental-dom](https://github.com/google/incremental-dom) patch API.
//!
//! Templates are ordinary markup extended with control directives:
//!
//! - `<if condition="...">`, `<elseif condition="...">`, `<else>` and the `if` attribute
//! - `<each expression="item[, key] in items">` and the `each` attribute
//! - `<skip condition="...">` and the `skip` attribute
//! - `<script>` for code passed through as is, `<script hoisted>` for code shared by every call
//! - `<template name="..." args="...">` naming the generated function
//!
//! Text and attribute values may contain `{expression}` holes. Expressions are copied verbatim.
//!
//! ## Examples
//!
//! ```rust
//! use tidom_lang::{Compiler, Options, OutputMode};
//!
//! let compiler = Compiler::new(Options {
//!     mode: OutputMode::Es6,
//!     ..Options::default()
//! });
//! let compiled = compiler
//!     .compile("<template name=\"greeting\"><p>Hello {data.name}!</p></template>")
//!     .unwrap();
//!
//! assert!(compiled.code.contains("export function greeting (data) {"));
//! assert!(compiled.code.contains("text(\"Hello \" + (data.name) + \"!\")"));
//! assert!(compiled.diagnostics.is_empty());
//! ```
mod attrs;
mod compiler;
mod emitter;
mod error;
mod hoist;
mod interpolation;
mod keys;
mod options;
mod package;
mod range;
mod tokenizer;

pub use attrs::{ClassifiedAttributes, Directives, Property, Static, classify, serialize_statics};
pub use compiler::{Compiled, Compiler, Tag};
pub use emitter::Emitter;
pub use error::{CompileError, Error, InnerError};
pub use hoist::HoistPool;
pub use interpolation::{Interpolated, InterpolationIssue, Segment, interpolate, quote};
pub use keys::{EachClause, EachScope, ExplicitKey, IdSource, SequentialIds, is_identifier};
pub use options::{DEFAULT_ARGS, DEFAULT_NAME, Options};
pub use package::{
    OutputMode, PRIMITIVES, Packager, PatchApi, Program, Signature, UnknownOutputMode,
};
pub use range::Range;
pub use tokenizer::Options as TokenizerOptions;
pub use tokenizer::Tokenizer;
pub use tokenizer::error::TokenizeError;
pub use tokenizer::event::{Attributes, TagEvent};

/// Compiles `source` with the given options.
#[allow(clippy::result_large_err)]
pub fn compile(source: &str, options: Options) -> Result<Compiled, Error> {
    Compiler::new(options).compile(source)
}

/// Tokenizes `source` into the events the compiler consumes.
#[allow(clippy::result_large_err)]
pub fn tokenize(source: &str) -> Result<Vec<TagEvent>, Error> {
    Tokenizer::default()
        .tokenize(source)
        .map_err(|e| Error::from_error(source, InnerError::Tokenize(e)))
}
