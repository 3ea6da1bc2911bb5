//! Single-pass translation of a tag event stream into patch calls.
//!
//! The compiler never builds a tree. It keeps one stack of frames, one per open tag, each
//! recording what must be written when that tag closes:
//!
//! - `<if>` owes a `}`, `<elseif>` and `<else>` owe nothing because they only re-open the block
//! - `<each>` owes the loop closer `}, this)` and its null-guard `}`
//! - an element owes, in order, its skip guard, `elementClose`, its loop closers and its `if` guard
//!
//! Misplaced directives and unbalanced tags are recorded as diagnostics while the output stays
//! brace-balanced.

mod compile;
mod control_flow;
mod frame;
mod session;
#[cfg(test)]
mod test_compiler;

pub use compile::{Compiled, Compiler};
pub use frame::Tag;
