use serde::{Deserialize, Serialize};

use crate::package::{OutputMode, PatchApi};

pub const DEFAULT_NAME: &str = "description";
pub const DEFAULT_ARGS: &str = "data";
pub const DEFAULT_KEY_PREFIX: &str = "k";
pub const DEFAULT_INDENT_WIDTH: usize = 2;

/// Compiler configuration.
///
/// Every field has a default, so a configuration file only needs the keys it changes:
///
/// ```toml
/// mode = "es6"
/// key_prefix = "card"
///
/// [patch_api]
/// module = "incremental-dom/dist/incremental-dom-cjs"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Function name used when the template has no `<template name="...">`.
    pub name: Option<String>,
    /// Parameter list used when the template has no `<template args="...">`.
    pub args: Option<String>,
    pub mode: OutputMode,
    /// Variable receiving the function in [`OutputMode::Default`].
    pub variable: Option<String>,
    pub patch_api: PatchApi,
    /// Prefix of generated ids, also used as the per-loop key disambiguator.
    pub key_prefix: String,
    pub indent_width: usize,
    /// Render every literal attribute as a property instead of hoisting statics.
    pub no_statics: bool,
    /// Fail on the first diagnostic.
    pub strict: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            name: None,
            args: None,
            mode: OutputMode::default(),
            variable: None,
            patch_api: PatchApi::default(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            indent_width: DEFAULT_INDENT_WIDTH,
            no_statics: false,
            strict: false,
        }
    }
}

impl Options {
    pub fn default_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_NAME)
    }

    pub fn default_args(&self) -> &str {
        self.args.as_deref().unwrap_or(DEFAULT_ARGS)
    }
}
