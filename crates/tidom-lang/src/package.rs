use itertools::Itertools;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Patch primitives every packaged template binds exactly once.
pub const PRIMITIVES: [&str; 6] = [
    "patch",
    "elementOpen",
    "elementClose",
    "text",
    "skip",
    "currentElement",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// An immediately invoked function, optionally assigned to a variable.
    #[default]
    Default,
    /// Assigned to `window.<name>`.
    Browser,
    /// ES module with a named export.
    Es6,
    /// CommonJS `module.exports`.
    Cjs,
    /// AMD `define` with `exports.<name>`.
    Amd,
}

impl OutputMode {
    pub const ALL: [OutputMode; 5] = [
        OutputMode::Default,
        OutputMode::Browser,
        OutputMode::Es6,
        OutputMode::Cjs,
        OutputMode::Amd,
    ];
}

impl Display for OutputMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Default => write!(f, "default"),
            OutputMode::Browser => write!(f, "browser"),
            OutputMode::Es6 => write!(f, "es6"),
            OutputMode::Cjs => write!(f, "cjs"),
            OutputMode::Amd => write!(f, "amd"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown output mode `{0}`, expected one of default, browser, es6, cjs, amd")]
pub struct UnknownOutputMode(pub String);

impl FromStr for OutputMode {
    type Err = UnknownOutputMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" | "global" | "var" => Ok(OutputMode::Default),
            "browser" | "window" => Ok(OutputMode::Browser),
            "es6" | "esm" | "module" => Ok(OutputMode::Es6),
            "cjs" | "commonjs" => Ok(OutputMode::Cjs),
            "amd" => Ok(OutputMode::Amd),
            _ => Err(UnknownOutputMode(s.to_string())),
        }
    }
}

/// Where the patch primitives come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchApi {
    /// Module specifier for module output modes.
    pub module: String,
    /// Namespace object holding the primitives, global or module-local.
    pub namespace: String,
}

impl Default for PatchApi {
    fn default() -> Self {
        Self {
            module: "incremental-dom".to_string(),
            namespace: "IncrementalDOM".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: SmolStr,
    pub params: Vec<SmolStr>,
}

impl Signature {
    /// Parameters may be separated by whitespace or commas.
    pub fn new(name: impl Into<SmolStr>, params: &str) -> Self {
        Self {
            name: name.into(),
            params: params
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|p| !p.is_empty())
                .map(SmolStr::new)
                .collect(),
        }
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.params.iter().join(", "))
    }
}

/// A compiled template before packaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub signature: Signature,
    /// Function body lines, indented relative to the body.
    pub body: Vec<String>,
    /// Hoisted declarations and captured literal lines.
    pub prologue: String,
}

impl Program {
    pub fn function(&self, indent_width: usize) -> String {
        let indent = " ".repeat(indent_width);
        let body = self
            .body
            .iter()
            .scan(false, |continued, line| {
                let indented = if line.is_empty() || *continued {
                    line.clone()
                } else {
                    format!("{}{}", indent, line)
                };
                *continued = line.ends_with('\\');
                Some(indented)
            })
            .join("\n");

        if body.is_empty() {
            format!("function {} {{\n}}", self.signature)
        } else {
            format!("function {} {{\n{}\n}}", self.signature, body)
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Bindings {
    /// `import {patch, ...} from "<module>"`
    NamedImport,
    /// `var patch = <namespace>.patch` for every primitive, optionally after declaring the
    /// namespace itself from `source`.
    Members { source: Option<&'static str> },
}

/// How one output mode wraps a program.
///
/// `{module}`, `{namespace}`, `{name}`, `{assign}` and `{fn}` are substituted when packaging.
#[derive(Debug, Clone, Copy)]
struct ModeTemplate {
    open: Option<&'static str>,
    bindings: Bindings,
    expose: &'static str,
    close: Option<&'static str>,
}

const fn template(mode: OutputMode) -> ModeTemplate {
    match mode {
        OutputMode::Default => ModeTemplate {
            open: Some("{assign}(function () {"),
            bindings: Bindings::Members { source: None },
            expose: "return {fn}",
            close: Some("})()"),
        },
        OutputMode::Browser => ModeTemplate {
            open: Some("window.{name} = (function () {"),
            bindings: Bindings::Members { source: None },
            expose: "return {fn}",
            close: Some("})()"),
        },
        OutputMode::Es6 => ModeTemplate {
            open: None,
            bindings: Bindings::NamedImport,
            expose: "export {fn}",
            close: None,
        },
        OutputMode::Cjs => ModeTemplate {
            open: None,
            bindings: Bindings::Members {
                source: Some("require('{module}')"),
            },
            expose: "module.exports = {fn}",
            close: None,
        },
        OutputMode::Amd => ModeTemplate {
            open: Some("define(['exports', '{module}'], function (exports, {namespace}) {"),
            bindings: Bindings::Members { source: None },
            expose: "exports.{name} = (function () {\n  return {fn}\n})()",
            close: Some("})"),
        },
    }
}

#[derive(Debug, Clone)]
pub struct Packager<'a> {
    pub mode: OutputMode,
    pub api: &'a PatchApi,
    /// Variable receiving the function in the default mode.
    pub variable: Option<&'a str>,
    pub indent_width: usize,
}

impl Packager<'_> {
    pub fn package(&self, program: &Program) -> String {
        let template = template(self.mode);
        let assign = match self.variable {
            Some(variable) => format!("var {} = ", variable),
            None => ";".to_string(),
        };
        let substitute = |text: &str| {
            text.replace("{module}", &self.api.module)
                .replace("{namespace}", &self.api.namespace)
                .replace("{name}", &program.signature.name)
                .replace("{assign}", &assign)
        };

        let mut head = Vec::new();

        if let Some(open) = template.open {
            head.push(substitute(open));
        }

        match template.bindings {
            Bindings::NamedImport => head.push(format!(
                "import {{{}}} from \"{}\"",
                PRIMITIVES.join(", "),
                self.api.module
            )),
            Bindings::Members { source } => {
                if let Some(source) = source {
                    head.push(format!(
                        "var {} = {}",
                        self.api.namespace,
                        substitute(source)
                    ));
                }

                head.extend(PRIMITIVES.iter().map(|primitive| {
                    format!("var {} = {}.{}", primitive, self.api.namespace, primitive)
                }));
            }
        }

        // `{fn}` is substituted last so that template text inside the function stays untouched.
        let expose = substitute(template.expose).replace("{fn}", &program.function(self.indent_width));
        let mut blocks = vec![head.join("\n")];

        if !program.prologue.is_empty() {
            blocks.push(program.prologue.clone());
        }

        blocks.push(expose);

        let mut output = blocks.join("\n\n");

        if let Some(close) = template.close {
            output.push('\n');
            output.push_str(&substitute(close));
        }

        output.push('\n');
        output
    }
}
