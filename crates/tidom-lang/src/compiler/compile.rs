use super::session::Session;
use crate::error::{CompileError, Error, InnerError};
use crate::keys::{IdSource, SequentialIds};
use crate::options::Options;
use crate::package::{Packager, Program};
use crate::tokenizer::Tokenizer;
use crate::tokenizer::event::TagEvent;

/// Result of a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    /// The packaged module text.
    pub code: String,
    pub program: Program,
    /// Structural problems that did not stop compilation.
    pub diagnostics: Vec<CompileError>,
}

impl Compiled {
    /// Diagnostics as reportable errors pointing into `source`.
    pub fn errors<'a>(&'a self, source: &'a str) -> impl Iterator<Item = Error> + 'a {
        self.diagnostics
            .iter()
            .map(move |diagnostic| Error::from_error(source, diagnostic.clone().into()))
    }
}

/// Compiles templates with a fixed set of options.
///
/// The compiler holds no state between compiles, so one instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: Options,
    tokenizer: Tokenizer,
}

impl Compiler {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            tokenizer: Tokenizer::default(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn compile(&self, source: &str) -> Result<Compiled, Error> {
        let mut ids = SequentialIds::new(self.options.key_prefix.as_str());
        self.compile_with(source, &mut ids)
    }

    /// Compiles with generated keys drawn from `ids`.
    pub fn compile_with(&self, source: &str, ids: &mut dyn IdSource) -> Result<Compiled, Error> {
        let events = self
            .tokenizer
            .tokenize(source)
            .map_err(|e| Error::from_error(source, InnerError::Tokenize(e)))?;

        self.compile_events(source, events, ids)
    }

    /// Compiles an already tokenized template. `source` is only used for error reporting.
    pub fn compile_events(
        &self,
        source: &str,
        events: impl IntoIterator<Item = TagEvent>,
        ids: &mut dyn IdSource,
    ) -> Result<Compiled, Error> {
        let mut session = Session::new(&self.options, ids, source.len());

        for event in events {
            session.feed(event);
        }

        let (program, diagnostics) = session.finish();

        if self.options.strict
            && let Some(diagnostic) = diagnostics.first()
        {
            return Err(Error::from_error(
                source,
                InnerError::Compile(diagnostic.clone()),
            ));
        }

        let code = Packager {
            mode: self.options.mode,
            api: &self.options.patch_api,
            variable: self.options.variable.as_deref(),
            indent_width: self.options.indent_width,
        }
        .package(&program);

        log::debug!(
            "compiled `{}` ({} lines, {} diagnostics)",
            program.signature,
            program.body.len(),
            diagnostics.len()
        );

        Ok(Compiled {
            code,
            program,
            diagnostics,
        })
    }
}
