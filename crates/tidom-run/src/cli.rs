use clap::CommandFactory;
use clap::{Parser, Subcommand};
use clap_complete::{Shell, generate};
use miette::{IntoDiagnostic, WrapErr, miette};
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tidom_lang::{Compiled, Compiler, Options, OutputMode};

#[derive(Parser, Debug)]
#[command(name = "tidom")]
#[command(version)]
#[command(after_help = "Examples:\n\n\
    To compile a template into an ES module:\n\
    $ tidom --mode es6 card.html\n\n\
    To compile every template into a directory:\n\
    $ tidom --mode cjs --out-dir dist templates/*.html\n\n\
    To check templates without writing any output:\n\
    $ tidom --check templates/*.html")]
#[command(
    about = "tidom compiles HTML templates into incremental-dom render functions.",
    long_about = None
)]
pub struct Cli {
    #[clap(flatten)]
    compile: CompileArgs,

    #[clap(flatten)]
    output: OutputArgs,

    #[clap(subcommand)]
    commands: Option<Commands>,

    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,

    /// Template files; reads stdin when none are given
    files: Option<Vec<PathBuf>>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum Mode {
    /// Immediately invoked function, optionally assigned to --variable
    Default,
    /// Assigned to window.<name>
    Browser,
    /// ES module export
    Es6,
    /// CommonJS module.exports
    Cjs,
    /// AMD define
    Amd,
}

impl From<Mode> for OutputMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Default => OutputMode::Default,
            Mode::Browser => OutputMode::Browser,
            Mode::Es6 => OutputMode::Es6,
            Mode::Cjs => OutputMode::Cjs,
            Mode::Amd => OutputMode::Amd,
        }
    }
}

#[derive(Clone, Debug, clap::Args, Default)]
struct CompileArgs {
    /// Load options from a TOML file; flags override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// How the compiled function is exposed
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Function name when the template does not set one; defaults to the file name
    #[arg(short, long)]
    name: Option<String>,

    /// Function parameters when the template does not set them
    #[arg(short, long)]
    args: Option<String>,

    /// Variable receiving the function in the default mode
    #[arg(long)]
    variable: Option<String>,

    /// Module providing the patch functions
    #[arg(long)]
    module: Option<String>,

    /// Namespace object holding the patch functions
    #[arg(long)]
    namespace: Option<String>,

    /// Prefix of generated keys
    #[arg(long)]
    key_prefix: Option<String>,

    /// Number of spaces for indentation
    #[arg(short, long)]
    indent_width: Option<usize>,

    /// Pass literal attributes as properties instead of hoisting them
    #[arg(long)]
    no_statics: bool,

    /// Fail on the first template problem
    #[arg(long)]
    strict: bool,
}

#[derive(Clone, Debug, clap::Args, Default)]
struct OutputArgs {
    /// Compile without writing output, failing if any template has problems
    #[arg(long, conflicts_with_all = ["output_file", "out_dir"])]
    check: bool,

    /// Output to the specified file
    #[arg(short = 'o', long = "output", value_name = "FILE", conflicts_with = "out_dir")]
    output_file: Option<PathBuf>,

    /// Write `<name>.js` for every input into the directory
    #[arg(short = 'd', long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate shell completion scripts for supported shells
    Completion {
        #[arg(short, long, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    pub fn run(&self) -> miette::Result<()> {
        match &self.commands {
            Some(Commands::Completion { shell }) => {
                generate(*shell, &mut Cli::command(), "tidom", &mut io::stdout());
                Ok(())
            }
            None => self.compile_all(),
        }
    }

    fn compile_all(&self) -> miette::Result<()> {
        let options = self.options()?;
        let contents = self.read_contents()?;

        if self.output.out_dir.is_some() && contents.iter().any(|(file, _)| file.is_none()) {
            return Err(miette!("--out-dir needs template files, not stdin"));
        }
        if self.output.output_file.is_some() && contents.len() > 1 {
            return Err(miette!("--output accepts a single template; use --out-dir"));
        }

        let mut problems = 0;
        let mut outputs = Vec::with_capacity(contents.len());

        for (file, content) in &contents {
            let compiler = Compiler::new(options_for(&options, file.as_deref()));
            let compiled = compiler.compile(content).wrap_err_with(|| match file {
                Some(file) => format!("Failed to compile {}", file.display()),
                None => "Failed to compile stdin".to_string(),
            })?;

            problems += report(&compiled, content);
            log::debug!(
                "{}: {}",
                file.as_deref()
                    .map(|f| f.display().to_string())
                    .unwrap_or_else(|| "stdin".to_string()),
                compiled.program.signature
            );
            outputs.push((file.clone(), compiled.code));
        }

        if self.output.check {
            return if problems == 0 {
                Ok(())
            } else {
                Err(miette!("{} problem(s) found", problems))
            };
        }

        self.write(outputs)
    }

    /// Options from the config file with command-line flags applied on top.
    fn options(&self) -> miette::Result<Options> {
        let mut options = match &self.compile.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
                toml::from_str::<Options>(&text)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("Invalid config {}", path.display()))?
            }
            None => Options::default(),
        };
        let args = &self.compile;

        if let Some(mode) = args.mode {
            options.mode = mode.into();
        }
        if let Some(name) = &args.name {
            options.name = Some(name.clone());
        }
        if let Some(params) = &args.args {
            options.args = Some(params.clone());
        }
        if let Some(variable) = &args.variable {
            options.variable = Some(variable.clone());
        }
        if let Some(module) = &args.module {
            options.patch_api.module = module.clone();
        }
        if let Some(namespace) = &args.namespace {
            options.patch_api.namespace = namespace.clone();
        }
        if let Some(key_prefix) = &args.key_prefix {
            options.key_prefix = key_prefix.clone();
        }
        if let Some(indent_width) = args.indent_width {
            options.indent_width = indent_width;
        }

        options.no_statics |= args.no_statics;
        options.strict |= args.strict;

        Ok(options)
    }

    fn read_contents(&self) -> miette::Result<Vec<(Option<PathBuf>, String)>> {
        match &self.files {
            Some(files) if !files.is_empty() => files
                .iter()
                .map(|file| {
                    fs::read_to_string(file)
                        .into_diagnostic()
                        .wrap_err_with(|| format!("Failed to read {}", file.display()))
                        .map(|content| (Some(file.clone()), content))
                })
                .collect(),
            _ => {
                let mut input = String::new();
                io::stdin().read_to_string(&mut input).into_diagnostic()?;
                Ok(vec![(None, input)])
            }
        }
    }

    fn write(&self, outputs: Vec<(Option<PathBuf>, String)>) -> miette::Result<()> {
        if let Some(out_dir) = &self.output.out_dir {
            fs::create_dir_all(out_dir).into_diagnostic()?;

            for (file, code) in outputs {
                let stem = file
                    .as_deref()
                    .and_then(Path::file_stem)
                    .ok_or_else(|| miette!("Cannot derive an output name"))?;
                let path = out_dir.join(stem).with_extension("js");

                log::info!("writing {}", path.display());
                fs::write(&path, code).into_diagnostic()?;
            }

            return Ok(());
        }

        let mut handle: Box<dyn Write> = match &self.output.output_file {
            Some(output_file) => {
                let file = fs::File::create(output_file).into_diagnostic()?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };

        for (_, code) in outputs {
            handle.write_all(code.as_bytes()).into_diagnostic()?;
        }

        handle.flush().into_diagnostic()
    }
}

/// Names the function after the template file when nothing else names it.
fn options_for(options: &Options, file: Option<&Path>) -> Options {
    let mut options = options.clone();

    if options.name.is_none() {
        options.name = file
            .and_then(Path::file_stem)
            .and_then(|stem| stem.to_str())
            .filter(|stem| tidom_lang::is_identifier(stem))
            .map(str::to_string);
    }

    options
}

/// Prints diagnostics to stderr, returning how many there were.
fn report(compiled: &Compiled, source: &str) -> usize {
    for error in compiled.errors(source) {
        eprintln!("{:?}", miette::Report::new(error));
    }

    compiled.diagnostics.len()
}
