//! Everything needed to parse darix's CLI arguments: subcommands,
//! backend selection, and the verbosity/log-level flag.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Specify the log level of the runtime.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default(), global = true)]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    #[default]
    #[value(alias("0"))]
    Error,
    #[value(alias("1"))]
    Warn,
    #[value(alias("2"))]
    Info,
    #[value(alias("3"))]
    Debug,
    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// `--backend=auto|vm|interp` (`spec.md` §6).
#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum BackendArg {
    #[default]
    Auto,
    Vm,
    Interp,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a `.dax` file (or `-` for stdin).
    Run(RunArgs),
    /// Compile a file to bytecode and print its disassembly.
    Disasm(DisasmArgs),
    /// Start a minimal read-eval-print loop.
    Repl(ReplArgs),
    /// Run a single snippet passed on the command line.
    Eval(EvalArgs),
    /// Print the darix version and exit.
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to a `.dax` file, or `-` to read the program from stdin.
    #[arg(index = 1)]
    pub file: String,

    /// Which execution strategy to use.
    #[arg(long, value_enum, default_value_t = BackendArg::Auto)]
    pub backend: BackendArg,

    /// Native module names to allow (repeatable); implies a deny-by-default policy.
    #[arg(long)]
    pub allow: Vec<String>,

    /// Native module names to deny (repeatable); overrides `--allow`.
    #[arg(long)]
    pub deny: Vec<String>,

    /// Sandbox root for `go:fs` operations.
    #[arg(long)]
    pub fs_root: Option<PathBuf>,

    /// Make the filesystem sandbox read-only.
    #[arg(long)]
    pub fs_ro: bool,

    /// Abort with a RuntimeError after executing N VM instructions.
    #[arg(long)]
    pub cpu: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct DisasmArgs {
    #[arg(index = 1)]
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ReplArgs {
    #[arg(long, value_enum, default_value_t = BackendArg::Auto)]
    pub backend: BackendArg,
}

#[derive(Args, Debug, Clone)]
pub struct EvalArgs {
    #[arg(index = 1)]
    pub snippet: String,

    #[arg(long, value_enum, default_value_t = BackendArg::Auto)]
    pub backend: BackendArg,
}
