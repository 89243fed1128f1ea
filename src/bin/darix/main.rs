//! The darix CLI: `run`, `disasm`, `repl`, `eval`, `version`
//! (`spec.md` §6 "CLI surface").
mod cli;

use std::error::Error;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;

use cli::*;

use darix::bytecode::{disassemble, Compiler};
use darix::env::Environment;
use darix::interpreter::Interpreter;
use darix::native::{CapabilityPolicy, NativeRegistry};
use darix::runtime::{Backend, RuntimeBuilder};
use log::error;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::init();
    simple_logger::init_with_level(log::Level::from(&args.verbosity)).ok();

    let exit_code = match args.command {
        Commands::Run(run_args) => cmd_run(run_args)?,
        Commands::Disasm(disasm_args) => cmd_disasm(disasm_args)?,
        Commands::Repl(repl_args) => cmd_repl(repl_args)?,
        Commands::Eval(eval_args) => cmd_eval(eval_args)?,
        Commands::Version => {
            println!("darix {}", env!("CARGO_PKG_VERSION"));
            0
        }
    };

    std::process::exit(exit_code);
}

fn backend_from_arg(arg: BackendArg) -> Backend {
    match arg {
        BackendArg::Auto => Backend::Auto,
        BackendArg::Vm => Backend::Vm,
        BackendArg::Interp => Backend::Interp,
    }
}

fn policy_from_flags(allow: &[String], deny: &[String], fs_root: Option<PathBuf>, fs_ro: bool) -> CapabilityPolicy {
    let mut policy = CapabilityPolicy::default();
    if !allow.is_empty() {
        policy.allow_all_native = false;
        for name in allow {
            policy.allow_go_modules.insert(name.clone(), true);
        }
    }
    for name in deny {
        policy.allow_go_modules.insert(name.clone(), false);
    }
    policy.fs_root = fs_root;
    policy.fs_read_only = fs_ro;
    policy
}

fn read_source(file: &str) -> io::Result<String> {
    if file == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file)
    }
}

fn cmd_run(args: RunArgs) -> Result<i32, Box<dyn Error>> {
    let source = read_source(&args.file)?;
    let base_dir = if args.file == "-" {
        PathBuf::from(".")
    } else {
        PathBuf::from(&args.file)
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    };
    let policy = policy_from_flags(&args.allow, &args.deny, args.fs_root.clone(), args.fs_ro);
    let runtime = RuntimeBuilder::new()
        .with_policy(policy)
        .with_base_dir(base_dir)
        .with_backend(backend_from_arg(args.backend))
        .with_max_steps(args.cpu)
        .build();

    match runtime.run(&source) {
        Ok(_) => Ok(0),
        Err(e) => {
            error!("{e}");
            Ok(1)
        }
    }
}

fn cmd_disasm(args: DisasmArgs) -> Result<i32, Box<dyn Error>> {
    let source = std::fs::read_to_string(&args.file)?;
    let (program, errors) = darix::parser::parse_source(&args.file.to_string_lossy(), &source, false);
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        return Ok(1);
    }

    let mut compiler = Compiler::new();
    if let Err(e) = compiler.compile_program(&program) {
        error!("{e}");
        return Ok(1);
    }
    let unit = compiler.finish();
    print!("{}", disassemble(&unit.instructions, &unit.constants));
    Ok(0)
}

fn cmd_eval(args: EvalArgs) -> Result<i32, Box<dyn Error>> {
    let runtime = RuntimeBuilder::new().with_backend(backend_from_arg(args.backend)).build();
    match runtime.run(&args.snippet) {
        Ok(v) => {
            println!("{}", v.inspect());
            Ok(0)
        }
        Err(e) => {
            error!("{e}");
            Ok(1)
        }
    }
}

/// A minimal REPL: one statement per line, no history or multi-line
/// grouping. Always evaluated on the tree-walking interpreter so bindings
/// persist across lines through a single `Environment`. The VM's
/// compiler allocates global slots per compilation unit, so slot numbers
/// wouldn't line up across separately compiled lines.
fn cmd_repl(_args: ReplArgs) -> Result<i32, Box<dyn Error>> {
    let natives = std::rc::Rc::new(NativeRegistry::with_builtin_modules());
    let interpreter = Interpreter::new(natives, CapabilityPolicy::default(), PathBuf::from("."));
    let env = Environment::new();

    let stdin = io::stdin();
    loop {
        print!("darix> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        let (program, errors) = darix::parser::parse_source("<repl>", line, true);
        if !errors.is_empty() {
            for e in &errors {
                eprintln!("{e}");
            }
            continue;
        }
        match interpreter.run(&program, &env) {
            Ok(v) => println!("{}", v.inspect()),
            Err(signal) => eprintln!("{}", darix::runtime::RunError::Signal(signal)),
        }
    }
    Ok(0)
}
