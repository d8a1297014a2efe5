//! Command-line front end for the PostScript-family interpreter.
//!
//! Either runs a script file to completion or drops into a line-buffered
//! REPL. Errors leave both stacks as they were at the point of failure
//! rather than rolling back, so a failed run's state is still inspectable.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use postscript_interpreter::config::Config;
use postscript_interpreter::engine::Interpreter;

/// A PostScript-family language interpreter.
#[derive(Parser, Debug)]
#[command(name = "postscript-interpreter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run PostScript-family scripts, or explore them interactively", long_about = None)]
struct Cli {
    /// Script file to execute. Starts a REPL if omitted.
    script: Option<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true, env = "POSTSCRIPT_VERBOSE")]
    verbose: bool,

    /// Path to a TOML configuration file (overrides the built-in default).
    #[arg(short, long, global = true, env = "POSTSCRIPT_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => match Config::load_from_path(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: failed to load config from {}: {e}", path.display());
                return std::process::ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    match &cli.script {
        Some(path) => run_file(path),
        None => {
            repl(&config);
            std::process::ExitCode::SUCCESS
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .try_init();
}

/// Reads and runs a script file to completion. Exits non-zero on any
/// lex/parse/interpreter error, after printing the final operand stack.
fn run_file(path: &PathBuf) -> std::process::ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: could not read {}: {e}", path.display());
            return std::process::ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut interp = Interpreter::new(Box::new(stdout));
    match interp.run(&source) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

/// Interactive read-eval-print loop. Interpreter state (both stacks)
/// persists across lines, so definitions and stack contents accumulate
/// throughout the session, same as the library's batch `run` would if fed
/// the whole transcript at once.
fn repl(config: &Config) {
    println!("PostScript interpreter. Ctrl+D to exit.");
    let stdout = io::stdout();
    let mut interp = Interpreter::new(Box::new(stdout));

    loop {
        print!("{}", config.prompt);
        let _ = io::stdout().flush();

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                if let Err(e) = interp.run(&line) {
                    eprintln!("error: {e}");
                }
            }
            Err(e) => {
                eprintln!("error: {e}");
                break;
            }
        }
    }
}
