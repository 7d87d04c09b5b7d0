//! CLI driver: thin glue over the pipeline in `lib.rs`. No args starts a
//! line-oriented REPL; one positional path runs a whole file once.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as _;
use log::LevelFilter;

use wisp::interpreter::Interpreter;
use wisp::PipelineError;

#[derive(clap::Parser)]
#[command(name = "wisp", about = "A small tree-walking interpreter")]
struct Cli {
    /// Source file to run. Omit to start the REPL.
    path: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    simple_logger::SimpleLogger::new()
        .with_level(level_for(cli.verbose))
        .init()
        .expect("logger can only be initialized once");

    match cli.path {
        Some(path) => run_file(&path),
        None => {
            run_repl();
            ExitCode::SUCCESS
        }
    }
}

fn run_file(path: &PathBuf) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Could not read {}: {e}", path.display());
            return ExitCode::from(255);
        }
    };

    let mut interpreter = Interpreter::new();
    match wisp::run(&mut interpreter, &source) {
        Ok(runtime_errors) => {
            for e in runtime_errors {
                println!("{e}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_pipeline_error(&e);
            ExitCode::from(255)
        }
    }
}

fn run_repl() {
    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            continue;
        }

        let source = match line.strip_prefix("file:") {
            Some(rest) => match std::fs::read_to_string(rest.trim_start()) {
                Ok(contents) => contents,
                Err(e) => {
                    println!("Could not read file: {e}");
                    continue;
                }
            },
            None => line.to_string(),
        };

        match wisp::run(&mut interpreter, &source) {
            Ok(runtime_errors) => {
                for e in runtime_errors {
                    println!("{e}");
                }
            }
            Err(e) => print_pipeline_error(&e),
        }
    }
}

fn print_pipeline_error(error: &PipelineError) {
    match error {
        PipelineError::Lex(e) => println!("{e}"),
        PipelineError::Parse(errors) => {
            for e in errors {
                println!("{e}");
            }
        }
    }
}
