// ABOUTME: Command line entry point: file mode, REPL mode, version check

use clap::Parser as CliParser;
use pri::env::Environment;
use pri::lexer::Lexer;
use pri::parser::Parser;
use pri::{config, errors, eval, repl, trace, update};
use std::path::{Path, PathBuf};

/// The Pri teaching language
#[derive(CliParser, Debug)]
#[command(name = "pri")]
#[command(about = "Interpreter and REPL for the Pri teaching language")]
#[command(disable_version_flag = true)]
struct CliArgs {
    /// Source file to run (requires the .pri extension); omit to start the REPL
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Print the evaluation trace after the run
    #[arg(short = 'l', long = "log")]
    log: bool,

    /// Print the version and check for a newer release
    #[arg(short = 'v', long = "version")]
    version: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    if args.version {
        println!("Pri {}{}", config::VERSION, update::check_latest());
        return Ok(());
    }

    match args.script {
        Some(path) => {
            run_file(&path, args.log);
            Ok(())
        }
        None => repl::open(),
    }
}

/// File mode: the whole program is parsed before any of it runs.
fn run_file(path: &Path, show_trace: bool) {
    if path.extension().and_then(|ext| ext.to_str()) != Some("pri") {
        eprintln!("Please pass a .pri file");
        return;
    }
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(_) => {
            eprintln!("Cannot find a file called {}", path.display());
            return;
        }
    };

    trace::reset();
    errors::reset_runtime_errors();
    let mut parser = Parser::new(Lexer::new(&source));
    let root = parser.parse();
    if !parser.errors().is_empty() {
        println!("There are {} syntax errors", parser.errors().len());
        for error in parser.errors() {
            println!("{}", error);
        }
        return;
    }

    let env = Environment::new();
    let result = eval::eval_root(&root, &env);
    if show_trace {
        repl::print_trace();
    }
    match result {
        Err(error) => println!("Oops: {}", error),
        Ok(Some(value)) => println!("Answer: {}", value),
        Ok(None) => {}
    }
}
