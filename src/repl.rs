// ABOUTME: Interactive read-eval-print loop with multi-line block entry

use crate::config::{VERSION, WELCOME_BANNER};
use crate::env::Environment;
use crate::errors;
use crate::eval;
use crate::highlighter::PriHelper;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::trace;
use crate::update;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::rc::Rc;

/// Starts the interactive loop. `Q!` quits, `LOG!` toggles trace display.
/// Input accumulates while the running `{`/`}` balance is positive, with
/// one `...` prompt marker per open depth; at depth zero the buffered text
/// runs against the persistent environment.
pub fn open() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", WELCOME_BANNER);
    println!("Pri {}{}", VERSION, update::check_latest());
    println!("Welcome! Statements run as you enter them.");
    println!("Quit: Q!, toggle the evaluation trace: LOG!");

    let config = Config::builder().auto_add_history(true).build();
    let mut editor: Editor<PriHelper, DefaultHistory> = Editor::with_config(config)?;
    editor.set_helper(Some(PriHelper::new()));

    let env = Environment::new();
    let mut show_trace = false;
    let mut depth: i64 = 0;
    let mut buffer = String::new();

    loop {
        let prompt = if depth > 0 {
            format!("{} ", "...".repeat(depth as usize))
        } else {
            ">> ".to_string()
        };
        match editor.readline(&prompt) {
            Ok(input) => {
                let trimmed = input.trim();
                if trimmed == "Q!" {
                    println!("Quit!");
                    break;
                }
                if trimmed == "LOG!" {
                    show_trace = !show_trace;
                    if show_trace {
                        println!("Trace display is on");
                    } else {
                        println!("Trace display is off");
                    }
                    continue;
                }
                depth += input.matches('{').count() as i64;
                if depth > 0 {
                    buffer.push_str(&input);
                    buffer.push('\n');
                } else {
                    buffer = input.clone();
                }
                depth -= input.matches('}').count() as i64;
                if depth <= 0 {
                    run_source(&buffer, &env, show_trace);
                    buffer.clear();
                    depth = 0;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                buffer.clear();
                depth = 0;
            }
            Err(ReadlineError::Eof) => {
                println!("\nQuit!");
                break;
            }
            Err(error) => {
                eprintln!("Error: {}", error);
                break;
            }
        }
    }
    Ok(())
}

/// Runs one submission against the shared environment: parse everything,
/// stop on syntax errors, otherwise evaluate and print the answer or the
/// first runtime error.
fn run_source(source: &str, env: &Rc<Environment>, show_trace: bool) {
    trace::reset();
    errors::reset_runtime_errors();
    let mut parser = Parser::new(Lexer::new(source));
    let root = parser.parse();
    if !parser.errors().is_empty() {
        println!("There are {} syntax errors", parser.errors().len());
        for error in parser.errors() {
            println!("\x1b[31m{}\x1b[0m", error);
        }
        return;
    }
    let result = eval::eval_root(&root, env);
    if show_trace {
        print_trace();
    }
    match result {
        Err(error) => println!("\x1b[31mOops: {}\x1b[0m", error),
        Ok(Some(value)) => println!("Answer: {}", value),
        Ok(None) => {}
    }
}

/// Prints the evaluation trace collected during the last run.
pub fn print_trace() {
    for record in trace::snapshot() {
        println!(
            "[{}] line {}: {} -> {} ({})",
            record.seq, record.line, record.from, record.to, record.note
        );
    }
}
