// ABOUTME: Console and timing intrinsics: GET, GETNUM, SAY, SLEEP

use super::numeric::{classify, NumberShape};
use crate::errors::RuntimeError;
use crate::trace;
use crate::value::{Value, ValueKind};
use std::io::BufRead;
use std::time::Duration;

fn read_line() -> String {
    let mut buffer = String::new();
    if std::io::stdin().lock().read_line(&mut buffer).is_err() {
        return String::new();
    }
    buffer.trim_end_matches(|c| c == '\n' || c == '\r').to_string()
}

/// `GET()` — reads one line from standard input as a string.
pub fn get(line: usize, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
    if !args.is_empty() {
        return Err(RuntimeError::report(300, line, &[&"GET", &0]));
    }
    let value = read_line();
    trace::record(line, "", format!("\"{}\"", value), "run builtin GET");
    Ok(Some(Value::string(value, line)))
}

/// `GETNUM()` — reads lines until one is numeric, then returns an integer
/// or a decimal accordingly. End of input counts as an empty line, which
/// fails conversion instead of blocking.
pub fn getnum(line: usize, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
    if !args.is_empty() {
        return Err(RuntimeError::report(300, line, &[&"GETNUM", &0]));
    }
    let mut text = read_line();
    while classify(&text) == NumberShape::NotANumber {
        println!("Please enter a number");
        text = read_line();
    }
    match classify(&text) {
        NumberShape::Float => match text.parse::<f64>() {
            Ok(value) => {
                trace::record(line, "", value.to_string(), "run builtin GETNUM");
                Ok(Some(Value::float(value, line)))
            }
            Err(_) => Err(RuntimeError::report(112, line, &[&text])),
        },
        _ => match text.parse::<i64>() {
            Ok(value) => {
                trace::record(line, "", value.to_string(), "run builtin GETNUM");
                Ok(Some(Value::int(value, line)))
            }
            Err(_) => Err(RuntimeError::report(111, line, &[&text])),
        },
    }
}

/// `SAY(x)` — prints a string raw, anything else in display form, always
/// with a trailing newline. Produces no value.
pub fn say(line: usize, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::report(300, line, &[&"SAY", &1]));
    }
    if let ValueKind::Str(text) = &args[0].kind {
        println!("{}", text);
        return Ok(None);
    }
    trace::record(line, args[0].to_string(), "output", "run builtin SAY");
    println!("{}", args[0]);
    Ok(None)
}

/// `SLEEP(seconds)` — blocks for a whole number of seconds.
pub fn sleep(line: usize, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::report(300, line, &[&"SLEEP", &1]));
    }
    let ValueKind::Int(seconds) = args[0].kind else {
        return Err(RuntimeError::report(301, line, &[&"SLEEP", &"an integer"]));
    };
    trace::record(
        line,
        format!("{} seconds", seconds),
        "wait",
        "run builtin SLEEP",
    );
    if seconds > 0 {
        std::thread::sleep(Duration::from_secs(seconds as u64));
    }
    Ok(None)
}
