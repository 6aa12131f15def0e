// ABOUTME: Numeric intrinsics: ROOT, TONUM, RAND

use crate::errors::RuntimeError;
use crate::trace;
use crate::value::{Value, ValueKind};
use rand::Rng;

/// What a piece of text would convert to: an integer (digits only), a
/// decimal (digits and a single dot), or nothing numeric at all.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum NumberShape {
    Int,
    Float,
    NotANumber,
}

pub(crate) fn classify(text: &str) -> NumberShape {
    let mut seen_dot = false;
    for ch in text.chars() {
        if ch == '.' {
            if seen_dot {
                return NumberShape::NotANumber;
            }
            seen_dot = true;
        } else if !ch.is_ascii_digit() {
            return NumberShape::NotANumber;
        }
    }
    if seen_dot {
        NumberShape::Float
    } else {
        NumberShape::Int
    }
}

/// `ROOT(x)` — square root of a non-negative number, always a decimal.
pub fn root(line: usize, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::report(300, line, &[&"ROOT", &1]));
    }
    let value = match args[0].kind {
        ValueKind::Int(n) => n as f64,
        ValueKind::Float(f) => f,
        _ => return Err(RuntimeError::report(301, line, &[&"ROOT", &"a number"])),
    };
    if value < 0.0 {
        return Err(RuntimeError::report(301, line, &[&"ROOT", &"0 or greater"]));
    }
    let result = value.sqrt();
    trace::record(
        line,
        format!("ROOT({})", args[0]),
        result.to_string(),
        "run builtin ROOT",
    );
    Ok(Some(Value::float(result, line)))
}

/// `TONUM(text)` — converts digit strings to an integer, digit strings
/// with a single dot to a decimal.
pub fn tonum(line: usize, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::report(300, line, &[&"TONUM", &1]));
    }
    let ValueKind::Str(text) = &args[0].kind else {
        return Err(RuntimeError::report(301, line, &[&"TONUM", &"a string"]));
    };
    match classify(text) {
        NumberShape::NotANumber => Err(RuntimeError::report(
            301,
            line,
            &[&"TONUM", &"a string holding an integer or a decimal"],
        )),
        NumberShape::Float => match text.parse::<f64>() {
            Ok(value) => {
                trace::record(
                    line,
                    format!("\"{}\"", text),
                    value.to_string(),
                    "run builtin TONUM",
                );
                Ok(Some(Value::float(value, line)))
            }
            Err(_) => Err(RuntimeError::report(112, line, &[&text])),
        },
        NumberShape::Int => match text.parse::<i64>() {
            Ok(value) => {
                trace::record(
                    line,
                    format!("\"{}\"", text),
                    value.to_string(),
                    "run builtin TONUM",
                );
                Ok(Some(Value::int(value, line)))
            }
            Err(_) => Err(RuntimeError::report(111, line, &[&text])),
        },
    }
}

/// `RAND(min, max)` — uniform in `[min, max)`: an integer when both bounds
/// are integers, a decimal otherwise.
pub fn rand_range(line: usize, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::report(300, line, &[&"RAND", &2]));
    }
    if let (ValueKind::Int(min), ValueKind::Int(max)) = (&args[0].kind, &args[1].kind) {
        if max <= min {
            return Err(RuntimeError::report(
                301,
                line,
                &[&"RAND", &"a range whose maximum is above its minimum"],
            ));
        }
        let value = rand::thread_rng().gen_range(*min..*max);
        trace::record(
            line,
            format!("random({} ~ {})", min, max),
            value.to_string(),
            "run builtin RAND",
        );
        return Ok(Some(Value::int(value, line)));
    }
    let (Some(min), Some(max)) = (as_float(&args[0]), as_float(&args[1])) else {
        return Err(RuntimeError::report(301, line, &[&"RAND", &"a number"]));
    };
    if max < min {
        return Err(RuntimeError::report(
            301,
            line,
            &[&"RAND", &"a range whose maximum is above its minimum"],
        ));
    }
    let value = if max > min {
        rand::thread_rng().gen_range(min..max)
    } else {
        min
    };
    trace::record(
        line,
        format!("random({} ~ {})", min, max),
        value.to_string(),
        "run builtin RAND",
    );
    Ok(Some(Value::float(value, line)))
}

fn as_float(value: &Value) -> Option<f64> {
    match value.kind {
        ValueKind::Int(n) => Some(n as f64),
        ValueKind::Float(f) => Some(f),
        _ => None,
    }
}
