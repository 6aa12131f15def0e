// ABOUTME: Error catalogue, syntax/runtime error types, and the per-run error list

use std::cell::RefCell;
use std::fmt;
use thiserror::Error;

/// A runtime error: first-class in the language, surfaced to drivers with
/// its numeric code and source line. Construction goes through [`report`],
/// which also records the error on the per-run list and in the trace.
///
/// [`report`]: RuntimeError::report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RuntimeError {
    pub code: u16,
    pub line: usize,
    pub message: String,
}

impl RuntimeError {
    pub fn report(code: u16, line: usize, args: &[&dyn fmt::Display]) -> Self {
        let message = format_message(code, line, args);
        let error = RuntimeError {
            code,
            line,
            message,
        };
        RUNTIME_ERRORS.with(|errors| errors.borrow_mut().push(error.clone()));
        crate::trace::record(line, "", "ERROR", error.message.clone());
        error
    }
}

/// A syntax error accumulated by the parser. The parser never aborts; the
/// driver reads the list after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub code: u16,
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(code: u16, line: usize, args: &[&dyn fmt::Display]) -> Self {
        SyntaxError {
            code,
            line,
            message: format_message(code, line, args),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

thread_local! {
    static RUNTIME_ERRORS: RefCell<Vec<RuntimeError>> = const { RefCell::new(Vec::new()) };
}

/// Clears the per-run runtime error list. Called at the start of each run.
pub fn reset_runtime_errors() {
    RUNTIME_ERRORS.with(|errors| errors.borrow_mut().clear());
}

/// All runtime errors recorded since the last reset, in report order.
pub fn runtime_errors() -> Vec<RuntimeError> {
    RUNTIME_ERRORS.with(|errors| errors.borrow().clone())
}

/// Formats a catalogue template. The offending line is always the first
/// placeholder argument.
pub fn format_message(code: u16, line: usize, args: &[&dyn fmt::Display]) -> String {
    let mut rendered: Vec<String> = Vec::with_capacity(args.len() + 1);
    rendered.push(line.to_string());
    rendered.extend(args.iter().map(|arg| arg.to_string()));
    render(template(code), &rendered)
}

fn render(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut parts = template.split("{}");
    if let Some(first) = parts.next() {
        out.push_str(first);
    }
    let mut args = args.iter();
    for part in parts {
        if let Some(arg) = args.next() {
            out.push_str(arg);
        }
        out.push_str(part);
    }
    out
}

/// The message catalogue, indexed by numeric code.
fn template(code: u16) -> &'static str {
    match code {
        101 => "line {}: expected {} here, but found '{}'",
        111 => "line {}: cannot convert '{}' to an integer; it may have too many digits",
        112 => "line {}: cannot convert '{}' to a decimal; it may have too many digits",
        121 => "line {}: '{}' cannot start an expression",
        122 => "line {}: '{}' cannot start an expression (did you mean '=='?)",
        130 => "line {}: full-width spaces cannot appear in a name",
        200 => "line {}: internal evaluation error",
        201 => "line {}: '{}' cannot come before a value; only - and ! can",
        202 => "line {}: '-' can only come before an integer or a decimal",
        203 => "line {}: both sides of an expression must have matching types; left is {}, right is {}",
        204 => "line {}: '{}' cannot be used between numbers; use one of + - * / % < <= > >= != == and or",
        205 => "line {}: '{}' cannot be used between booleans; use one of != == and or",
        206 => "line {}: the left side of '{}' does not support operators",
        207 => "line {}: strings only support '+', '==' and '!='",
        208 => "line {}: '{}' cannot be applied to decimals",
        209 => "line {}: cannot divide by zero",
        210 => "line {}: '{}' is not defined yet; define a variable with 'make name = value' or a function with 'func name(...)'",
        211 => "line {}: cannot bind an empty value to a name",
        220 => "line {}: the condition of this {} is not usable",
        230 => "line {}: a named function cannot be assigned to a variable (function name: {})",
        231 => "line {}: tried to call something that is not a function ({})",
        232 => "line {}: wrong number of arguments (call site: {}, function: {})",
        300 => "line {}: builtin {} expects {} arguments",
        301 => "line {}: the first argument of builtin {} must be {}",
        302 => "line {}: the first argument of ADD must be an array",
        303 => "line {}: ADD cannot append an array to itself",
        304 => "line {}: DELETE could not find a matching element; its second argument must be {}",
        305 => "line {}: the range arguments of SLICE must be integers",
        306 => "line {}: SLICE could not take that range; argument {} must be {}",
        400 => "line {}: cannot take a value out of {}",
        401 => "line {}: the index must be an integer, as in list[1]",
        402 => "line {}: the index must be 0 or greater, as in list[1]",
        403 => "line {}: no element at [ {} ] (the index must be {} or less)",
        500 => "line {}: a loop cannot take {} as its condition",
        502 => "line {}: the index must be 1 or greater, as in \"HELLO\"[1]",
        503 => "line {}: no character at [ {} ] (the index must be {} or less)",
        _ => "line {}: internal evaluation error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_placeholders_in_order() {
        assert_eq!(
            render("a {} b {} c", &["1".to_string(), "2".to_string()]),
            "a 1 b 2 c"
        );
    }

    #[test]
    fn test_format_message_puts_line_first() {
        let message = format_message(210, 7, &[&"x"]);
        assert!(message.starts_with("line 7:"), "{}", message);
        assert!(message.contains("'x'"), "{}", message);
    }

    #[test]
    fn test_report_appends_to_run_list() {
        reset_runtime_errors();
        let error = RuntimeError::report(402, 3, &[]);
        assert_eq!(error.code, 402);
        assert_eq!(error.line, 3);
        let recorded = runtime_errors();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0], error);
        reset_runtime_errors();
        assert!(runtime_errors().is_empty());
    }

    #[test]
    fn test_syntax_error_message() {
        let error = SyntaxError::new(101, 2, &[&"=", &"5"]);
        assert_eq!(error.code, 101);
        assert!(error.message.contains("expected ="), "{}", error.message);
        assert!(error.message.contains("'5'"), "{}", error.message);
    }
}
