// ABOUTME: Syntax highlighter for the REPL with ANSI color support

use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use std::borrow::Cow;

// 3-bit/4-bit colors for terminal compatibility.
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_KEYWORD: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_BUILTIN: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)
const COLOR_BRACE: &str = "\x1b[1;34m"; // Bold blue

const KEYWORDS: [&str; 9] = [
    "make", "func", "if", "else", "return", "stop", "loop", "and", "or",
];

const INTRINSICS: [&str; 11] = [
    "SIZE", "ADD", "DELETE", "SLICE", "GET", "GETNUM", "SAY", "SLEEP", "ROOT", "TONUM", "RAND",
];

/// rustyline helper coloring Pri's lexical grammar as the user types.
pub struct PriHelper;

impl PriHelper {
    pub fn new() -> Self {
        PriHelper
    }
}

impl Default for PriHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for PriHelper {}

impl Completer for PriHelper {
    type Candidate = String;
}

impl Hinter for PriHelper {
    type Hint = String;
}

impl Validator for PriHelper {}

impl Highlighter for PriHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let highlighted = highlight_line(line);
        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn is_word_char(ch: char) -> bool {
    ch == '_' || ch.is_ascii_alphabetic() || !ch.is_ascii()
}

fn highlight_line(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut result = String::with_capacity(line.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            // `<< ... >>` comment, to its close or the end of the line
            '<' if chars.get(i + 1) == Some(&'<') => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() {
                    result.push(chars[i]);
                    if chars[i] == '>' && i > 0 && chars[i - 1] == '>' {
                        i += 1;
                        break;
                    }
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            '"' => {
                result.push_str(COLOR_STRING);
                result.push(chars[i]);
                i += 1;
                while i < chars.len() {
                    result.push(chars[i]);
                    if chars[i] == '"' {
                        i += 1;
                        break;
                    }
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            c if c.is_ascii_digit() => {
                result.push_str(COLOR_NUMBER);
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            '(' | ')' | '{' | '}' | '[' | ']' => {
                result.push_str(COLOR_BRACE);
                result.push(chars[i]);
                result.push_str(COLOR_RESET);
                i += 1;
            }

            c if is_word_char(c) => {
                let start = i;
                while i < chars.len() && is_word_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if KEYWORDS.contains(&word.as_str()) {
                    result.push_str(COLOR_KEYWORD);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if word == "true" || word == "false" {
                    result.push_str(COLOR_NUMBER);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if INTRINSICS.contains(&word.as_str()) {
                    result.push_str(COLOR_BUILTIN);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&word);
                }
            }

            c => {
                result.push(c);
                i += 1;
            }
        }
    }

    result
}
