// ABOUTME: Container intrinsics: SIZE, ADD, DELETE, SLICE

use crate::errors::RuntimeError;
use crate::trace;
use crate::value::{Value, ValueKind};
use std::rc::Rc;

/// `SIZE(x)` — element count for arrays, Unicode scalar count for strings.
pub fn size(line: usize, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::report(300, line, &[&"SIZE", &1]));
    }
    match &args[0].kind {
        ValueKind::Str(text) => {
            let count = text.chars().count() as i64;
            trace::record(
                line,
                format!("SIZE({})", args[0]),
                count.to_string(),
                "run builtin SIZE",
            );
            Ok(Some(Value::int(count, line)))
        }
        ValueKind::Array(elements) => {
            let count = elements.borrow().len() as i64;
            trace::record(
                line,
                format!("SIZE({})", args[0]),
                count.to_string(),
                "run builtin SIZE",
            );
            Ok(Some(Value::int(count, line)))
        }
        _ => Err(RuntimeError::report(
            301,
            line,
            &[&"SIZE", &"a string or an array"],
        )),
    }
}

/// `ADD(array, value)` — appends in place; every alias of the array sees
/// the new element. Appending an array to itself is rejected.
pub fn add(line: usize, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::report(300, line, &[&"ADD", &2]));
    }
    let target = args[0].clone();
    let item = args[1].clone();
    match &target.kind {
        ValueKind::Array(elements) => {
            if let ValueKind::Array(other) = &item.kind {
                if Rc::ptr_eq(elements, other) {
                    return Err(RuntimeError::report(303, line, &[]));
                }
            }
            let before = target.to_string();
            elements.borrow_mut().push(item);
            trace::record(
                line,
                format!("ADD({})", before),
                target.to_string(),
                "run builtin ADD",
            );
            Ok(None)
        }
        _ => Err(RuntimeError::report(302, line, &[])),
    }
}

/// `DELETE(array, index)` — removes the element at a 0-based index.
pub fn delete(line: usize, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::report(300, line, &[&"DELETE", &2]));
    }
    let target = args[0].clone();
    match &target.kind {
        ValueKind::Array(elements) => {
            let ValueKind::Int(index) = args[1].kind else {
                return Err(RuntimeError::report(304, line, &[&"an integer"]));
            };
            let len = elements.borrow().len() as i64;
            if index < 0 {
                return Err(RuntimeError::report(304, line, &[&"0 or greater"]));
            }
            if index >= len {
                let bound = format!("{} or less", len - 1);
                return Err(RuntimeError::report(304, line, &[&bound]));
            }
            let before = target.to_string();
            elements.borrow_mut().remove(index as usize);
            trace::record(
                line,
                format!("DELETE({})", before),
                target.to_string(),
                "run builtin DELETE",
            );
            Ok(None)
        }
        _ => Err(RuntimeError::report(302, line, &[])),
    }
}

/// `SLICE(string, start [, end])` with 1-based inclusive positions, or
/// `SLICE(array, start [, end])` with a 0-based start and exclusive end.
pub fn slice(line: usize, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
    if !(2..=3).contains(&args.len()) {
        return Err(RuntimeError::report(300, line, &[&"SLICE", &"2 or 3"]));
    }
    let target = args[0].clone();
    match &target.kind {
        ValueKind::Str(text) => {
            let ValueKind::Int(start) = args[1].kind else {
                return Err(RuntimeError::report(305, line, &[]));
            };
            let max = text.chars().count() as i64;
            if start < 1 {
                return Err(RuntimeError::report(306, line, &[&1, &"1 or greater"]));
            }
            if start > max {
                let bound = format!("{} or less", max);
                return Err(RuntimeError::report(306, line, &[&1, &bound]));
            }
            let mut end = max;
            if args.len() == 3 {
                let ValueKind::Int(given) = args[2].kind else {
                    return Err(RuntimeError::report(305, line, &[]));
                };
                if given > max {
                    let bound = format!("{} or less", max);
                    return Err(RuntimeError::report(306, line, &[&2, &bound]));
                }
                if given < 1 {
                    return Err(RuntimeError::report(306, line, &[&2, &"1 or greater"]));
                }
                if given < start {
                    return Err(RuntimeError::report(
                        306,
                        line,
                        &[&2, &"at least the start position"],
                    ));
                }
                end = given;
            }
            let result: String = text
                .chars()
                .skip(start as usize - 1)
                .take((end - start + 1) as usize)
                .collect();
            trace::record(
                line,
                format!("SLICE({})", target),
                result.as_str(),
                "run builtin SLICE",
            );
            Ok(Some(Value::string(result, line)))
        }
        ValueKind::Array(elements) => {
            let ValueKind::Int(start) = args[1].kind else {
                return Err(RuntimeError::report(305, line, &[]));
            };
            let max = elements.borrow().len() as i64;
            if start < 0 {
                return Err(RuntimeError::report(306, line, &[&1, &"0 or greater"]));
            }
            if start > max {
                let bound = format!("{} or less", max);
                return Err(RuntimeError::report(306, line, &[&1, &bound]));
            }
            let mut end = max;
            if args.len() == 3 {
                let ValueKind::Int(given) = args[2].kind else {
                    return Err(RuntimeError::report(305, line, &[]));
                };
                if given > max {
                    let bound = format!("{} or less", max);
                    return Err(RuntimeError::report(306, line, &[&2, &bound]));
                }
                if given < 0 {
                    return Err(RuntimeError::report(306, line, &[&2, &"0 or greater"]));
                }
                if given < start {
                    return Err(RuntimeError::report(
                        306,
                        line,
                        &[&2, &"at least the start position"],
                    ));
                }
                end = given;
            }
            let sliced: Vec<Value> = elements.borrow()[start as usize..end as usize].to_vec();
            let result = Value::array(sliced, line);
            trace::record(
                line,
                format!("SLICE({})", target),
                result.to_string(),
                "run builtin SLICE",
            );
            Ok(Some(result))
        }
        _ => Err(RuntimeError::report(
            301,
            line,
            &[&"SLICE", &"a string or an array"],
        )),
    }
}
