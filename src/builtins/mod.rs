// ABOUTME: Intrinsic function registry, consulted after environment lookup misses

pub mod console;
pub mod containers;
pub mod numeric;

use crate::value::{BuiltinFn, Value, ValueKind};

/// Resolves an intrinsic by name. The evaluator asks only after the
/// environment chain has no binding, so `make SIZE = ...` shadows the
/// intrinsic for that scope without touching the registry.
pub fn lookup(name: &str, line: usize) -> Option<Value> {
    let (name, function): (&'static str, BuiltinFn) = match name {
        "SIZE" => ("SIZE", containers::size),
        "ADD" => ("ADD", containers::add),
        "DELETE" => ("DELETE", containers::delete),
        "SLICE" => ("SLICE", containers::slice),
        "GET" => ("GET", console::get),
        "GETNUM" => ("GETNUM", console::getnum),
        "SAY" => ("SAY", console::say),
        "SLEEP" => ("SLEEP", console::sleep),
        "ROOT" => ("ROOT", numeric::root),
        "TONUM" => ("TONUM", numeric::tonum),
        "RAND" => ("RAND", numeric::rand_range),
        _ => return None,
    };
    Some(Value {
        kind: ValueKind::Builtin(name, function),
        line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_resolve() {
        for name in [
            "SIZE", "ADD", "DELETE", "SLICE", "GET", "GETNUM", "SAY", "SLEEP", "ROOT", "TONUM",
            "RAND",
        ] {
            assert!(lookup(name, 1).is_some(), "{} should resolve", name);
        }
    }

    #[test]
    fn test_unknown_names_do_not_resolve() {
        assert!(lookup("size", 1).is_none());
        assert!(lookup("PRINT", 1).is_none());
    }
}
