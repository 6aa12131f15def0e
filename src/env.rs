// ABOUTME: Environment chain holding variable bindings for nested scopes

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A mapping from names to values with an optional parent link. Lookups
/// walk parent-ward; `make` writes locally; assignment writes into the
/// environment where the name is currently visible.
#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// The global scope.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// A child scope, created when a function is invoked.
    pub fn enclosed(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Writes into this scope, shadowing any outer binding of the name.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Resolves a name through this scope and its parents.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.lookup(name))
    }

    /// Overwrites the binding in the scope where `name` is visible.
    /// Returns false when the name is bound nowhere on the chain.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return true;
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    fn int_of(value: &Value) -> i64 {
        match value.kind {
            ValueKind::Int(n) => n,
            _ => panic!("expected an integer, got {}", value),
        }
    }

    #[test]
    fn test_define_and_lookup() {
        let env = Environment::new();
        env.define("x", Value::int(42, 1));
        assert_eq!(int_of(&env.lookup("x").unwrap()), 42);
    }

    #[test]
    fn test_missing_name() {
        let env = Environment::new();
        assert!(env.lookup("missing").is_none());
    }

    #[test]
    fn test_child_sees_parent() {
        let parent = Environment::new();
        parent.define("x", Value::int(1, 1));
        let child = Environment::enclosed(parent);
        assert_eq!(int_of(&child.lookup("x").unwrap()), 1);
    }

    #[test]
    fn test_define_shadows_outer_binding() {
        let parent = Environment::new();
        parent.define("x", Value::int(1, 1));
        let child = Environment::enclosed(parent.clone());
        child.define("x", Value::int(2, 1));
        assert_eq!(int_of(&child.lookup("x").unwrap()), 2);
        assert_eq!(int_of(&parent.lookup("x").unwrap()), 1);
    }

    #[test]
    fn test_assign_writes_to_defining_scope() {
        let parent = Environment::new();
        parent.define("count", Value::int(0, 1));
        let child = Environment::enclosed(parent.clone());
        assert!(child.assign("count", Value::int(5, 1)));
        assert_eq!(int_of(&parent.lookup("count").unwrap()), 5);
    }

    #[test]
    fn test_assign_to_unbound_name_fails() {
        let child = Environment::enclosed(Environment::new());
        assert!(!child.assign("nowhere", Value::int(1, 1)));
    }

    #[test]
    fn test_lookup_walks_several_levels() {
        let grandparent = Environment::new();
        grandparent.define("a", Value::int(1, 1));
        let parent = Environment::enclosed(grandparent);
        parent.define("b", Value::int(2, 1));
        let child = Environment::enclosed(parent);
        child.define("c", Value::int(3, 1));
        assert_eq!(int_of(&child.lookup("a").unwrap()), 1);
        assert_eq!(int_of(&child.lookup("b").unwrap()), 2);
        assert_eq!(int_of(&child.lookup("c").unwrap()), 3);
    }
}
