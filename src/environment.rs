use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope.  Closures keep their defining scope alive
/// through this handle.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: its own bindings plus a link to the enclosing scope
/// (`None` for globals).
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap `self` in a shared handle.
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Bind `name` in this scope, replacing any previous binding here.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup through the whole chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Assign to the nearest existing binding.  Returns `false` when the
    /// name is bound nowhere in the chain.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }

    /// Reads `name` from this scope only.
    pub fn get_here(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

/// Walk exactly `distance` links up from `env`.
pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
    let mut current: EnvRef = Rc::clone(env);

    for _ in 0..distance {
        let next: EnvRef = current.borrow().enclosing()?;
        current = next;
    }

    Some(current)
}

/// Read `name` from the scope exactly `distance` links up.
pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
    ancestor(env, distance)?.borrow().get_here(name)
}

/// Write `name` into the scope exactly `distance` links up.
pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) -> bool {
    match ancestor(env, distance) {
        Some(scope) => {
            scope.borrow_mut().define(name, value);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_fall_through_to_enclosing_scopes() {
        let globals: EnvRef = Environment::new().into_ref();
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner: EnvRef = Environment::with_enclosing(Rc::clone(&globals)).into_ref();

        assert_eq!(inner.borrow().get("a"), Some(Value::Number(1.0)));
        assert_eq!(inner.borrow().get("b"), None);
    }

    #[test]
    fn assign_updates_nearest_binding_only() {
        let globals: EnvRef = Environment::new().into_ref();
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner: EnvRef = Environment::with_enclosing(Rc::clone(&globals)).into_ref();
        inner.borrow_mut().define("a", Value::Number(2.0));

        assert!(inner.borrow_mut().assign("a", Value::Number(3.0)));
        assert_eq!(globals.borrow().get("a"), Some(Value::Number(1.0)));
        assert_eq!(inner.borrow().get("a"), Some(Value::Number(3.0)));
        assert!(!inner.borrow_mut().assign("missing", Value::Nil));
    }

    #[test]
    fn distance_addressing_skips_shadowing_scopes() {
        let outer: EnvRef = Environment::new().into_ref();
        outer.borrow_mut().define("x", Value::Number(1.0));

        let middle: EnvRef = Environment::with_enclosing(Rc::clone(&outer)).into_ref();
        middle.borrow_mut().define("x", Value::Number(2.0));

        let inner: EnvRef = Environment::with_enclosing(Rc::clone(&middle)).into_ref();

        assert_eq!(get_at(&inner, 2, "x"), Some(Value::Number(1.0)));
        assert_eq!(get_at(&inner, 1, "x"), Some(Value::Number(2.0)));
        assert_eq!(get_at(&inner, 0, "x"), None);

        assert!(assign_at(&inner, 2, "x", Value::Bool(true)));
        assert_eq!(outer.borrow().get("x"), Some(Value::Bool(true)));
        assert!(ancestor(&inner, 3).is_none());
    }
}
