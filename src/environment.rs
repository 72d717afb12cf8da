use crate::types::{Symbol, Value};
use itertools::Itertools;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug)]
pub struct UndefinedVariable(pub Symbol);

/// One frame of a lexical scope chain. Frames are shared between every
/// closure and call that can see them, so bindings live behind a RefCell.
#[derive(Default)]
pub struct Environment {
    bindings: RefCell<HashMap<Symbol, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn root() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn spawn_from(parent: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        })
    }

    /// Binds in this frame only, replacing any existing binding here.
    pub fn define<T>(&self, key: T, value: Value)
    where
        T: Into<Symbol>,
    {
        self.bindings.borrow_mut().insert(key.into(), value);
    }

    pub fn lookup(&self, key: &str) -> Option<Value> {
        let mut env = self;
        loop {
            if let Some(value) = env.bindings.borrow().get(key) {
                return Some(value.clone());
            }
            env = env.parent.as_deref()?;
        }
    }

    /// Rebinds `key` in the nearest frame that already holds it.
    pub fn set(&self, key: &Symbol, value: Value) -> Result<(), UndefinedVariable> {
        let mut env = self;
        loop {
            if let Some(slot) = env.bindings.borrow_mut().get_mut(key.0.as_str()) {
                *slot = value;
                return Ok(());
            }
            env = match env.parent.as_deref() {
                Some(parent) => parent,
                None => return Err(UndefinedVariable(key.clone())),
            };
        }
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.bindings.borrow().contains_key(key)
    }
}

impl fmt::Debug for Environment {
    // Only the names: values may be closures that point back at this frame.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Environment{{{}}}",
            self.bindings.borrow().keys().sorted_by(|a, b| a.0.cmp(&b.0)).join(" ")
        )?;
        if let Some(parent) = &self.parent {
            write!(f, " -> {:?}", parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_the_parent_chain() {
        let root = Environment::root();
        root.define("x", Value::integer(1));
        let child = Environment::spawn_from(&root);
        assert_eq!(child.lookup("x"), Some(Value::integer(1)));
        assert_eq!(child.lookup("y"), None);
    }

    #[test]
    fn define_shadows_without_touching_the_parent() {
        let root = Environment::root();
        root.define("x", Value::integer(1));
        let child = Environment::spawn_from(&root);
        child.define("x", Value::integer(2));
        assert_eq!(child.lookup("x"), Some(Value::integer(2)));
        assert_eq!(root.lookup("x"), Some(Value::integer(1)));
    }

    #[test]
    fn set_updates_the_nearest_binding() {
        let root = Environment::root();
        root.define("x", Value::integer(1));
        let child = Environment::spawn_from(&root);
        child.set(&Symbol::from("x"), Value::integer(5)).unwrap();
        assert_eq!(root.lookup("x"), Some(Value::integer(5)));
        assert!(!child.contains("x"));
    }

    #[test]
    fn set_of_an_unbound_name_fails() {
        let root = Environment::root();
        let child = Environment::spawn_from(&root);
        let err = child.set(&Symbol::from("nope"), Value::Nil).unwrap_err();
        assert_eq!(err.0, Symbol::from("nope"));
        assert!(!root.contains("nope"));
    }
}
