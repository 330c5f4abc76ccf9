use std::{
    cell::RefCell,
    collections::{HashMap, hash_map::Entry},
    fmt,
    rc::Rc,
};

use crate::{Object, RuntimeError};

/// A lexical scope. Cloning yields another handle to the same scope; a scope
/// lives as long as any child scope or closure still holds it.
#[derive(Clone, Default)]
pub struct Environment {
    scope: Rc<Scope>,
}

#[derive(Default)]
struct Scope {
    values: RefCell<HashMap<String, Object>>,
    outer: Option<Environment>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh scope whose lookups fall back to `outer`.
    pub fn enclosed(outer: &Environment) -> Self {
        Environment {
            scope: Rc::new(Scope {
                values: RefCell::default(),
                outer: Some(outer.clone()),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        if let Some(value) = self.scope.values.borrow().get(name) {
            return Some(value.clone());
        }
        self.scope.outer.as_ref()?.get(name)
    }

    /// Binds `name` in this scope. Names are write-once per scope; shadowing
    /// from an enclosed scope is fine.
    pub fn define(&self, name: &str, value: Object) -> Result<(), RuntimeError> {
        match self.scope.values.borrow_mut().entry(name.to_string()) {
            Entry::Occupied(_) => Err(RuntimeError::AlreadyDefined {
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    pub fn is_defined_locally(&self, name: &str) -> bool {
        self.scope.values.borrow().contains_key(name)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.scope.values.borrow();
        let mut names: Vec<&String> = values.keys().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("outer", &self.scope.outer)
            .finish()
    }
}
