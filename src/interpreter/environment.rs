use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::value::Value;

/// One lexical scope. Frames are shared by reference: every closure defined
/// in a scope holds the same frame, so rebinding through one is visible to
/// all of them.
pub struct Environment {
    store: HashMap<String, Value>,
    outer: Option<Env>,
}

pub type Env = Rc<RefCell<Environment>>;

impl Environment {
    pub fn new() -> Env {
        Rc::new(RefCell::new(Self {
            store: HashMap::new(),
            outer: None,
        }))
    }

    pub fn new_enclosed(outer: Env) -> Env {
        Rc::new(RefCell::new(Self {
            store: HashMap::new(),
            outer: Some(outer),
        }))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match self.store.get(name) {
            Some(value) => Some(value.clone()),
            None => match &self.outer {
                Some(outer) => outer.borrow().get(name),
                None => None,
            },
        }
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.store.insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_frame_shadows_outer() {
        let outer = Environment::new();
        outer.borrow_mut().set("x", Value::Integer(1));
        outer.borrow_mut().set("y", Value::Integer(2));

        let inner = Environment::new_enclosed(outer.clone());
        inner.borrow_mut().set("x", Value::Integer(10));

        assert_eq!(inner.borrow().get("x").unwrap().inspect(), "10");
        assert_eq!(inner.borrow().get("y").unwrap().inspect(), "2");
        assert_eq!(outer.borrow().get("x").unwrap().inspect(), "1");
        assert!(inner.borrow().get("z").is_none());
    }

    #[test]
    fn set_writes_into_the_current_frame_only() {
        let outer = Environment::new();
        outer.borrow_mut().set("x", Value::Integer(1));

        let inner = Environment::new_enclosed(outer.clone());
        inner.borrow_mut().set("x", Value::Integer(5));

        assert_eq!(outer.borrow().get("x").unwrap().inspect(), "1");
    }
}
