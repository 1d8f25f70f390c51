//! Runtime scope frames.
//!
//! A frame maps names to values and links to at most one enclosing frame.
//! Frames are shared (`Rc<RefCell<_>>`): every closure created in a frame
//! keeps it alive, and writes through any holder are seen by all of them.
//! Frames only point outward, so the chains never form cycles.

use crate::value::Value;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a frame.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// Fresh frame wrapped for sharing.
    pub fn shared(enclosing: Option<EnvRef>) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing,
        }))
    }

    /// Bind (or rebind) `name` in this frame.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define {} = {}", name, value);

        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this frame only.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Overwrite an existing binding in this frame only.  Returns `false`
    /// when the name is not bound here.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// The frame `distance` enclosing links away from `env`.
    pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
        let mut current: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next = current.borrow().enclosing.clone()?;
            current = next;
        }

        Some(current)
    }

    /// Read `name` from the frame exactly `distance` links away.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
        let frame = Self::ancestor(env, distance)?;
        let value = frame.borrow().get(name);
        value
    }

    /// Write `name` in the frame exactly `distance` links away.  Returns
    /// `false` if that frame does not exist or does not bind `name`.
    pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) -> bool {
        match Self::ancestor(env, distance) {
            Some(frame) => frame.borrow_mut().assign(name, value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_at_walks_enclosing_links() {
        let global = Environment::shared(None);
        global.borrow_mut().define("a", Value::Number(1.0));

        let middle = Environment::shared(Some(Rc::clone(&global)));
        middle.borrow_mut().define("a", Value::Number(2.0));

        let inner = Environment::shared(Some(Rc::clone(&middle)));

        assert_eq!(Environment::get_at(&inner, 1, "a"), Some(Value::Number(2.0)));
        assert_eq!(Environment::get_at(&inner, 2, "a"), Some(Value::Number(1.0)));
        assert_eq!(Environment::get_at(&inner, 0, "a"), None);
        assert_eq!(Environment::get_at(&inner, 3, "a"), None);
    }

    #[test]
    fn assign_at_mutates_the_shared_frame() {
        let outer = Environment::shared(None);
        outer.borrow_mut().define("count", Value::Number(0.0));

        let first = Environment::shared(Some(Rc::clone(&outer)));
        let second = Environment::shared(Some(Rc::clone(&outer)));

        assert!(Environment::assign_at(&first, 1, "count", Value::Number(5.0)));
        assert_eq!(Environment::get_at(&second, 1, "count"), Some(Value::Number(5.0)));
        assert!(!Environment::assign_at(&first, 0, "count", Value::Nil));
    }
}
