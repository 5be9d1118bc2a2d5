//! Runtime scopes for local variables.
//!
//! The resolver assigns every local a slot in declaration order, so a frame
//! is just a `Vec` and a lookup is "walk `distance` parents, index `slot`".
//! Globals never live here; the interpreter keeps them in a name map.

use std::cell::RefCell;
use std::rc::Rc;

use log::trace;

use crate::value::Value;

/// Shared handle to a frame. Closures keep their defining frame alive.
pub type Env = Rc<RefCell<Environment>>;

#[derive(Debug)]
pub struct Environment {
    values: Vec<Value>,
    enclosing: Option<Env>,
}

impl Environment {
    /// A fresh frame whose parent is `enclosing` (`None` means the parent is
    /// the global scope).
    pub fn with_enclosing(enclosing: Option<Env>) -> Env {
        Rc::new(RefCell::new(Environment {
            values: Vec::new(),
            enclosing,
        }))
    }

    /// Append a value in the next slot.
    pub fn define(&mut self, value: Value) {
        trace!("Defining slot {} = {}", self.values.len(), value);

        self.values.push(value);
    }

    /// The frame `distance` hops up the chain, if the chain is that long.
    pub fn ancestor(env: &Env, distance: usize) -> Option<Env> {
        let mut frame: Env = Rc::clone(env);

        for _ in 0..distance {
            let parent: Env = frame.borrow().enclosing.clone()?;
            frame = parent;
        }

        Some(frame)
    }

    pub fn get_at(env: &Env, distance: usize, slot: usize) -> Option<Value> {
        let frame: Env = Self::ancestor(env, distance)?;
        let value: Option<Value> = frame.borrow().values.get(slot).cloned();
        value
    }

    /// Overwrite an existing slot. Returns `false` when the slot is missing.
    pub fn assign_at(env: &Env, distance: usize, slot: usize, value: Value) -> bool {
        let Some(frame) = Self::ancestor(env, distance) else {
            return false;
        };

        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(slot) {
            Some(existing) => {
                *existing = value;
                true
            }
            None => false,
        }
    }
}
