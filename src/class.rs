//! Classes, metaclasses and instances.
//!
//! Every user class owns a metaclass holding its `class` methods. The
//! metaclass of a subclass inherits from the metaclass of its superclass, so
//! class methods are inherited the same way instance methods are. Class
//! objects also carry their own field table (`Point.origin = ...`).

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use log::debug;

use crate::callable::{Callable, Function};
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

pub struct Class {
    pub name: String,
    superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<Function>>,
    metaclass: Option<Rc<Class>>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<Function>>,
        metaclass: Option<Rc<Class>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
            metaclass,
            fields: RefCell::new(HashMap::new()),
        }
    }

    /// Own methods first, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// `None` only for metaclasses themselves.
    pub fn metaclass(&self) -> Option<&Rc<Class>> {
        self.metaclass.as_ref()
    }

    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    pub fn set_field(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

impl Callable for Rc<Class> {
    /// Arity of `init`, or zero without one.
    fn arity(&self) -> usize {
        self.find_method("init")
            .map_or(0, |initializer| initializer.arity())
    }

    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value> {
        debug!("Instantiating class '{}'", self.name);

        let instance: Rc<Instance> = Rc::new(Instance::new(Rc::clone(self)));

        if let Some(initializer) = self.find_method("init") {
            initializer
                .bind(Value::Instance(Rc::clone(&instance)))
                .call(interpreter, arguments, paren)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();

        f.debug_struct("Class")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|s| &s.name))
            .field("methods", &methods)
            .finish_non_exhaustive()
    }
}

pub struct Instance {
    pub class: Rc<Class>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    pub fn set_field(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

// Fields may point back at the instance.
impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.fields.borrow();
        let mut names: Vec<&String> = fields.keys().collect();
        names.sort();

        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &names)
            .finish()
    }
}
