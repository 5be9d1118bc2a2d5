//! Things that can appear to the left of `(`: user functions, the native
//! `clock`, and classes (see [`crate::class`]).

use std::fmt;
use std::io::Write;
use std::rc::Rc;
use std::sync::OnceLock;
use std::time::Instant;

use log::debug;

use crate::ast::FunctionDecl;
use crate::environment::{Env, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;
use crate::value::Value;

pub trait Callable {
    fn arity(&self) -> usize;

    /// Invoke with already-evaluated arguments. The caller has checked the
    /// argument count against [`Callable::arity`].
    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value>;
}

// ───────────────────────── user functions ─────────────────────────

/// A function value: a declaration plus the frame it closed over.
pub struct Function {
    name: Option<String>,
    declaration: Rc<FunctionDecl>,
    closure: Option<Env>,
    is_initializer: bool,
}

impl Function {
    pub fn new(
        name: Option<String>,
        declaration: Rc<FunctionDecl>,
        closure: Option<Env>,
        is_initializer: bool,
    ) -> Self {
        Self {
            name,
            declaration,
            closure,
            is_initializer,
        }
    }

    /// `None` for anonymous functions.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_getter(&self) -> bool {
        self.declaration.is_getter()
    }

    /// A copy of this method whose closure has `this` in slot 0 of a new
    /// frame.
    pub fn bind(&self, this: Value) -> Function {
        let frame: Env = Environment::with_enclosing(self.closure.clone());
        frame.borrow_mut().define(this);

        Function {
            name: self.name.clone(),
            declaration: Rc::clone(&self.declaration),
            closure: Some(frame),
            is_initializer: self.is_initializer,
        }
    }

    fn bound_this(&self) -> Value {
        self.closure
            .as_ref()
            .and_then(|env| Environment::get_at(env, 0, 0))
            .unwrap_or(Value::Nil)
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.arity()
    }

    fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
        _paren: &Token,
    ) -> Result<Value> {
        debug!("Calling <fn {}>", self.name.as_deref().unwrap_or(""));

        let frame: Env = Environment::with_enclosing(self.closure.clone());
        {
            let mut frame = frame.borrow_mut();
            for argument in arguments {
                frame.define(argument);
            }
        }

        let flow: Flow = interpreter.execute_block(&self.declaration.body, frame)?;

        if self.is_initializer {
            return Ok(self.bound_this());
        }

        match flow {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Nil),
        }
    }
}

// The closure can reach this function again through its own frame.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.declaration.arity())
            .field("is_initializer", &self.is_initializer)
            .finish_non_exhaustive()
    }
}

// ───────────────────────── native functions ───────────────────────

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// A builtin implemented in Rust.
pub struct NativeFunction {
    pub name: &'static str,
    arity: usize,
    func: fn(&[Value]) -> std::result::Result<Value, String>,
}

impl NativeFunction {
    /// `clock()`: seconds since the first interpreter in this process was
    /// created. Monotonic.
    pub fn clock() -> Self {
        EPOCH.get_or_init(Instant::now);

        Self {
            name: "clock",
            arity: 0,
            func: |_args: &[Value]| {
                let epoch: &Instant = EPOCH.get_or_init(Instant::now);

                Ok(Value::Number(epoch.elapsed().as_secs_f64()))
            },
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}/{}>", self.name, self.arity)
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call<W: Write>(
        &self,
        _interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(&arguments).map_err(|message: String| LoxError::runtime(paren, message))
    }
}
