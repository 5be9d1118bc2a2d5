//! Tree-walking evaluator.
//!
//! The interpreter writes program output to any `W: Write` so tests can
//! capture it in a `Vec<u8>`. Local variables are found through the
//! `(distance, slot)` bindings the resolver registers by [`ExprId`];
//! anything unbound is a global.

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, NamedFunction, Stmt};
use crate::callable::{Callable, Function, NativeFunction};
use crate::class::Class;
use crate::diagnostics::Reporter;
use crate::environment::{Env, Environment};
use crate::error::{LoxError, Result};
use crate::session::RunMode;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    /// Unwinds to the innermost `while`.
    Break,
    /// Unwinds to the innermost call.
    Return(Value),
}

/// Where a resolved local lives at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub distance: usize,
    pub slot: usize,
}

pub struct Interpreter<W: Write> {
    out: W,
    globals: HashMap<String, Value>,
    /// `None` at top level, where definitions go to `globals`.
    environment: Option<Env>,
    locals: HashMap<ExprId, Binding>,
    mode: RunMode,
    /// Set only while a statement typed directly at the prompt starts.
    echo_next: bool,
}

impl<W: Write> Interpreter<W> {
    /// Creates a new Interpreter and defines native functions such as `clock`.
    pub fn new(out: W) -> Self {
        info!("Initializing Interpreter");

        let mut globals: HashMap<String, Value> = HashMap::new();

        debug!("Defining native function 'clock'");
        globals.insert(
            "clock".to_string(),
            Value::Native(Rc::new(NativeFunction::clock())),
        );

        Self {
            out,
            globals,
            environment: None,
            locals: HashMap::new(),
            mode: RunMode::File,
            echo_next: false,
        }
    }

    pub fn set_mode(&mut self, mode: RunMode) {
        self.mode = mode;
    }

    /// Called by the resolver for every local variable reference.
    pub fn resolve(&mut self, id: ExprId, distance: usize, slot: usize) {
        debug!("Binding expression {} to ({}, {})", id, distance, slot);

        self.locals.insert(id, Binding { distance, slot });
    }

    pub fn binding(&self, id: ExprId) -> Option<Binding> {
        self.locals.get(&id).copied()
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs a program. The first runtime error is reported and stops
    /// execution; globals defined before it stay defined.
    pub fn interpret(&mut self, statements: &[Stmt], reporter: &mut Reporter) {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.echo_next = self.mode == RunMode::Repl;

            if let Err(error) = self.execute(stmt) {
                info!("Interpretation stopped by runtime error");
                self.environment = None;
                reporter.report(error);
                return;
            }
        }

        info!("Interpretation completed successfully");
    }

    // ───────────────────────── statements ─────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        // Nested statements and function bodies never see the flag.
        let echo: bool = std::mem::take(&mut self.echo_next);

        match stmt {
            Stmt::Expression(expr) => {
                let value: Value = self.evaluate(expr)?;

                if echo && value != Value::Nil {
                    writeln!(self.out, "{}", value)?;
                }

                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => {
                        let value: Value = self.evaluate(expr)?;
                        if echo {
                            writeln!(self.out, "{} = {}", name.lexeme, value)?;
                        }
                        value
                    }
                    None => Value::Nil,
                };

                debug!("Variable '{}' defined with value: {}", name.lexeme, value);
                self.define(name, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let frame: Env = Environment::with_enclosing(self.environment.clone());
                self.execute_block(statements, frame)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Break(_) => Ok(Flow::Break),

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }

            Stmt::Function(NamedFunction { name, function }) => {
                let function: Function = Function::new(
                    Some(name.lexeme.clone()),
                    Rc::clone(function),
                    self.environment.clone(),
                    false,
                );

                self.define(name, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Class {
                name,
                superclass,
                methods,
                class_methods,
            } => self.execute_class(name, superclass.as_ref(), methods, class_methods),
        }
    }

    /// Runs `statements` in `frame`, restoring the previous frame on every
    /// exit path.
    pub(crate) fn execute_block(&mut self, statements: &[Stmt], frame: Env) -> Result<Flow> {
        let previous: Option<Env> = self.environment.replace(frame);

        let mut result: Result<Flow> = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[NamedFunction],
        class_methods: &[NamedFunction],
    ) -> Result<Flow> {
        debug!("Declaring class '{}'", name.lexeme);

        let superclass: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let at: &Token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };
                    return Err(LoxError::runtime(at, "Superclass must be a class."));
                }
            },
            None => None,
        };

        let enclosing: Option<Env> = self.environment.clone();

        if let Some(superclass) = &superclass {
            let frame: Env = Environment::with_enclosing(self.environment.clone());
            frame
                .borrow_mut()
                .define(Value::Class(Rc::clone(superclass)));
            self.environment = Some(frame);
        }

        let metaclass: Class = Class::new(
            format!("{} metaclass", name.lexeme),
            superclass
                .as_ref()
                .and_then(|superclass| superclass.metaclass().cloned()),
            self.method_table(class_methods, false),
            None,
        );

        let class: Class = Class::new(
            name.lexeme.clone(),
            superclass,
            self.method_table(methods, true),
            Some(Rc::new(metaclass)),
        );

        self.environment = enclosing;
        self.define(name, Value::Class(Rc::new(class)));

        Ok(Flow::Normal)
    }

    fn method_table(
        &self,
        methods: &[NamedFunction],
        allow_initializer: bool,
    ) -> HashMap<String, Rc<Function>> {
        methods
            .iter()
            .map(|method: &NamedFunction| {
                let name: &str = &method.name.lexeme;
                let function: Function = Function::new(
                    Some(name.to_string()),
                    Rc::clone(&method.function),
                    self.environment.clone(),
                    allow_initializer && name == "init",
                );

                (name.to_string(), Rc::new(function))
            })
            .collect()
    }

    // ───────────────────────── expressions ────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;
                self.assign_variable(*id, name, value.clone())?;
                Ok(value)
            }

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
                    },
                    _ => Ok(Value::Bool(!right.is_truthy())),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let decided: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => {
                let object: Value = self.evaluate(object)?;
                self.get_property(object, name)
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        let value: Value = self.evaluate(value)?;
                        instance.set_field(&name.lexeme, value.clone());
                        Ok(value)
                    }
                    Value::Class(class) => {
                        let value: Value = self.evaluate(value)?;
                        class.set_field(&name.lexeme, value.clone());
                        Ok(value)
                    }
                    _ => Err(LoxError::runtime(name, "Only instances have fields.")),
                }
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::Function(declaration) => {
                let function: Function = Function::new(
                    None,
                    Rc::clone(declaration),
                    self.environment.clone(),
                    false,
                );

                Ok(Value::Function(Rc::new(function)))
            }
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        if operator.token_type == TokenType::COMMA {
            return Ok(right);
        }

        let numbers = || match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
            _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
        };

        match operator.token_type {
            TokenType::PLUS => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(_), _) | (_, Value::String(_)) => {
                    Ok(Value::String(format!("{}{}", left, right)))
                }
                _ => Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => numbers().map(|(a, b)| Value::Number(a - b)),

            TokenType::STAR => numbers().map(|(a, b)| Value::Number(a * b)),

            TokenType::SLASH => {
                let (a, b) = numbers()?;
                if b == 0.0 {
                    return Err(LoxError::runtime(
                        operator,
                        "Arithmetic Error: Division by Zero",
                    ));
                }
                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => numbers().map(|(a, b)| Value::Bool(a > b)),
            TokenType::GREATER_EQUAL => numbers().map(|(a, b)| Value::Bool(a >= b)),
            TokenType::LESS => numbers().map(|(a, b)| Value::Bool(a < b)),
            TokenType::LESS_EQUAL => numbers().map(|(a, b)| Value::Bool(a <= b)),

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => Err(LoxError::runtime(operator, "Unknown binary operator.")),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value> {
        let callee: Value = self.evaluate(callee)?;

        let arity: usize = match &callee {
            Value::Function(function) => function.arity(),
            Value::Native(native) => native.arity(),
            Value::Class(class) => class.arity(),
            _ => {
                return Err(LoxError::runtime(
                    paren,
                    "Only functions and classes are callable.",
                ))
            }
        };

        let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
        for argument in arguments {
            values.push(self.evaluate(argument)?);
        }

        if values.len() != arity {
            return Err(LoxError::runtime(
                paren,
                format!("Expected {} arguments but got {}.", arity, values.len()),
            ));
        }

        match callee {
            Value::Function(function) => function.call(self, values, paren),
            Value::Native(native) => native.call(self, values, paren),
            Value::Class(class) => class.call(self, values, paren),
            _ => Err(LoxError::runtime(
                paren,
                "Only functions and classes are callable.",
            )),
        }
    }

    fn get_property(&mut self, object: Value, name: &Token) -> Result<Value> {
        match &object {
            Value::Instance(instance) => {
                if let Some(value) = instance.get_field(&name.lexeme) {
                    return Ok(value);
                }

                match instance.class.find_method(&name.lexeme) {
                    Some(method) => self.bind_method(&method, object.clone(), name),
                    None => Err(undefined_property(name)),
                }
            }

            Value::Class(class) => {
                if let Some(value) = class.get_field(&name.lexeme) {
                    return Ok(value);
                }

                let method: Option<Rc<Function>> = class
                    .metaclass()
                    .and_then(|metaclass| metaclass.find_method(&name.lexeme));

                match method {
                    Some(method) => self.bind_method(&method, object.clone(), name),
                    None => Err(undefined_property(name)),
                }
            }

            _ => Err(LoxError::runtime(name, "Only instances have properties.")),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let unbound = || LoxError::runtime(keyword, "Undefined variable 'super'.");

        let Binding { distance, slot } = self.binding(id).ok_or_else(unbound)?;
        let frame: Env = self.environment.clone().ok_or_else(unbound)?;

        let superclass: Option<Value> = Environment::get_at(&frame, distance, slot);
        let object: Option<Value> = distance
            .checked_sub(1)
            .and_then(|distance| Environment::get_at(&frame, distance, 0));

        let (Some(Value::Class(superclass)), Some(object)) = (superclass, object) else {
            return Err(unbound());
        };

        let found: Option<Rc<Function>> = match object {
            Value::Class(_) => superclass
                .metaclass()
                .and_then(|metaclass| metaclass.find_method(&method.lexeme)),
            _ => superclass.find_method(&method.lexeme),
        };

        match found {
            Some(found) => self.bind_method(&found, object, method),
            None => Err(undefined_property(method)),
        }
    }

    /// Binds `this`; getters run immediately and yield their result.
    fn bind_method(&mut self, method: &Function, this: Value, name: &Token) -> Result<Value> {
        let bound: Function = method.bind(this);

        if bound.is_getter() {
            debug!("Invoking getter '{}'", name.lexeme);
            return bound.call(self, Vec::new(), name);
        }

        Ok(Value::Function(Rc::new(bound)))
    }

    // ───────────────────────── variables ──────────────────────────

    fn define(&mut self, name: &Token, value: Value) {
        match &self.environment {
            Some(frame) => frame.borrow_mut().define(value),
            None => {
                self.globals.insert(name.lexeme.clone(), value);
            }
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        let value: Option<Value> = match self.binding(id) {
            Some(Binding { distance, slot }) => self
                .environment
                .as_ref()
                .and_then(|frame| Environment::get_at(frame, distance, slot)),
            None => self.globals.get(&name.lexeme).cloned(),
        };

        value.ok_or_else(|| undefined_variable(name))
    }

    fn assign_variable(&mut self, id: ExprId, name: &Token, value: Value) -> Result<()> {
        let assigned: bool = match self.binding(id) {
            Some(Binding { distance, slot }) => match &self.environment {
                Some(frame) => Environment::assign_at(frame, distance, slot, value),
                None => false,
            },
            None => match self.globals.get_mut(&name.lexeme) {
                Some(existing) => {
                    *existing = value;
                    true
                }
                None => false,
            },
        };

        if assigned {
            Ok(())
        } else {
            Err(undefined_variable(name))
        }
    }
}

fn undefined_variable(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

fn undefined_property(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined property '{}'.", name.lexeme))
}
