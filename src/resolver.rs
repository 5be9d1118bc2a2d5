//! Static resolver pass for the **Olox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes, giving every local a slot in declaration order.
//! 2. Report static errors (redeclaration, forward‑read in initializer,
//!    invalid `return`, `this`/`super` misuse) and warn about locals that are
//!    never read.
//! 3. Tell the interpreter, for *each* local variable occurrence, how many
//!    scopes up it lives and in which slot. Occurrences it says nothing about
//!    are globals.

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, NamedFunction, Stmt};
use crate::diagnostics::Reporter;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::token::{Token, TokenType};

/// What kind of function body we are in. Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// Used to validate `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum VariableState {
    Declared,
    Defined,
    Read,
}

#[derive(Debug)]
struct Variable {
    name: Token,
    state: VariableState,
    slot: usize,
}

type Scope = HashMap<String, Variable>;

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// locations by calling back into the interpreter.
pub struct Resolver<'a, W: Write> {
    interpreter: &'a mut Interpreter<W>,
    reporter: &'a mut Reporter,
    scopes: Vec<Scope>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a, W: Write> Resolver<'a, W> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'a mut Interpreter<W>, reporter: &'a mut Reporter) -> Self {
        info!("Resolver instantiated");

        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements. Problems go to the reporter.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ───────────────────────── statements ─────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(NamedFunction { name, function }) => {
                // The name is visible inside its own body.
                self.declare(name);
                self.define(name);
                self.resolve_function(function, FunctionType::Function);
            }

            Stmt::Class {
                name,
                superclass,
                methods,
                class_methods,
            } => self.resolve_class(name, superclass.as_ref(), methods, class_methods),

            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Break(_) => {}

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }

                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }

                    self.resolve_expr(value);
                }
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[NamedFunction],
        class_methods: &[NamedFunction],
    ) {
        debug!("Resolving class '{}'", name.lexeme);

        let enclosing_class: ClassType = std::mem::replace(&mut self.current_class, ClassType::Class);

        self.declare(name);
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable {
                name: superclass_name,
                ..
            } = superclass
            {
                if superclass_name.lexeme == name.lexeme {
                    self.error(superclass_name, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.define_implicit(TokenType::SUPER, "super", name.line);
        }

        self.begin_scope();
        self.define_implicit(TokenType::THIS, "this", name.line);
        for method in methods {
            let kind: FunctionType = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(&method.function, kind);
        }
        self.end_scope();

        // Class methods get their own `this` (the class object), a sibling of
        // the instance one, so both sit at the same depth at runtime.
        self.begin_scope();
        self.define_implicit(TokenType::THIS, "this", name.line);
        for method in class_methods {
            self.resolve_function(&method.function, FunctionType::Method);
        }
        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_function(&mut self, function: &Rc<FunctionDecl>, kind: FunctionType) {
        let enclosing_function: FunctionType = std::mem::replace(&mut self.current_function, kind);

        self.begin_scope();
        for param in function.params.iter().flatten() {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&function.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    // ───────────────────────── expressions ────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Variable { id, name } => {
                let declared_only: bool = self
                    .scopes
                    .last()
                    .and_then(|scope| scope.get(&name.lexeme))
                    .is_some_and(|variable| variable.state == VariableState::Declared);

                if declared_only {
                    self.error(name, "Can't read local variable in its own initializer.");
                }

                self.resolve_local(*id, name, true);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name, false);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword, true);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword, "Can't use 'super' outside of a class.");
                    }
                    ClassType::Class => {
                        self.error(keyword, "Can't use 'super' in a class with no superclass.");
                    }
                    ClassType::Subclass => {}
                }

                self.resolve_local(*id, keyword, true);
            }

            Expr::Function(function) => self.resolve_function(function, FunctionType::Function),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Literal(_) => {}
        }
    }

    // ───────────────────────── scopes ─────────────────────────────

    fn begin_scope(&mut self) {
        debug!("Begin scope (depth {})", self.scopes.len() + 1);

        self.scopes.push(Scope::new());
    }

    /// Pops the innermost scope, warning about locals nobody read.
    fn end_scope(&mut self) {
        debug!("End scope (depth {})", self.scopes.len());

        let Some(scope) = self.scopes.pop() else {
            return;
        };

        let mut unused: Vec<Variable> = scope
            .into_values()
            .filter(|variable| variable.state != VariableState::Read)
            .collect();
        unused.sort_by_key(|variable| variable.slot);

        for variable in unused {
            self.reporter
                .report(LoxError::warning(&variable.name, "Local variable is never used."));
        }
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }

        let slot: usize = scope.len();
        scope.insert(
            name.lexeme.clone(),
            Variable {
                name: name.clone(),
                state: VariableState::Declared,
                slot,
            },
        );
    }

    fn define(&mut self, name: &Token) {
        if let Some(variable) = self
            .scopes
            .last_mut()
            .and_then(|scope| scope.get_mut(&name.lexeme))
        {
            if variable.state == VariableState::Declared {
                variable.state = VariableState::Defined;
            }
        }
    }

    /// `this` / `super`: slot 0 of a scope of their own, never warned about.
    fn define_implicit(&mut self, token_type: TokenType, lexeme: &str, line: usize) {
        if let Some(scope) = self.scopes.last_mut() {
            let slot: usize = scope.len();
            scope.insert(
                lexeme.to_string(),
                Variable {
                    name: Token::new(token_type, lexeme, line),
                    state: VariableState::Read,
                    slot,
                },
            );
        }
    }

    /// Finds the innermost scope declaring `name` and records its location.
    /// Not found means global; nothing is recorded.
    fn resolve_local(&mut self, id: ExprId, name: &Token, is_read: bool) {
        for (distance, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(variable) = scope.get_mut(&name.lexeme) {
                if is_read {
                    variable.state = VariableState::Read;
                }

                self.interpreter.resolve(id, distance, variable.slot);
                return;
            }
        }

        debug!("'{}' left unresolved (global)", name.lexeme);
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.reporter.report(LoxError::resolve(token, message));
    }
}
