//! Abstract syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Nodes own their tokens. Function bodies sit behind an `Rc` so closures
//! created at runtime can keep them alive after the statement list that
//! declared them has been dropped (interactive sessions do exactly that).

use std::rc::Rc;

use crate::token::Token;

/// Identity of a variable-referencing expression (`Variable`, `Assign`,
/// `This`, `Super`). The resolver keys its side-table on it.
pub type ExprId = usize;

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

/// Parameters and body shared by function declarations, methods and
/// anonymous function expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// `None` marks a getter: a method declared without a parameter list.
    /// `Some(vec![])` is an ordinary function taking no arguments.
    pub params: Option<Vec<Token>>,

    pub body: Vec<Stmt>,
}

impl FunctionDecl {
    pub fn is_getter(&self) -> bool {
        self.params.is_none()
    }

    pub fn arity(&self) -> usize {
        self.params.as_ref().map_or(0, Vec::len)
    }
}

/// A function bound to a name: `fun` declarations and class methods.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedFunction {
    pub name: Token,
    pub function: Rc<FunctionDecl>,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Variable access.
    Variable { id: ExprId, name: Token },

    /// Assignment expression: `identifier "=" expression`.
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Prefix unary operator expression: `!isReady` or `-42`.
    Unary { operator: Token, right: Box<Expr> },

    /// Infix binary operator expression, including the comma operator.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    /// Function‑, method‑ or constructor‑call expression.
    Call {
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { id: ExprId, keyword: Token },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },

    /// Anonymous function: `fun (a, b) { … }`.
    Function(Rc<FunctionDecl>),
}

/// **Abstract‑Syntax‑Tree node** for *statements*. A program is a sequence
/// of these nodes returned by [`Parser::parse`](crate::parser::Parser::parse).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop. `for` loops are lowered into this by the parser.
    While { condition: Expr, body: Box<Stmt> },

    /// `break` keyword, kept for its line.
    Break(Token),

    /// `return` statement inside a function body.
    Return {
        keyword: Token,
        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    /// Function declaration.
    Function(NamedFunction),

    Class {
        name: Token,
        /// Always an [`Expr::Variable`] when present.
        superclass: Option<Expr>,
        methods: Vec<NamedFunction>,
        class_methods: Vec<NamedFunction>,
    },
}
