/*!
Recursive‑descent parser for Olox.

Grammar (EBNF, lowest precedence first)
--------------------------------------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | statement ;
classDecl      → "class" IDENT ( "<" IDENT )? "{" ( "class"? function )* "}" ;
funDecl        → "fun" function ;              (only when an IDENT follows "fun")
function       → IDENT funcBody ;
funcBody       → ( "(" parameters? ")" )? "{" declaration* "}" ;
parameters     → IDENT ( "," IDENT )* ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
statement      → exprStmt | forStmt | ifStmt | printStmt
               | returnStmt | whileStmt | breakStmt | block ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" )
                 expression? ";" expression? ")" statement ;
block          → "{" declaration* "}" ;
expression     → comma ;
comma          → ternary ( "," ternary )* ;
ternary        → assignment ( "?" comma ":" ternary )? ;
assignment     → ( call "." )? IDENT "=" assignment | logic_or ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → equality ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
arguments      → equality ( "," equality )* ;
primary        → NUMBER | STRING | IDENT | "true" | "false" | "nil"
               | "(" expression ")" | "super" "." IDENT | "this"
               | "fun" funcBody | error productions ;
```

Arguments parse at `equality` so the comma separates arguments instead of
being swallowed by the comma operator.

Error handling
--------------

Fatal errors (`consume` failures, a token that cannot start an expression)
travel back to `declaration` with `?`, get reported, and the parser
re‑synchronises at the next statement boundary. Errors that leave the parser
in a consistent state (invalid assignment target, `break` outside a loop,
too many parameters, binary operators with no left operand) are reported on
the spot and parsing simply continues.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |
| `synchronize`                | `debug`| Recovery after a reported error.          |
*/

use std::rc::Rc;

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, NamedFunction, Stmt};
use crate::diagnostics::Reporter;
use crate::error::{LoxError, Result};
use crate::session::RunMode;
use crate::token::{Token, TokenType};

use log::{debug, info};

/// What a `funcBody` belongs to. Only methods may omit the parameter list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionKind {
    Function,
    Method,
    Anonymous,
}

impl FunctionKind {
    fn label(self) -> &'static str {
        match self {
            FunctionKind::Function => "function name",
            FunctionKind::Method => "method name",
            FunctionKind::Anonymous => "'fun'",
        }
    }
}

/// Top‑level parser over an immutable slice of tokens. The slice must end
/// with an `EOF` token, as produced by [`scan_tokens`](crate::scanner::scan_tokens).
pub struct Parser<'t, 'r> {
    tokens: &'t [Token],
    current: usize,
    loop_depth: usize,
    mode: RunMode,
    next_id: ExprId,
    reporter: &'r mut Reporter,
}

impl<'t, 'r> Parser<'t, 'r> {
    /// Construct a new parser.
    pub fn new(tokens: &'t [Token], mode: RunMode, reporter: &'r mut Reporter) -> Self {
        info!("Parser created with {} tokens in {:?} mode", tokens.len(), mode);

        Self {
            tokens,
            current: 0,
            loop_depth: 0,
            mode,
            next_id: 0,
            reporter,
        }
    }

    /// Start numbering expressions at `first`. Sessions that parse several
    /// sources feed the previous parser's [`Self::next_id`] back in, so ids
    /// stay unique across the whole session.
    pub fn starting_at(mut self, first: ExprId) -> Self {
        self.next_id = first;
        self
    }

    /// First id not handed out yet.
    pub fn next_id(&self) -> ExprId {
        self.next_id
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program. Statements that failed to parse are left
    /// out; their diagnostics are in the reporter.
    pub fn parse(&mut self) -> Vec<Stmt> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!("Parsed {} top-level statements", statements.len());

        statements
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration at line {}", self.peek().line);

        let result = if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.check(TokenType::FUN) && self.check_next(TokenType::IDENTIFIER) {
            self.advance();
            self.function(FunctionKind::Function).map(Stmt::Function)
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.reporter.report(e);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expected class name.")?
            .clone();

        let superclass: Option<Expr> = if self.matches(TokenType::LESS) {
            let superclass_name: Token = self
                .consume(TokenType::IDENTIFIER, "Expected superclass name.")?
                .clone();

            Some(Expr::Variable {
                id: self.new_id(),
                name: superclass_name,
            })
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before class body.")?;

        let mut methods: Vec<NamedFunction> = Vec::new();
        let mut class_methods: Vec<NamedFunction> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            let is_class_method: bool = self.matches(TokenType::CLASS);
            let method: NamedFunction = self.function(FunctionKind::Method)?;

            if is_class_method {
                class_methods.push(method);
            } else {
                methods.push(method);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after class body.")?;

        debug!(
            "Parsed class '{}' with {} methods and {} class methods",
            name.lexeme,
            methods.len(),
            class_methods.len()
        );

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
            class_methods,
        })
    }

    fn function(&mut self, kind: FunctionKind) -> Result<NamedFunction> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, &format!("Expected {}.", kind.label()))?
            .clone();

        let function: FunctionDecl = self.function_body(kind)?;

        Ok(NamedFunction {
            name,
            function: Rc::new(function),
        })
    }

    /// `( "(" parameters? ")" )? "{" declaration* "}"`. A method whose name is
    /// followed directly by `{` is a getter and gets no parameter list.
    fn function_body(&mut self, kind: FunctionKind) -> Result<FunctionDecl> {
        let params: Option<Vec<Token>> =
            if kind != FunctionKind::Method || self.check(TokenType::LEFT_PAREN) {
                self.consume(
                    TokenType::LEFT_PAREN,
                    &format!("Expected '(' after {}.", kind.label()),
                )?;

                let mut params: Vec<Token> = Vec::new();

                if !self.check(TokenType::RIGHT_PAREN) {
                    loop {
                        if params.len() >= 255 {
                            let at: &Token = self.peek();
                            self.error(at, "Can't have more than 255 parameters.");
                        }

                        params.push(
                            self.consume(TokenType::IDENTIFIER, "Expected parameter name.")?
                                .clone(),
                        );

                        if !self.matches(TokenType::COMMA) {
                            break;
                        }
                    }
                }

                self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters.")?;

                Some(params)
            } else {
                None
            };

        let body_of: &str = match kind {
            FunctionKind::Method => "method",
            _ => "function",
        };
        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expected '{{' before {} body.", body_of),
        )?;

        // A loop around the declaration does not make `break` legal inside it.
        let enclosing_loops: usize = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.block();
        self.loop_depth = enclosing_loops;

        Ok(FunctionDecl { params, body: body? })
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expected variable name.")?
            .clone();

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expected ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        debug!("Entering statement at line {}", self.peek().line);

        if self.matches(TokenType::BREAK) {
            self.break_statement()
        } else if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    fn break_statement(&mut self) -> Result<Stmt> {
        let keyword: &Token = self.previous();

        if self.loop_depth == 0 {
            self.error(keyword, "Can't use 'break' outside of a loop.");
        }

        self.consume(TokenType::SEMICOLON, "Expected ';' after 'break'.")?;

        Ok(Stmt::Break(keyword.clone()))
    }

    /// `for (I; C; U) B` is lowered to `{ I; while (C) { B; U; } }`.
    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'for'.")?;

        let initializer: Option<Stmt> = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expected ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after for clauses.")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        let mut body: Stmt = body?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        body = Stmt::While {
            condition: condition.unwrap_or(Expr::Literal(LiteralValue::True)),
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after if condition.")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expected ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) && !self.is_at_end() {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expected ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after while condition.")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        Ok(Stmt::While {
            condition,
            body: Box::new(body?),
        })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expected ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block.")?;

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.comma()
    }

    fn comma(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.ternary()?;

        while self.matches(TokenType::COMMA) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.ternary()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn ternary(&mut self) -> Result<Expr> {
        let expr: Expr = self.assignment()?;

        if self.matches(TokenType::QUESTION) {
            let then_branch: Expr = self.comma()?;

            self.consume(
                TokenType::COLON,
                "Expected ':' after then branch of ternary expression.",
            )?;

            let else_branch: Expr = self.ternary()?;

            return Ok(Expr::Ternary {
                condition: Box::new(expr),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        Ok(expr)
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.logical_or()?;

        if self.matches(TokenType::EQUAL) {
            let equals: &Token = self.previous();
            let value: Expr = self.assignment()?;

            return match expr {
                Expr::Variable { id, name } => Ok(Expr::Assign {
                    id,
                    name,
                    value: Box::new(value),
                }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                }),

                other => {
                    self.error(equals, "Invalid assignment target.");
                    Ok(other)
                }
            };
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.comparison()?;

        while self.matches(TokenType::BANG_EQUAL) || self.matches(TokenType::EQUAL_EQUAL) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.comparison()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.term()?;

        while self.matches(TokenType::GREATER)
            || self.matches(TokenType::GREATER_EQUAL)
            || self.matches(TokenType::LESS)
            || self.matches(TokenType::LESS_EQUAL)
        {
            let operator: Token = self.previous().clone();
            let right: Expr = self.term()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.factor()?;

        while self.matches(TokenType::MINUS) || self.matches(TokenType::PLUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.factor()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.unary()?;

        while self.matches(TokenType::STAR) || self.matches(TokenType::SLASH) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Token = self
                    .consume(TokenType::IDENTIFIER, "Expected property name after '.'.")?
                    .clone();

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= 255 {
                    let at: &Token = self.peek();
                    self.error(at, "Can't have more than 255 arguments.");
                }

                arguments.push(self.equality()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self
            .consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments.")?
            .clone();

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Literal(LiteralValue::False));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Literal(LiteralValue::True));
        }
        if self.matches(TokenType::NIL) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if let TokenType::NUMBER(n) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Number(n)));
        }

        if let TokenType::STRING(ref s) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Str(s.clone())));
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable {
                id: self.new_id(),
                name: self.previous().clone(),
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        if self.matches(TokenType::SUPER) {
            let keyword: Token = self.previous().clone();
            self.consume(TokenType::DOT, "Expected '.' after 'super'.")?;
            let method: Token = self
                .consume(TokenType::IDENTIFIER, "Expected superclass method name.")?
                .clone();

            return Ok(Expr::Super {
                id: self.new_id(),
                keyword,
                method,
            });
        }

        if self.matches(TokenType::THIS) {
            return Ok(Expr::This {
                id: self.new_id(),
                keyword: self.previous().clone(),
            });
        }

        if self.matches(TokenType::FUN) {
            let function: FunctionDecl = self.function_body(FunctionKind::Anonymous)?;

            return Ok(Expr::Function(Rc::new(function)));
        }

        // ── error productions: a binary operator with no left operand ──
        if self.matches(TokenType::COMMA) {
            return self.missing_left_operand("Missing left-hand expression before ','.", Self::comma);
        }

        if self.matches(TokenType::QUESTION) || self.matches(TokenType::COLON) {
            return self.missing_left_operand("Missing condition in ternary expression.", Self::ternary);
        }

        if self.matches(TokenType::BANG_EQUAL) || self.matches(TokenType::EQUAL_EQUAL) {
            return self
                .missing_left_operand("Missing left-hand expression in equality.", Self::equality);
        }

        if self.matches(TokenType::GREATER)
            || self.matches(TokenType::GREATER_EQUAL)
            || self.matches(TokenType::LESS)
            || self.matches(TokenType::LESS_EQUAL)
        {
            return self.missing_left_operand(
                "Missing left-hand expression in comparison.",
                Self::comparison,
            );
        }

        if self.matches(TokenType::PLUS) {
            return self.missing_left_operand("Missing left-hand expression in addition.", Self::term);
        }

        if self.matches(TokenType::STAR) || self.matches(TokenType::SLASH) {
            return self.missing_left_operand(
                "Missing left-hand expression in multiplication or division.",
                Self::factor,
            );
        }

        Err(LoxError::parse(self.peek(), "Expected expression."))
    }

    /// Report the operator just consumed, parse and drop its right operand,
    /// and stand in a `nil` literal so parsing can go on.
    fn missing_left_operand(
        &mut self,
        message: &str,
        operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let operator: &Token = self.previous();
        self.error(operator, message);

        operand(self)?;

        Ok(Expr::Literal(LiteralValue::Nil))
    }

    // ────────────────────── utility helpers ───────────────────────

    #[inline(always)]
    fn new_id(&mut self) -> ExprId {
        let id: ExprId = self.next_id;
        self.next_id += 1;
        id
    }

    /// Report an error that does not need unwinding.
    fn error(&mut self, token: &Token, message: &str) {
        self.reporter.report(LoxError::parse(token, message));
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    /// In REPL mode a missing `;` is accepted without consuming anything.
    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'t Token> {
        if self.check(ttype.clone()) {
            return Ok(self.advance());
        }

        if self.mode == RunMode::Repl && ttype == TokenType::SEMICOLON {
            return Ok(self.peek());
        }

        Err(LoxError::parse(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    /// Look one token past the current one.
    fn check_next(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        match self.tokens.get(self.current + 1) {
            Some(token) => token.token_type == ttype,
            None => false,
        }
    }

    #[inline(always)]
    fn advance(&mut self) -> &'t Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.peek().is_eof()
    }

    #[inline(always)]
    fn peek(&self) -> &'t Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &'t Token {
        &self.tokens[self.current - 1]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        debug!("Synchronizing after parse error at line {}", self.peek().line);

        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }
}
