//! One interpreter plus its diagnostics, fed one source text at a time.
//!
//! A file run feeds a single source; the REPL feeds one line per call and
//! keeps globals between them. Each run goes scan → parse → resolve →
//! interpret and stops after the first stage that raised a build error.

use std::io::Write;

use log::info;

use crate::ast::{ExprId, Stmt};
use crate::diagnostics::Reporter;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;
use crate::token::Token;

/// Whether a program comes from a file or an interactive prompt. REPL mode
/// tolerates a missing trailing `;` and echoes top-level results.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RunMode {
    #[default]
    File,
    Repl,
}

pub struct Session<W: Write> {
    interpreter: Interpreter<W>,
    reporter: Reporter,
    next_id: ExprId,
}

impl<W: Write> Session<W> {
    pub fn new(out: W) -> Self {
        Self {
            interpreter: Interpreter::new(out),
            reporter: Reporter::new(),
            next_id: 0,
        }
    }

    /// Runs `source` to completion, or until the first failing stage.
    pub fn run(&mut self, source: &str, mode: RunMode) {
        info!("Running {} bytes of source in {:?} mode", source.len(), mode);

        if mode == RunMode::Repl {
            self.reporter.clear_build_error();
        }
        self.interpreter.set_mode(mode);

        let statements: Vec<Stmt> = self.parse(source, mode);
        if self.reporter.had_build_error() {
            return;
        }

        Resolver::new(&mut self.interpreter, &mut self.reporter).resolve(&statements);
        if self.reporter.had_build_error() {
            return;
        }

        self.interpreter.interpret(&statements, &mut self.reporter);
    }

    /// Scan only.
    pub fn tokenize(&mut self, source: &str) -> Vec<Token> {
        scan_tokens(source, &mut self.reporter)
    }

    /// Scan and parse. Returns nothing when scanning failed.
    pub fn parse(&mut self, source: &str, mode: RunMode) -> Vec<Stmt> {
        let tokens: Vec<Token> = scan_tokens(source, &mut self.reporter);
        if self.reporter.had_build_error() {
            return Vec::new();
        }

        let mut parser = Parser::new(&tokens, mode, &mut self.reporter).starting_at(self.next_id);
        let statements: Vec<Stmt> = parser.parse();
        self.next_id = parser.next_id();

        statements
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut Reporter {
        &mut self.reporter
    }

    /// Drain diagnostics recorded since the last call.
    pub fn take_diagnostics(&mut self) -> Vec<LoxError> {
        self.reporter.take_diagnostics()
    }

    pub fn output(&self) -> &W {
        self.interpreter.output()
    }

    pub fn into_output(self) -> W {
        self.interpreter.into_output()
    }
}
