//! One interpreter plus the pipeline that feeds it:
//! scan → parse → resolve → interpret.
//!
//! A session keeps its globals between [`Session::run`] calls, which is what
//! the REPL relies on.  Static errors of a run (lexical, syntax, resolution)
//! prevent that run from executing anything.

use std::io::{BufRead, Write};

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::{JasperError, Result};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

pub struct Session {
    interpreter: Interpreter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Session on the process's stdout and stdin.
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    /// Session with injected output and input streams.
    pub fn with_io(out: Box<dyn Write>, input: Box<dyn BufRead>) -> Self {
        Self {
            interpreter: Interpreter::with_io(out, input),
        }
    }

    /// Run `source` to completion.
    ///
    /// * `Err(JasperError::Static(..))` – nothing was executed.
    /// * `Err(JasperError::Runtime { .. })` – execution stopped at that error.
    pub fn run(&mut self, source: &str) -> Result<()> {
        let statements: Vec<Stmt> = compile(source)?;

        Resolver::new(&mut self.interpreter).resolve(&statements)?;
        debug!("Resolution succeeded");

        self.interpreter.interpret(&statements)
    }
}

/// Scan and parse `source`, gathering lexical and syntax errors together.
pub fn compile(source: &str) -> Result<Vec<Stmt>> {
    let (tokens, mut errors): (Vec<Token>, Vec<JasperError>) = Scanner::new(source).scan_all();

    match Parser::new(&tokens).parse() {
        Ok(statements) if errors.is_empty() => Ok(statements),
        Ok(_) => Err(JasperError::Static(errors)),
        Err(JasperError::Static(parse_errors)) => {
            errors.extend(parse_errors);
            errors.sort_by_key(|e| e.line().unwrap_or(0));
            info!("Compilation failed with {} error(s)", errors.len());
            Err(JasperError::Static(errors))
        }
        Err(other) => Err(other),
    }
}
