//! Centralised error hierarchy for the **Jasper interpreter**.
//!
//! Every pass (scanner, parser, resolver, runtime) converts its failure modes
//! into one of the variants defined here.  Static passes collect their
//! diagnostics and hand them back as a single [`JasperError::Static`] so a host
//! can print all of them at once.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JasperError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.  `location` is either ` at 'lexeme'` or ` at end`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static‑analysis failure reported by the resolver.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error, tagged with the offending token's line.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Every static diagnostic produced by one run, in source order.
    #[error("{}", join_lines(.0))]
    Static(Vec<JasperError>),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn join_lines(errors: &[JasperError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// ` at 'lexeme'`, or ` at end` for the synthetic EOF token.
fn location_of(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl JasperError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        JasperError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        JasperError::Parse {
            message,
            location: location_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        JasperError::Resolve {
            message,
            location: location_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        JasperError::Runtime {
            message,
            line: token.line,
        }
    }

    /// `true` for scanning, parsing and resolving failures.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            JasperError::Lex { .. }
                | JasperError::Parse { .. }
                | JasperError::Resolve { .. }
                | JasperError::Static(_)
        )
    }

    /// Source line of a single diagnostic, if it carries one.
    pub fn line(&self) -> Option<usize> {
        match self {
            JasperError::Lex { line, .. }
            | JasperError::Parse { line, .. }
            | JasperError::Resolve { line, .. }
            | JasperError::Runtime { line, .. } => Some(*line),
            JasperError::Static(_) | JasperError::Io(_) => None,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, JasperError>;
