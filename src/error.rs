//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! Every stage (scanner, parser, resolver, runtime, CLI) converts its failure
//! modes into one of the variants defined here. Scanner, parser and resolver
//! errors are non-fatal and accumulate in a [`Diagnostics`] sink; a
//! [`RuntimeError`] stops the current run.
//!
//! The module **does not** print diagnostics itself.
//!
//! [`Diagnostics`]: crate::diagnostics::Diagnostics

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,

        /// Either empty, `" at end"` or `" at 'lexeme'"`.
        location: String,
        line: usize,
    },

    /// Static‑analysis failure (scope rules, `this`/`super`/`return` misuse).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<L: Into<String>, S: Into<String>>(line: usize, location: L, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        LoxError::Parse {
            message,
            location: location.into(),
            line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<L: Into<String>, S: Into<String>>(line: usize, location: L, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", line, message);

        LoxError::Resolve {
            message,
            location: location.into(),
            line,
        }
    }
}

/// Fatal error raised while executing a program.  The first one aborts the
/// remaining statements of the run.
#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum RuntimeError {
    #[error("[line {line}] Runtime error: {message}")]
    TypeMismatch { message: String, line: usize },

    #[error("[line {line}] Runtime error: Division by zero.")]
    DivisionByZero { line: usize },

    #[error("[line {line}] Runtime error: Undefined variable '{name}'.")]
    UndefinedVariable { name: String, line: usize },

    #[error("[line {line}] Runtime error: Undefined property '{name}'.")]
    UndefinedProperty { name: String, line: usize },

    #[error("[line {line}] Runtime error: Expected {expected} arguments but got {got}.")]
    ArityMismatch {
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("[line {line}] Runtime error: Can only call functions and classes.")]
    NotCallable { line: usize },

    /// Property read/write on something that is not an instance.
    #[error("[line {line}] Runtime error: {message}")]
    InvalidProperty { message: String, line: usize },

    #[error("[line {line}] Runtime error: Superclass must be a class.")]
    SuperclassNotClass { line: usize },

    /// Failure raised inside a host-provided callable.
    #[error("Runtime error: {message}")]
    Native { message: String },

    /// Call-stack exhaustion from runaway recursion.
    #[error("[line {line}] Runtime error: Stack overflow (call depth exceeded {limit}).")]
    StackOverflow { limit: usize, line: usize },
}

impl RuntimeError {
    pub fn type_mismatch<S: Into<String>>(line: usize, msg: S) -> Self {
        RuntimeError::TypeMismatch {
            message: msg.into(),
            line,
        }
    }

    pub fn native<S: Into<String>>(msg: S) -> Self {
        RuntimeError::Native {
            message: msg.into(),
        }
    }

    pub fn undefined_variable(name: &str, line: usize) -> Self {
        RuntimeError::UndefinedVariable {
            name: name.to_string(),
            line,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Result alias used by the evaluator.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;
