//! Diagnostic sink shared by every pipeline stage.
//!
//! Stages never print.  They call into a [`Reporter`]; the default
//! implementation, [`Diagnostics`], records each report as a [`LoxError`] in
//! arrival order and optionally echoes it to stderr.  One `Diagnostics` value
//! belongs to one run; [`Diagnostics::clear`] starts a fresh one.

use log::debug;

use crate::error::{LoxError, RuntimeError};
use crate::token::{Token, TokenType};

/// One entry point per stage.
pub trait Reporter {
    /// Scanner failure.  `context` is the partial lexeme being built when the
    /// failure happened (the string body for an unterminated string).
    /// `character` is the offending character, absent for unterminated strings.
    fn lexical(&mut self, line: usize, context: &str, character: Option<char>);

    fn syntax(&mut self, token: &Token, message: &str);

    fn semantic(&mut self, token: &Token, message: &str);

    fn runtime(&mut self, error: &RuntimeError);
}

/// `" at end"` / `" at 'x'"` suffix used in parser and resolver messages.
pub fn location_of(token: &Token) -> String {
    match token.token_type {
        TokenType::EOF => " at end".to_string(),
        _ => format!(" at '{}'", token.lexeme),
    }
}

/// Error accumulator bound to a single interpreter run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<LoxError>,
    echo: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Like [`Diagnostics::new`] but every report is also written to stderr.
    pub fn echoing() -> Self {
        Self {
            errors: Vec::new(),
            echo: true,
        }
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_lexical_errors(&self) -> bool {
        self.errors.iter().any(|e| matches!(e, LoxError::Lex { .. }))
    }

    pub fn lexical_errors(&self) -> Vec<&LoxError> {
        self.select(|e| matches!(e, LoxError::Lex { .. }))
    }

    pub fn syntax_errors(&self) -> Vec<&LoxError> {
        self.select(|e| matches!(e, LoxError::Parse { .. }))
    }

    pub fn semantic_errors(&self) -> Vec<&LoxError> {
        self.select(|e| matches!(e, LoxError::Resolve { .. }))
    }

    pub fn runtime_errors(&self) -> Vec<&RuntimeError> {
        self.errors
            .iter()
            .filter_map(|e| match e {
                LoxError::Runtime(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    fn select(&self, pred: impl Fn(&LoxError) -> bool) -> Vec<&LoxError> {
        self.errors.iter().filter(|e| pred(e)).collect()
    }

    fn push(&mut self, error: LoxError) {
        debug!("Diagnostic recorded: {}", error);

        if self.echo {
            eprintln!("{}", error);
        }

        self.errors.push(error);
    }
}

impl Reporter for Diagnostics {
    fn lexical(&mut self, line: usize, _context: &str, character: Option<char>) {
        let message = match character {
            Some(c) => format!("Unexpected character: {}", c),
            None => "Unterminated string.".to_string(),
        };

        self.push(LoxError::lex(line, message));
    }

    fn syntax(&mut self, token: &Token, message: &str) {
        self.push(LoxError::parse(token.line, location_of(token), message));
    }

    fn semantic(&mut self, token: &Token, message: &str) {
        self.push(LoxError::resolve(token.line, location_of(token), message));
    }

    fn runtime(&mut self, error: &RuntimeError) {
        self.push(LoxError::Runtime(error.clone()));
    }
}
