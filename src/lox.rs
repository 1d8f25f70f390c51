//! Pipeline driver: scanner → parser → resolver → interpreter.
//!
//! A [`Lox`] session owns every piece of state that outlives one call: the
//! accumulated token stream, the expression‑id counter, the interpreter with
//! its globals, and the diagnostics of the current run.  File mode
//! ([`Lox::run_source`]) and interactive mode ([`Lox::run_repl_line`]) share
//! it, so REPL lines see the declarations of earlier lines.

use log::{debug, info};

use crate::diagnostics::{Diagnostics, Reporter};
use crate::interpreter::{Interpreter, DEFAULT_MAX_CALL_DEPTH};
use crate::parser::{Parser, ReplInput};
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;
use crate::value::Value;

/// Session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoxConfig {
    /// Echo each diagnostic to stderr as it is reported.
    pub echo_diagnostics: bool,

    /// Collect `print` output in memory instead of writing to stdout.
    pub capture_output: bool,

    /// Nested calls allowed before a stack‑overflow runtime error.
    pub max_call_depth: usize,
}

impl Default for LoxConfig {
    fn default() -> Self {
        Self {
            echo_diagnostics: true,
            capture_output: false,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl LoxConfig {
    /// Silent, capturing configuration used by tests and embedders.
    pub fn captured() -> Self {
        Self {
            echo_diagnostics: false,
            capture_output: true,
            ..Self::default()
        }
    }
}

/// Outcome of a file‑mode run.  Only lexical failures are distinguished;
/// syntax, semantic and runtime errors are in [`Lox::diagnostics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    LexicalFailure,
}

pub struct Lox {
    scanner: Scanner,

    /// Index of the first token not yet handed to the parser.
    cursor: usize,
    next_id: usize,
    repl_line: usize,
    interpreter: Interpreter,
    diagnostics: Diagnostics,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    pub fn new() -> Self {
        Self::with_config(LoxConfig::default())
    }

    pub fn with_config(config: LoxConfig) -> Self {
        info!("Starting Lox session with {:?}", config);

        let interpreter = if config.capture_output {
            Interpreter::capturing()
        } else {
            Interpreter::new()
        }
        .with_max_call_depth(config.max_call_depth);

        let diagnostics = if config.echo_diagnostics {
            Diagnostics::echoing()
        } else {
            Diagnostics::new()
        };

        Self {
            scanner: Scanner::new(),
            cursor: 0,
            next_id: 0,
            repl_line: 0,
            interpreter,
            diagnostics,
        }
    }

    /// Run a whole program held in memory.
    pub fn run_source(&mut self, source: &str) -> RunStatus {
        self.run_lines(source.lines())
    }

    /// Run a program given as a sequence of lines.  Every stage is attempted
    /// even if an earlier one reported errors.
    pub fn run_lines<I, S>(&mut self, lines: I) -> RunStatus
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.diagnostics.clear();

        for (index, line) in lines.into_iter().enumerate() {
            self.scanner
                .scan_line(index, line.as_ref(), &mut self.diagnostics);
        }

        let statements = {
            let tokens = &self.scanner.tokens()[self.cursor..];
            let mut parser = Parser::new(tokens, &mut self.diagnostics).starting_at(self.next_id);
            let statements = parser.parse();
            self.next_id = parser.next_id();
            statements
        };
        self.cursor = self.end_of_stream();

        Resolver::new(&mut self.interpreter, &mut self.diagnostics).resolve(&statements);

        if let Err(error) = self.interpreter.interpret(&statements) {
            self.diagnostics.runtime(&error);
        }

        if self.diagnostics.has_lexical_errors() {
            info!("Run finished with lexical errors");
            RunStatus::LexicalFailure
        } else {
            info!("Run finished");
            RunStatus::Completed
        }
    }

    /// Run one interactive line.  Returns the value of a bare trailing
    /// expression unless it is `nil`.  A line with lexical errors is
    /// discarded before parsing.
    pub fn run_repl_line(&mut self, line: &str) -> Option<Value> {
        self.diagnostics.clear();

        let index = self.repl_line;
        self.repl_line += 1;

        self.scanner.scan_line(index, line, &mut self.diagnostics);

        if self.diagnostics.has_lexical_errors() {
            debug!("Discarding REPL line {} after lexical errors", index + 1);
            self.cursor = self.end_of_stream();
            return None;
        }

        let input = {
            let tokens = &self.scanner.tokens()[self.cursor..];
            let mut parser = Parser::new(tokens, &mut self.diagnostics).starting_at(self.next_id);
            let input = parser.parse_repl();
            self.next_id = parser.next_id();
            input
        };
        self.cursor = self.end_of_stream();

        match input {
            ReplInput::Expression(expr) => {
                Resolver::new(&mut self.interpreter, &mut self.diagnostics)
                    .resolve_expression(&expr);

                match self.interpreter.evaluate(&expr) {
                    Ok(value) if value.is_nil() => None,
                    Ok(value) => Some(value),
                    Err(error) => {
                        self.diagnostics.runtime(&error);
                        None
                    }
                }
            }

            ReplInput::Statements(statements) => {
                Resolver::new(&mut self.interpreter, &mut self.diagnostics).resolve(&statements);

                if let Err(error) = self.interpreter.interpret(&statements) {
                    self.diagnostics.runtime(&error);
                }
                None
            }
        }
    }

    /// Diagnostics of the most recent run or REPL line.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Captured `print` output, oldest first.
    pub fn printed(&self) -> &[String] {
        self.interpreter.printed()
    }

    /// Every token scanned in this session, ending in `EOF`.
    pub fn tokens(&self) -> &[Token] {
        self.scanner.tokens()
    }

    /// Position of the trailing `EOF`, where the next scan starts appending.
    fn end_of_stream(&self) -> usize {
        self.scanner.tokens().len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repl_lines_share_globals() {
        let mut lox = Lox::with_config(LoxConfig::captured());

        assert_eq!(lox.run_repl_line("var a = 1;"), None);
        assert_eq!(lox.run_repl_line("a + 2"), Some(Value::Number(3.0)));
        assert!(lox.diagnostics().is_empty());
    }

    #[test]
    fn repl_line_with_lexical_error_is_discarded() {
        let mut lox = Lox::with_config(LoxConfig::captured());

        assert_eq!(lox.run_repl_line("print 1; @"), None);
        assert!(lox.diagnostics().has_lexical_errors());
        assert!(lox.printed().is_empty());

        lox.run_repl_line("print 2;");
        assert_eq!(lox.printed(), ["2.0"]);
    }

    #[test]
    fn nil_expressions_are_not_echoed() {
        let mut lox = Lox::with_config(LoxConfig::captured());

        assert_eq!(lox.run_repl_line("nil"), None);
        assert_eq!(
            lox.run_repl_line("\"hi\""),
            Some(Value::String("hi".to_string()))
        );
    }
}
