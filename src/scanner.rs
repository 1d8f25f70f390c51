//! Module `scanner` implements a line‑oriented lexer for the Lox language.
//!
//! Source is fed one line at a time together with its 0‑based index, so the
//! same [`Scanner`] serves whole files and an interactive prompt.  Recognised
//! tokens are appended to a single growing stream terminated by exactly one
//! `EOF` token; before a new line is scanned the previous `EOF` is popped and
//! it is re‑appended afterwards.
//!
//! # Token Recognition
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`, `*`.
//! - Two‑character operators via one byte of lookahead: `!=`, `==`, `<=`, `>=`.
//! - String literals: `"` … `"` on the same line, whitespace preserved.
//!   A string still open at end of line is reported and produces no token.
//! - Numeric literals: digits with at most one `.`; a trailing `.` is split
//!   off into its own `DOT` token (`1.` → `NUMBER 1.0`, `DOT`).
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a
//!   perfect‑hash `KEYWORDS` map.
//! - `//` discards the rest of the line.
//!
//! The scanner never fails: unexpected characters and unterminated strings go
//! to the injected [`Reporter`] and scanning continues with the next byte.
//!
//! # Example
//!
//! ```rust
//! use treelox::diagnostics::Diagnostics;
//! use treelox::scanner::Scanner;
//!
//! let mut diagnostics = Diagnostics::new();
//! let mut scanner = Scanner::new();
//! scanner.scan_line(0, "print 123; // example", &mut diagnostics);
//! assert_eq!(scanner.tokens().len(), 4);
//! ```

use crate::diagnostics::Reporter;
use crate::token::{Token, TokenType};
use log::{debug, info, trace};
use memchr::memchr;
use phf::phf_map;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// Accumulating token stream.  Owns every token scanned so far.
#[derive(Debug)]
pub struct Scanner {
    tokens: Vec<Token>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub fn new() -> Self {
        info!("Scanner created");

        Self {
            tokens: vec![Token::new(TokenType::EOF, "", 1)],
        }
    }

    /// All tokens scanned so far, always ending in `EOF`.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Scan a whole multi‑line source, line by line.
    pub fn scan_source(&mut self, source: &str, reporter: &mut dyn Reporter) {
        for (index, line) in source.lines().enumerate() {
            self.scan_line(index, line, reporter);
        }
    }

    /// Scan one line of source.  `index` is 0‑based; tokens and diagnostics
    /// carry `index + 1`.
    pub fn scan_line(&mut self, index: usize, line: &str, reporter: &mut dyn Reporter) {
        if matches!(
            self.tokens.last().map(|t| &t.token_type),
            Some(TokenType::EOF)
        ) {
            self.tokens.pop();
        }

        let before = self.tokens.len();
        let mut cursor = LineScanner::new(line, index + 1);
        cursor.run(&mut self.tokens, reporter);

        debug!(
            "Scanned line {}: {} new token(s)",
            index + 1,
            self.tokens.len() - before
        );

        self.tokens.push(Token::new(TokenType::EOF, "", index + 1));
    }
}

/// Cursor over a single line.
struct LineScanner<'s> {
    src: &'s str,
    start: usize, // index of the *first* byte of the current lexeme
    curr: usize,  // index *one past* the last byte examined
    line: usize,  // 1‑based line number for every token of this line
}

impl<'s> LineScanner<'s> {
    fn new(src: &'s str, line: usize) -> Self {
        Self {
            src,
            start: 0,
            curr: 0,
            line,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn bytes(&self) -> &'s [u8] {
        self.src.as_bytes()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Advance one byte and return it.  Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes()[self.curr];
        self.curr += 1;
        b
    }

    /// Current byte, or `0` past the end.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.bytes()[self.curr]
        }
    }

    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn lexeme(&self) -> &'s str {
        &self.src[self.start..self.curr]
    }

    fn emit(&self, tokens: &mut Vec<Token>, tt: TokenType) {
        trace!("Scanned token ({:?}) on line {}", tt, self.line);

        tokens.push(Token::new(tt, self.lexeme(), self.line));
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    fn run(&mut self, tokens: &mut Vec<Token>, reporter: &mut dyn Reporter) {
        while !self.is_at_end() {
            self.start = self.curr;
            self.scan_token(tokens, reporter);
        }
    }

    fn scan_token(&mut self, tokens: &mut Vec<Token>, reporter: &mut dyn Reporter) {
        let b = self.advance();

        let tt = match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            // ── two‑character operators (!=, ==, <=, >=) ─────────────────
            b'!' => {
                if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                }
            }

            b'=' => {
                if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                }
            }

            b'<' => {
                if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                }
            }

            b'>' => {
                if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                }
            }

            // ── whitespace ───────────────────────────────────────────────
            b' ' | b'\r' | b'\t' | b'\n' => return,

            // ── comments (// … until end of line) ────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    self.curr = self.src.len();
                    return;
                }

                TokenType::SLASH
            }

            b'"' => return self.string(tokens, reporter),

            b'0'..=b'9' => return self.number(tokens),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            // ── unexpected character ─────────────────────────────────────
            _ => {
                // Step over the whole (possibly multi‑byte) character.
                let c = self.src[self.start..].chars().next().unwrap_or('\u{FFFD}');
                self.curr = self.start + c.len_utf8();

                debug!("Unexpected character {:?} on line {}", c, self.line);

                reporter.lexical(self.line, "", Some(c));
                return;
            }
        };

        self.emit(tokens, tt);
    }

    /// Double‑quoted string; `self.start` points at the opening quote.
    fn string(&mut self, tokens: &mut Vec<Token>, reporter: &mut dyn Reporter) {
        match memchr(b'"', &self.bytes()[self.curr..]) {
            Some(pos) => {
                let body = &self.src[self.curr..self.curr + pos];
                self.curr += pos + 1; // past the closing quote

                self.emit(tokens, TokenType::STRING(body.to_owned()));
            }

            None => {
                let body = &self.src[self.curr..];
                self.curr = self.src.len();

                reporter.lexical(self.line, body, None);
            }
        }
    }

    /// Digits with at most one internal `.`; a trailing `.` becomes `DOT`.
    fn number(&mut self, tokens: &mut Vec<Token>) {
        let mut seen_dot = false;

        loop {
            let c = self.peek();

            if c.is_ascii_digit() {
                self.advance();
            } else if c == b'.' && !seen_dot {
                seen_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        let trailing_dot = self.lexeme().ends_with('.');

        if trailing_dot {
            self.curr -= 1;
        }

        // Only ASCII digits and one '.', parse cannot fail.
        let n: f64 = self.lexeme().parse::<f64>().unwrap_or(0.0);
        self.emit(tokens, TokenType::NUMBER(n));

        if trailing_dot {
            self.start = self.curr;
            self.curr += 1;
            self.emit(tokens, TokenType::DOT);
        }
    }

    fn identifier(&mut self) -> TokenType {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        KEYWORDS
            .get(self.lexeme().as_bytes())
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}
