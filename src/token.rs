use log::trace;
use serde::Serialize;
use std::fmt;
use std::mem;

/// The different kinds of tokens recognized by the Lox scanner.
///
/// Variants without data represent single‑character or keyword tokens.
/// `STRING(String)` and `NUMBER(f64)` carry their literal values.
/// `IDENTIFIER` is used for user‑defined names.
/// `EOF` marks the end of input.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// '-'
    MINUS,

    /// '+'
    PLUS,

    /// ';'
    SEMICOLON,

    /// '/'
    SLASH,

    /// '*'
    STAR,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal (contents without quotes)
    STRING(String),

    /// A numeric literal
    #[serde(rename = "NUMBER")]
    NUMBER(f64),

    AND,
    CLASS,
    ELSE,
    FALSE,
    FUN,
    FOR,
    IF,
    NIL,
    OR,
    PRINT,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,

    /// End‑of‑file marker
    EOF,
}

impl TokenType {
    /// Upper-case variant name without payload.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::STRING(_) => "STRING",
            TokenType::NUMBER(_) => "NUMBER",
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::MINUS => "MINUS",
            TokenType::PLUS => "PLUS",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::SLASH => "SLASH",
            TokenType::STAR => "STAR",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::AND => "AND",
            TokenType::CLASS => "CLASS",
            TokenType::ELSE => "ELSE",
            TokenType::FALSE => "FALSE",
            TokenType::FUN => "FUN",
            TokenType::FOR => "FOR",
            TokenType::IF => "IF",
            TokenType::NIL => "NIL",
            TokenType::OR => "OR",
            TokenType::PRINT => "PRINT",
            TokenType::RETURN => "RETURN",
            TokenType::SUPER => "SUPER",
            TokenType::THIS => "THIS",
            TokenType::TRUE => "TRUE",
            TokenType::VAR => "VAR",
            TokenType::WHILE => "WHILE",
            TokenType::EOF => "EOF",
        }
    }
}

impl PartialEq for TokenType {
    /// Two TokenTypes are equal if they share the same variant
    /// (ignoring any inner data). Uses `mem::discriminant` to compare.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// Value carried by a literal token or literal expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    /// Integral lexemes such as `"3"` are still parsed as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    Bool(bool),

    /// The `nil` literal.
    Nil,
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Number(n) => f.write_str(&format_number(*n)),
            LiteralValue::Str(s) => f.write_str(s),
            LiteralValue::Bool(b) => write!(f, "{}", b),
            LiteralValue::Nil => f.write_str("nil"),
        }
    }
}

/// A scanned token: its kind, the original lexeme, and the 1‑based line
/// where it was found.  Immutable once produced.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: String,

    /// 1‑based line number in the source.
    pub line: usize,
}

impl Token {
    pub fn new<S: Into<String>>(token_type: TokenType, lexeme: S, line: usize) -> Self {
        let lexeme: String = lexeme.into();

        trace!(
            "Creating new token: type={:?}, lexeme={}, line={}",
            token_type,
            lexeme,
            line
        );

        Self {
            token_type,
            lexeme,
            line,
        }
    }

    /// Literal payload of `NUMBER` and `STRING` tokens.
    pub fn literal(&self) -> Option<LiteralValue> {
        match &self.token_type {
            TokenType::NUMBER(n) => Some(LiteralValue::Number(*n)),
            TokenType::STRING(s) => Some(LiteralValue::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let literal_str: String = match &self.token_type {
            TokenType::STRING(s) => s.clone(),
            TokenType::NUMBER(n) => format_number(*n),
            _ => "null".to_string(),
        };

        write!(
            f,
            "{} {} {}",
            self.token_type.name(),
            self.lexeme,
            literal_str
        )
    }
}

/// Lox number formatting: 3 → "3.0", 3.14 → "3.14", -0 → "-0.0".
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        let sign = if n == 0.0 && n.is_sign_negative() { "-" } else { "" };
        let mut buf: itoa::Buffer = itoa::Buffer::new();

        format!("{}{}.0", sign, buf.format(n as i64))
    } else {
        n.to_string()
    }
}
