/*!
Recursive‑descent parser for Lox.

Definitions
-----------
* **n** = number of tokens (including the sole EOF).

Every token is consumed once by `advance()`; error recovery (`synchronize`)
only skips forward, so a parse is **Θ(n)**.  Call‑stack depth grows with
syntactic nesting and is guarded by [`ensure_sufficient_stack`].

### Error policy

A syntax error inside a declaration is reported to the injected
[`Reporter`] the moment it is detected, the declaration is dropped, and
parsing resumes after the next statement boundary (`;` or a keyword that
starts a declaration/statement).  A failed parse therefore still yields
every statement that *did* parse.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `synchronize` | `debug`| Descent into grammar branches / recovery. |

--------------------------------------------------------------------------------
Grammar (EBNF)
--------------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | statement ;
classDecl      → "class" IDENT ( "<" IDENT )? "{" function* "}" ;
funDecl        → "fun" function ;
function       → IDENT "(" parameters? ")" block ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
statement      → exprStmt | forStmt | ifStmt | printStmt
               | returnStmt | whileStmt | block ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" )
                 expression? ";" expression? ")" statement ;
exprStmt       → expression ";" ;
block          → "{" declaration* "}" ;
expression     → assignment ;
assignment     → ( call "." )? IDENT "=" assignment | logic_or ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → equality  ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
primary        → NUMBER | STRING | "true" | "false" | "nil" | "this"
               | IDENT | "(" expression ")" | "super" "." IDENT ;
```

An expression statement that ends exactly at `EOF` may omit its `;`.  In
REPL mode such a lone trailing expression is handed back bare
([`ReplInput::Expression`]) so the caller can echo its value.
*/

use std::rc::Rc;

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::diagnostics::{location_of, Reporter};
use crate::error::{LoxError, Result};
use crate::stack::ensure_sufficient_stack;
use crate::token::{LiteralValue, Token, TokenType};

use log::{debug, info};

/// Upper bound on parameters and call arguments.
pub const MAX_ARITY: usize = 255;

/// Result of parsing one interactive line.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplInput {
    Statements(Vec<Stmt>),

    /// A single expression typed without a terminating `;`.
    Expression(Expr),
}

/// Top‑level parser over an immutable slice of tokens ending in `EOF`.
pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    next_id: usize,
    reporter: &'a mut dyn Reporter,

    /// Whether an expression statement may still end at `EOF` without `;`.
    allow_bare_expression: bool,

    /// Set when an expression statement was closed by `EOF` instead of `;`.
    bare_trailing_expression: bool,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.  `tokens` must end with an `EOF` token.
    pub fn new(tokens: &'a [Token], reporter: &'a mut dyn Reporter) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            next_id: 0,
            reporter,
            allow_bare_expression: true,
            bare_trailing_expression: false,
        }
    }

    /// Continue expression numbering from `first_id` (used across REPL lines
    /// so ids never collide inside one resolved‑locals table).
    pub fn starting_at(mut self, first_id: usize) -> Self {
        self.next_id = first_id;
        self
    }

    /// First id not yet handed out.
    pub fn next_id(&self) -> usize {
        self.next_id
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program.  Declarations that failed to parse are
    /// reported and omitted.
    pub fn parse(&mut self) -> Vec<Stmt> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!("Parsed {} statement(s)", statements.len());

        statements
    }

    /// Parse one interactive line.  Only a line holding a single expression
    /// may leave out the closing `;`.
    pub fn parse_repl(&mut self) -> ReplInput {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
            self.allow_bare_expression = false;
        }

        if self.bare_trailing_expression && statements.len() == 1 {
            if let Some(Stmt::Expression(expr)) = statements.pop() {
                debug!("REPL line is a bare expression");
                return ReplInput::Expression(expr);
            }
        }

        ReplInput::Statements(statements)
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        ensure_sufficient_stack(|| {
            let result = if self.matches(TokenType::CLASS) {
                self.class_declaration()
            } else if self.matches(TokenType::FUN) {
                self.function("function").map(Stmt::Function)
            } else if self.matches(TokenType::VAR) {
                self.var_declaration()
            } else {
                self.statement()
            };

            match result {
                Ok(stmt) => Some(stmt),
                Err(e) => {
                    debug!("Recovering from parse error: {}", e);
                    self.synchronize();
                    None
                }
            }
        })
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect class name.")?;

        let superclass: Option<Expr> = if self.matches(TokenType::LESS) {
            let super_name = self.consume(TokenType::IDENTIFIER, "Expect superclass name.")?;

            Some(Expr::Variable {
                id: self.new_id(),
                name: super_name,
            })
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    fn function(&mut self, kind: &str) -> Result<Rc<FunctionDecl>> {
        let name: Token = self.consume(TokenType::IDENTIFIER, &format!("Expect {} name.", kind))?;

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expect '(' after {} name.", kind),
        )?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    let token = self.peek();
                    self.report(token, "Can't have more than 255 parameters.");
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;
        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expect '{{' before {} body.", kind),
        )?;

        let body = self.block()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        if self.matches(TokenType::FOR) {
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

    /// `for` has no node of its own: it becomes
    /// `{ initializer; while (condition) { body; increment; } }`.
    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

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
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body: Stmt = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        body = Stmt::While {
            condition: condition.unwrap_or(Expr::Literal(LiteralValue::Bool(true))),
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

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

        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;
        let body: Box<Stmt> = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        if self.allow_bare_expression && self.is_at_end() {
            self.bare_trailing_expression = true;
        } else {
            self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;
        }

        Ok(Stmt::Expression(expr))
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        ensure_sufficient_stack(|| self.assignment())
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.logical_or()?;

        if self.matches(TokenType::EQUAL) {
            let equals: &'a Token = self.previous();
            let value: Expr = self.assignment()?;

            match expr {
                Expr::Variable { name, .. } => {
                    return Ok(Expr::Assign {
                        id: self.new_id(),
                        name,
                        value: Box::new(value),
                    });
                }

                Expr::Get { object, name } => {
                    return Ok(Expr::Set {
                        object,
                        name,
                        value: Box::new(value),
                    });
                }

                other => {
                    // Reported, but the parser is not confused: no unwinding.
                    self.report(equals, "Invalid assignment target.");

                    return Ok(other);
                }
            }
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
        let mut expr = self.term()?;

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
            let right: Expr = ensure_sufficient_stack(|| self.unary())?;
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
                let name: Token =
                    self.consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?;

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
                if arguments.len() >= MAX_ARITY {
                    let token = self.peek();
                    self.report(token, "Can't have more than 255 arguments.");
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Literal(LiteralValue::Bool(false)));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Literal(LiteralValue::Bool(true)));
        }
        if self.matches(TokenType::NIL) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if self.matches(TokenType::NUMBER(0.0)) || self.matches(TokenType::STRING(String::new())) {
            if let Some(literal) = self.previous().literal() {
                return Ok(Expr::Literal(literal));
            }
        }

        if self.matches(TokenType::THIS) {
            return Ok(Expr::This {
                id: self.new_id(),
                keyword: self.previous().clone(),
            });
        }

        if self.matches(TokenType::SUPER) {
            let keyword: Token = self.previous().clone();
            self.consume(TokenType::DOT, "Expect '.' after 'super'.")?;
            let method: Token =
                self.consume(TokenType::IDENTIFIER, "Expect superclass method name.")?;

            return Ok(Expr::Super {
                id: self.new_id(),
                keyword,
                method,
            });
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable {
                id: self.new_id(),
                name: self.previous().clone(),
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        let token = self.peek();
        Err(self.error(token, "Expect expression."))
    }

    // ────────────────────── utility helpers ───────────────────────

    fn new_id(&mut self) -> ExprId {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Report without unwinding.
    fn report(&mut self, token: &Token, message: &str) {
        self.reporter.syntax(token, message);
    }

    /// Report and build the error that unwinds to `declaration`.
    fn error(&mut self, token: &Token, message: &str) -> LoxError {
        self.report(token, message);

        LoxError::parse(token.line, location_of(token), message)
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<Token> {
        if self.check(ttype) {
            return Ok(self.advance().clone());
        }

        let token = self.peek();
        Err(self.error(token, message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;
        &tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;
        &tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
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

        debug!("Synchronized at end of input");
    }
}
