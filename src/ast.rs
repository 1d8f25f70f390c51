//! **Abstract‑Syntax‑Tree** for Lox.
//!
//! Two closed variant families, [`Expr`] and [`Stmt`], produced by the parser
//! and consumed by the resolver and the interpreter with exhaustive `match`es.
//!
//! Nodes that name a binding (`Variable`, `Assign`, `This`, `Super`) carry an
//! [`ExprId`] handed out by the parser.  The resolver keys its scope‑distance
//! table on that id, so two textually identical references stay distinct.

use std::rc::Rc;

use serde::Serialize;

use crate::token::{LiteralValue, Token};

/// Identity of a resolvable expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExprId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Variable access ‑ resolves to the identifier’s current value at runtime.
    Variable { id: ExprId, name: Token },

    /// Assignment expression: `identifier "=" expression`
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token, // `AND` or `OR`
        right: Box<Expr>,
    },

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary { operator: Token, right: Box<Expr> },

    /// Function‑ or method‑call expression
    /// *Example:* `clock()` or `add(1, 2)`
    Call {
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The 'this' keyword inside a method.
    This { id: ExprId, keyword: Token },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),
}

impl Expr {
    /// Best‑effort source line for diagnostics.
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal(_) => 0,
            Expr::Variable { name, .. } | Expr::Assign { name, .. } => name.line,
            Expr::Binary { operator, .. }
            | Expr::Logical { operator, .. }
            | Expr::Unary { operator, .. } => operator.line,
            Expr::Call { paren, .. } => paren.line,
            Expr::Get { name, .. } | Expr::Set { name, .. } => name.line,
            Expr::This { keyword, .. } | Expr::Super { keyword, .. } => keyword.line,
            Expr::Grouping(inner) => inner.line(),
        }
    }
}

/// `fun` declaration or class method.  Shared (`Rc`) between the tree and
/// every function value created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop; `for` loops are desugared into this.
    While { condition: Expr, body: Box<Stmt> },

    Function(Rc<FunctionDecl>),

    Return {
        /// The `return` keyword token (for diagnostics).
        keyword: Token,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    Class {
        name: Token,

        /// Always an [`Expr::Variable`] when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
