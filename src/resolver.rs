//! Static resolver pass for **Lox**.
//!
//! One AST walk that does three things:
//! 1. Builds lexical scopes (stack of `HashMap<String, bool>` tracking
//!    declared/defined), pushing exactly one scope wherever the interpreter
//!    will later push one environment frame.
//! 2. Reports static errors through the [`Reporter`] and keeps going.
//! 3. Tells the interpreter, for each `Variable`/`Assign`/`This`/`Super` node,
//!    how many frames out its binding lives.  Nodes bound in no scope are left
//!    out of the table and looked up as globals.
//!
//! Class bodies get two implicit scopes around their methods: one holding
//! `super` (subclasses only) and one holding `this`.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::class::INITIALIZER;
use crate::diagnostics::Reporter;
use crate::interpreter::Interpreter;
use crate::stack::ensure_sufficient_stack;
use crate::token::Token;

/// What kind of body are we in?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// Used to validate `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver<'r> {
    interpreter: &'r mut Interpreter,
    reporter: &'r mut dyn Reporter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'r> Resolver<'r> {
    pub fn new(interpreter: &'r mut Interpreter, reporter: &'r mut dyn Reporter) -> Self {
        info!("Resolver instantiated");

        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    /// Resolve a lone expression (REPL echo).
    pub fn resolve_expression(&mut self, expr: &Expr) {
        self.resolve_expr(expr);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        ensure_sufficient_stack(|| self.visit_stmt(stmt))
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(declaration) => {
                // name is visible inside its own body
                self.declare(&declaration.name);
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),

            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.reporter
                        .semantic(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.reporter
                            .semantic(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) {
        debug!("Resolving class '{}'", name.lexeme);

        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable { name: super_name, .. } = superclass {
                if super_name.lexeme == name.lexeme {
                    self.reporter
                        .semantic(super_name, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.define_implicit("super");
        }

        self.begin_scope();
        self.define_implicit("this");

        for method in methods {
            let kind = if method.name.lexeme == INITIALIZER {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| self.visit_expr(expr))
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                let uninitialized = self
                    .scopes
                    .last()
                    .and_then(|scope| scope.get(&name.lexeme))
                    == Some(&false);

                if uninitialized {
                    self.reporter.semantic(
                        name,
                        "Can't read local variable in its own initializer.",
                    );
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // RHS first, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.reporter
                        .semantic(keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.reporter
                            .semantic(keyword, "Can't use 'super' outside of a class.");
                    }
                    ClassType::Class => {
                        self.reporter.semantic(
                            keyword,
                            "Can't use 'super' in a class with no superclass.",
                        );
                    }
                    ClassType::Subclass => {}
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.
    fn resolve_function(&mut self, function: &FunctionDecl, kind: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        for stmt in &function.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Shadowing an outer scope is fine; redeclaring in the innermost one
    /// is not.  Globals are never tracked.
    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.reporter
                .semantic(name, "Already a variable with this name in this scope.");
        }

        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn define_implicit(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record the distance to the innermost scope that binds `name`, or
    /// nothing if it is global.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
