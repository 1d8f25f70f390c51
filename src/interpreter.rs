use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

use log::{debug, info, trace};

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::callable::LoxFunction;
use crate::class::{LoxClass, LoxInstance, INITIALIZER};
use crate::environment::{EnvRef, Environment};
use crate::error::{RuntimeError, RuntimeResult};
use crate::natives;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Default bound on nested Lox calls before [`RuntimeError::StackOverflow`].
pub const DEFAULT_MAX_CALL_DEPTH: usize = 2048;

/// How a statement finished.  `Return` travels outward through every
/// enclosing block until a function call consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Normal,
    Return(Value),
}

/// Where `print` goes.
#[derive(Debug)]
enum Output {
    Stdout,
    Captured(Vec<String>),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    output: Output,
    call_depth: usize,
    max_call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates a new Interpreter whose globals hold the native bindings.
    pub fn new() -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::shared(None);
        natives::define_globals(&mut globals.borrow_mut());

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output: Output::Stdout,
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Like [`Interpreter::new`], but `print` appends to [`Interpreter::printed`]
    /// instead of writing to stdout.
    pub fn capturing() -> Self {
        Self {
            output: Output::Captured(Vec::new()),
            ..Self::new()
        }
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// Called by the resolver for every reference bound in a local scope.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        trace!("Resolved {:?} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Scope distance recorded for `id`, `None` meaning global.
    pub fn local_depth(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Everything printed so far when capturing; empty otherwise.
    pub fn printed(&self) -> &[String] {
        match &self.output {
            Output::Captured(lines) => lines,
            Output::Stdout => &[],
        }
    }

    /// Runs a program.  The first runtime error stops the remaining
    /// statements.  A `return` at top level ends the run early.
    pub fn interpret(&mut self, statements: &[Stmt]) -> RuntimeResult<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Completion::Return(value) = self.execute(stmt)? {
                info!("Top-level return with {}; stopping", value);
                break;
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    pub fn execute(&mut self, stmt: &Stmt) -> RuntimeResult<Completion> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    /// Runs `statements` with `env` as the active frame, then puts the
    /// previous frame back whatever the outcome.
    pub fn execute_block(&mut self, statements: &[Stmt], env: EnvRef) -> RuntimeResult<Completion> {
        let previous = mem::replace(&mut self.environment, env);

        let result = self.execute_sequence(statements);

        self.environment = previous;
        result
    }

    fn execute_sequence(&mut self, statements: &[Stmt]) -> RuntimeResult<Completion> {
        for stmt in statements {
            if let Completion::Return(value) = self.execute(stmt)? {
                return Ok(Completion::Return(value));
            }
        }

        Ok(Completion::Normal)
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> RuntimeResult<Completion> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Completion::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                debug!("Printed value: {}", value);

                match &mut self.output {
                    Output::Stdout => println!("{}", value),
                    Output::Captured(lines) => lines.push(value.to_string()),
                }
                Ok(Completion::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Variable '{}' defined with value: {}", name.lexeme, value);

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Completion::Normal)
            }

            Stmt::Block(statements) => {
                let env = Environment::shared(Some(Rc::clone(&self.environment)));
                self.execute_block(statements, env)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Completion::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Completion::Return(value) = self.execute(body)? {
                        return Ok(Completion::Return(value));
                    }
                }
                Ok(Completion::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Completion::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);

                Ok(Completion::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.declare_class(name, superclass.as_ref(), methods),
        }
    }

    fn declare_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> RuntimeResult<Completion> {
        debug!("Declaring class '{}'", name.lexeme);

        let superclass = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => return Err(RuntimeError::SuperclassNotClass { line: expr.line() }),
            },
            None => None,
        };

        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        let enclosing = superclass.as_ref().map(|superclass| {
            let env = Environment::shared(Some(Rc::clone(&self.environment)));
            env.borrow_mut()
                .define("super", Value::Class(Rc::clone(superclass)));
            mem::replace(&mut self.environment, env)
        });

        let methods: HashMap<String, Rc<LoxFunction>> = methods
            .iter()
            .map(|method| {
                let function = LoxFunction::new(
                    Rc::clone(method),
                    Rc::clone(&self.environment),
                    method.name.lexeme == INITIALIZER,
                );
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        if let Some(previous) = enclosing {
            self.environment = previous;
        }

        let class = LoxClass::new(name.lexeme.clone(), superclass, methods);
        self.environment
            .borrow_mut()
            .assign(&name.lexeme, Value::Class(Rc::new(class)));

        info!("Class '{}' defined", name.lexeme);
        Ok(Completion::Normal)
    }

    pub fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(literal.clone())),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                let assigned = match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                    ),
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone()),
                };

                if !assigned {
                    return Err(RuntimeError::undefined_variable(&name.lexeme, name.line));
                }

                debug!("Assigned value {} to '{}'", value, name.lexeme);
                Ok(value)
            }

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                evaluate_unary(operator, right)
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                evaluate_binary(left, operator, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuits = match operator.token_type {
                    TokenType::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.call_value(&callee, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                Value::Array(array) => array.get(name),
                _ => Err(RuntimeError::InvalidProperty {
                    message: "Only instances have properties.".to_string(),
                    line: name.line,
                }),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value = self.evaluate(value)?;
                    instance.borrow_mut().set(name, value.clone());
                    Ok(value)
                }
                Value::Array(array) => array.set(name),
                _ => Err(RuntimeError::InvalidProperty {
                    message: "Only instances have fields.".to_string(),
                    line: name.line,
                }),
            },

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> RuntimeResult<Value> {
        let value = match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme),
        };

        value.ok_or_else(|| RuntimeError::undefined_variable(&name.lexeme, name.line))
    }

    fn evaluate_super(&self, id: ExprId, keyword: &Token, method: &Token) -> RuntimeResult<Value> {
        let distance = self
            .locals
            .get(&id)
            .copied()
            .ok_or_else(|| RuntimeError::undefined_variable("super", keyword.line))?;

        let superclass = match Environment::get_at(&self.environment, distance, "super") {
            Some(Value::Class(class)) => class,
            _ => return Err(RuntimeError::undefined_variable("super", keyword.line)),
        };

        let this = distance
            .checked_sub(1)
            .and_then(|d| Environment::get_at(&self.environment, d, "this"))
            .ok_or_else(|| RuntimeError::undefined_variable("this", keyword.line))?;

        let method = superclass
            .find_method(&method.lexeme)
            .ok_or_else(|| RuntimeError::UndefinedProperty {
                name: method.lexeme.clone(),
                line: method.line,
            })?;

        Ok(Value::Function(Rc::new(method.bind(this))))
    }

    fn call_value(&mut self, callee: &Value, paren: &Token, arguments: Vec<Value>) -> RuntimeResult<Value> {
        let callable = callee
            .as_callable()
            .ok_or(RuntimeError::NotCallable { line: paren.line })?;

        if arguments.len() != callable.arity() {
            return Err(RuntimeError::ArityMismatch {
                expected: callable.arity(),
                got: arguments.len(),
                line: paren.line,
            });
        }

        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::StackOverflow {
                limit: self.max_call_depth,
                line: paren.line,
            });
        }

        debug!("Calling {}", callable.describe());

        self.call_depth += 1;
        let result = callable.call(self, arguments);
        self.call_depth -= 1;

        result
    }
}

/// `-x` negates a number.  `!x` is the arithmetic negation of the operand's
/// truthiness: `-1` when `x` is truthy, `-0` when it is falsy.
fn evaluate_unary(operator: &Token, right: Value) -> RuntimeResult<Value> {
    match operator.token_type {
        TokenType::MINUS => match right {
            Value::Number(n) => Ok(Value::Number(-n)),
            _ => Err(RuntimeError::type_mismatch(
                operator.line,
                "Operand must be a number.",
            )),
        },
        TokenType::BANG => {
            let truthiness = if right.is_truthy() { 1.0 } else { 0.0 };
            Ok(Value::Number(-truthiness))
        }
        _ => Err(RuntimeError::type_mismatch(
            operator.line,
            format!("Invalid unary operator '{}'.", operator.lexeme),
        )),
    }
}

fn evaluate_binary(left: Value, operator: &Token, right: Value) -> RuntimeResult<Value> {
    trace!("Binary {} {} {}", left, operator.lexeme, right);

    match operator.token_type {
        TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left == right)),
        TokenType::BANG_EQUAL => return Ok(Value::Bool(left != right)),
        TokenType::PLUS => {
            return match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(RuntimeError::type_mismatch(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )),
            }
        }
        _ => {}
    }

    let (a, b) = match (left, right) {
        (Value::Number(a), Value::Number(b)) => (a, b),
        _ => {
            return Err(RuntimeError::type_mismatch(
                operator.line,
                "Operands must be numbers.",
            ))
        }
    };

    match operator.token_type {
        TokenType::MINUS => Ok(Value::Number(a - b)),
        TokenType::STAR => Ok(Value::Number(a * b)),
        TokenType::SLASH if b == 0.0 => Err(RuntimeError::DivisionByZero {
            line: operator.line,
        }),
        TokenType::SLASH => Ok(Value::Number(a / b)),
        TokenType::GREATER => Ok(Value::Bool(a > b)),
        TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
        TokenType::LESS => Ok(Value::Bool(a < b)),
        TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
        _ => Err(RuntimeError::type_mismatch(
            operator.line,
            format!("Invalid binary operator '{}'.", operator.lexeme),
        )),
    }
}
