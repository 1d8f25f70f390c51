//! The call capability and user-defined functions.

use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use crate::error::{RuntimeError, RuntimeResult};
use crate::interpreter::{Completion, Interpreter};
use crate::value::Value;

/// Anything that can appear in callee position.
///
/// The interpreter checks `arguments.len() == arity()` before every call, so
/// implementations may index `arguments` freely.
pub trait Callable {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> RuntimeResult<Value>;

    fn describe(&self) -> String;
}

/// A `fun` declaration or method paired with the frame it closes over.
#[derive(Debug)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// Same declaration, new closure: one extra frame binding `this` to
    /// `instance`, sitting between the method and its class‑time closure.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        let env = Environment::shared(Some(Rc::clone(&self.closure)));
        env.borrow_mut().define("this", instance);

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: env,
            is_initializer: self.is_initializer,
        }
    }

    fn bound_this(&self) -> RuntimeResult<Value> {
        Environment::get_at(&self.closure, 0, "this")
            .ok_or_else(|| RuntimeError::undefined_variable("this", self.declaration.name.line))
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> RuntimeResult<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        let env = Environment::shared(Some(Rc::clone(&self.closure)));

        {
            let mut frame = env.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                frame.define(&param.lexeme, argument);
            }
        }

        let completion = interpreter.execute_block(&self.declaration.body, env)?;

        if self.is_initializer {
            return self.bound_this();
        }

        Ok(match completion {
            Completion::Return(value) => value,
            Completion::Normal => Value::Nil,
        })
    }

    fn describe(&self) -> String {
        format!("<fn {}>", self.name())
    }
}
