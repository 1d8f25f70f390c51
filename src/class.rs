//! Classes and their instances.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::{Callable, LoxFunction};
use crate::error::{RuntimeError, RuntimeResult};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// Name of the method that designates the constructor.
pub const INITIALIZER: &str = "init";

#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    /// Own methods first, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }
}

/// A class is called through its `Rc` so the new instance can point back
/// at it.
impl Callable for Rc<LoxClass> {
    fn arity(&self) -> usize {
        self.find_method(INITIALIZER)
            .map_or(0, |initializer| initializer.arity())
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> RuntimeResult<Value> {
        debug!("Instantiating class '{}'", self.name);

        let instance = Value::Instance(Rc::new(RefCell::new(LoxInstance::new(Rc::clone(self)))));

        if let Some(initializer) = self.find_method(INITIALIZER) {
            initializer
                .bind(instance.clone())
                .call(interpreter, arguments)?;
        }

        Ok(instance)
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug)]
pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Property read: own fields shadow methods; methods come back bound to
    /// `instance`.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> RuntimeResult<Value> {
        let this = instance.borrow();

        if let Some(value) = this.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        match this.class.find_method(&name.lexeme) {
            Some(method) => {
                let bound = method.bind(Value::Instance(Rc::clone(instance)));
                Ok(Value::Function(Rc::new(bound)))
            }

            None => Err(RuntimeError::UndefinedProperty {
                name: name.lexeme.clone(),
                line: name.line,
            }),
        }
    }

    /// Fields are created on first write.
    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Display for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class.name)
    }
}
