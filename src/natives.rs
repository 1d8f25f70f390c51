//! Host-provided globals: `clock()` and the fixed-size `Array(size)`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::{debug, info};

use crate::callable::Callable;
use crate::environment::Environment;
use crate::error::{RuntimeError, RuntimeResult};
use crate::interpreter::Interpreter;
use crate::stack::ensure_sufficient_stack;
use crate::token::Token;
use crate::value::Value;

/// Largest size `Array(size)` accepts.
pub const MAX_ARRAY_LEN: usize = 1 << 24;

type ElementsPtr = *const RefCell<Vec<Value>>;

/// Stateless native backed by a plain function pointer.
pub struct NativeFunction {
    name: &'static str,
    arity: usize,
    func: fn(&[Value]) -> RuntimeResult<Value>,
}

impl NativeFunction {
    pub const fn new(
        name: &'static str,
        arity: usize,
        func: fn(&[Value]) -> RuntimeResult<Value>,
    ) -> Self {
        Self { name, arity, func }
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> RuntimeResult<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(&arguments)
    }

    fn describe(&self) -> String {
        format!("<native fn {}>", self.name)
    }
}

/// Seed `globals` with every native binding.
pub fn define_globals(globals: &mut Environment) {
    info!("Defining native globals");

    globals.define("clock", Value::Native(Rc::new(NativeFunction::new("clock", 0, clock))));
    globals.define("Array", Value::Native(Rc::new(NativeFunction::new("Array", 1, array))));
}

/// Seconds since the Unix epoch.
fn clock(_args: &[Value]) -> RuntimeResult<Value> {
    let micros = chrono::Utc::now().timestamp_micros();

    Ok(Value::Number(micros as f64 / 1_000_000.0))
}

fn array(args: &[Value]) -> RuntimeResult<Value> {
    let size = as_index(&args[0], "Array size")?;

    if size > MAX_ARRAY_LEN {
        return Err(RuntimeError::native(format!(
            "Array size {} exceeds the maximum of {}.",
            args[0], MAX_ARRAY_LEN
        )));
    }

    LoxArray::new(size).map(Value::Array)
}

/// Non-negative integral number → `usize`.
fn as_index(value: &Value, what: &str) -> RuntimeResult<usize> {
    match value {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Ok(*n as usize),
        other => Err(RuntimeError::native(format!(
            "{} must be a non-negative integer, got {}.",
            what, other
        ))),
    }
}

/// Fixed-size array.  Behaves like an instance without a class: `length`,
/// `get` and `set` are its only properties and it has no writable fields.
#[derive(Debug, Clone)]
pub struct LoxArray {
    elements: Rc<RefCell<Vec<Value>>>,
}

impl LoxArray {
    /// `size` nils.  Fails instead of aborting when the allocation cannot
    /// be made.
    pub fn new(size: usize) -> RuntimeResult<Self> {
        let mut elements: Vec<Value> = Vec::new();

        elements.try_reserve_exact(size).map_err(|err| {
            RuntimeError::native(format!(
                "Cannot allocate an array of {} elements: {}.",
                size, err
            ))
        })?;
        elements.resize(size, Value::Nil);

        debug!("Allocated array of {} elements", size);

        Ok(Self {
            elements: Rc::new(RefCell::new(elements)),
        })
    }

    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element-wise equality.  A pair of arrays already being compared
    /// further up counts as equal, so cyclic arrays terminate.
    pub fn equals(&self, other: &LoxArray) -> bool {
        self.equals_within(other, &mut Vec::new())
    }

    fn equals_within(
        &self,
        other: &LoxArray,
        seen: &mut Vec<(ElementsPtr, ElementsPtr)>,
    ) -> bool {
        if Rc::ptr_eq(&self.elements, &other.elements) {
            return true;
        }

        let pair = (Rc::as_ptr(&self.elements), Rc::as_ptr(&other.elements));
        if seen.contains(&pair) {
            return true;
        }

        let left = self.elements.borrow();
        let right = other.elements.borrow();
        if left.len() != right.len() {
            return false;
        }

        seen.push(pair);
        let equal = left.iter().zip(right.iter()).all(|(a, b)| match (a, b) {
            (Value::Array(x), Value::Array(y)) => {
                ensure_sufficient_stack(|| x.equals_within(y, seen))
            }
            _ => a == b,
        });
        seen.pop();

        equal
    }

    /// Writes the elements; an array nested inside itself prints as `[...]`.
    fn render(&self, f: &mut fmt::Formatter<'_>, open: &mut Vec<ElementsPtr>) -> fmt::Result {
        let ptr = Rc::as_ptr(&self.elements);
        if open.contains(&ptr) {
            return f.write_str("[...]");
        }

        open.push(ptr);
        let elements = self.elements.borrow();

        f.write_str("[")?;
        for (i, element) in elements.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match element {
                Value::Array(inner) => ensure_sufficient_stack(|| inner.render(f, open))?,
                other => write!(f, "{}", other)?,
            }
        }
        open.pop();

        f.write_str("]")
    }

    pub fn get(&self, name: &Token) -> RuntimeResult<Value> {
        match name.lexeme.as_str() {
            "length" => Ok(Value::Number(self.len() as f64)),
            "get" => Ok(Value::Native(Rc::new(ArrayGet(self.clone())))),
            "set" => Ok(Value::Native(Rc::new(ArraySet(self.clone())))),
            _ => Err(RuntimeError::UndefinedProperty {
                name: name.lexeme.clone(),
                line: name.line,
            }),
        }
    }

    pub fn set(&self, name: &Token) -> RuntimeResult<Value> {
        Err(RuntimeError::InvalidProperty {
            message: "Can't add properties to arrays.".to_string(),
            line: name.line,
        })
    }

    fn checked_index(&self, value: &Value) -> RuntimeResult<usize> {
        let index = as_index(value, "Array index")?;
        let len = self.len();

        if index >= len {
            return Err(RuntimeError::native(format!(
                "Array index {} out of range for length {}.",
                index, len
            )));
        }

        Ok(index)
    }
}

impl fmt::Display for LoxArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, &mut Vec::new())
    }
}

struct ArrayGet(LoxArray);

impl Callable for ArrayGet {
    fn arity(&self) -> usize {
        1
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> RuntimeResult<Value> {
        let index = self.0.checked_index(&arguments[0])?;

        Ok(self.0.elements.borrow()[index].clone())
    }

    fn describe(&self) -> String {
        "<native fn get of Array>".to_string()
    }
}

struct ArraySet(LoxArray);

impl Callable for ArraySet {
    fn arity(&self) -> usize {
        2
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> RuntimeResult<Value> {
        let index = self.0.checked_index(&arguments[0])?;
        let value = arguments[1].clone();

        self.0.elements.borrow_mut()[index] = value.clone();

        Ok(value)
    }

    fn describe(&self) -> String {
        "<native fn set of Array>".to_string()
    }
}
