use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::callable::{Callable, LoxFunction};
use crate::class::{LoxClass, LoxInstance};
use crate::natives::LoxArray;
use crate::token::{format_number, LiteralValue};

/// Runtime value.  Scalars are stored inline; everything with identity is
/// behind an `Rc`, so cloning a `Value` never copies an object.
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<RefCell<LoxInstance>>),

    /// Host‑provided callable.
    Native(Rc<dyn Callable>),

    /// Host‑provided fixed-size array (a class‑less pseudo‑instance).
    Array(LoxArray),
}

impl Value {
    /// `nil` and `false` are falsy; everything else, `0` included, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// The call capability, if this value has one.
    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match self {
            Value::Function(f) => Some(&**f),
            Value::Class(c) => Some(c),
            Value::Native(n) => Some(&**n),
            _ => None,
        }
    }
}

impl From<LiteralValue> for Value {
    fn from(literal: LiteralValue) -> Self {
        match literal {
            LiteralValue::Number(n) => Value::Number(n),
            LiteralValue::Str(s) => Value::String(s),
            LiteralValue::Bool(b) => Value::Bool(b),
            LiteralValue::Nil => Value::Nil,
        }
    }
}

/// Value equality for scalars and arrays, identity for other objects.
/// Never fails.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            (Value::Array(a), Value::Array(b)) => a.equals(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Function(func) => f.write_str(&func.describe()),
            Value::Class(class) => f.write_str(&class.name),
            Value::Instance(instance) => write!(f, "{}", instance.borrow()),
            Value::Native(native) => f.write_str(&native.describe()),
            Value::Array(array) => write!(f, "{}", array),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_keep_one_decimal() {
        assert_eq!(Value::Number(9.0).to_string(), "9.0");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(-3.0).to_string(), "-3.0");
        assert_eq!(Value::Number(-0.0).to_string(), "-0.0");
    }

    #[test]
    fn zero_is_truthy() {
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
    }

    #[test]
    fn equality_never_crosses_types() {
        assert_ne!(Value::Number(1.0), Value::Bool(true));
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_eq!(Value::String("a".into()), Value::String("a".into()));
    }
}
