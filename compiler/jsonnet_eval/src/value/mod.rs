//! Runtime values.
//!
//! Values are immutable and cheap to clone: compound payloads sit behind
//! `Rc`. Array elements and object fields stay deferred until something
//! forces them.

use std::fmt;
use std::rc::Rc;

use jsonnet_ir::{ExprId, ParamRange, SharedArena, SourceLocation};

use crate::builtins::Builtin;
use crate::{Deferred, Environment, ObjectValue};

/// A forced value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    /// Elements are deferred; order and identity are preserved.
    Array(Rc<[Deferred]>),
    Function(FunctionValue),
    Object(ObjectValue),
}

impl Value {
    /// Type name as reported by `std.type` and in error messages.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
            Value::Object(_) => "object",
        }
    }

    pub fn string(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    /// Array of already-forced elements.
    pub fn array(elements: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(elements.into_iter().map(Deferred::Ready).collect())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Array(elems) => write!(f, "Array(len={})", elems.len()),
            Value::Function(func) => write!(f, "{func:?}"),
            Value::Object(obj) => write!(f, "{obj:?}"),
        }
    }
}

/// A user-defined function together with its captured environment.
pub struct Closure {
    pub env: Environment,
    /// Arena the body lives in.
    pub arena: SharedArena,
    pub params: ParamRange,
    pub body: ExprId,
    /// Where the function literal was written.
    pub location: SourceLocation,
}

impl Closure {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Anything callable.
#[derive(Clone)]
pub enum FunctionValue {
    Closure(Rc<Closure>),
    Builtin(&'static Builtin),
}

impl FunctionValue {
    pub fn arity(&self) -> usize {
        match self {
            FunctionValue::Closure(closure) => closure.arity(),
            FunctionValue::Builtin(builtin) => builtin.arity(),
        }
    }
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionValue::Closure(closure) => {
                write!(f, "Closure(arity={})", closure.arity())
            }
            FunctionValue::Builtin(builtin) => write!(f, "Builtin({})", builtin.name),
        }
    }
}
