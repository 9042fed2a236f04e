//! Native functions: the `std` object and the targets of every operator.
//!
//! Builtins receive their arguments unforced and decide themselves what to
//! force; `&&` and `||` rely on that to short-circuit. Arity is fixed per
//! builtin and checked by the interpreter before the builtin runs, inside a
//! `builtin function <name>` frame.

mod operators;
mod std_lib;

use std::fmt;

use crate::errors::EvalResult;
use crate::{Deferred, Interpreter};

pub use operators::{binary_builtin, unary_builtin, PLUS};
pub use std_lib::{std_object, STD_BUILTINS};

pub type UnaryFn = fn(&mut Interpreter, &Deferred) -> EvalResult;
pub type BinaryFn = fn(&mut Interpreter, &Deferred, &Deferred) -> EvalResult;
pub type TernaryFn = fn(&mut Interpreter, &Deferred, &Deferred, &Deferred) -> EvalResult;

/// Implementation of a builtin, by arity.
#[derive(Copy, Clone)]
pub enum BuiltinFn {
    Unary(UnaryFn),
    Binary(BinaryFn),
    Ternary(TernaryFn),
}

/// A native function.
pub struct Builtin {
    pub name: &'static str,
    /// Parameter names, for named top-level arguments.
    pub params: &'static [&'static str],
    pub func: BuiltinFn,
}

impl Builtin {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({}/{})", self.name, self.arity())
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "Tests use expect for brevity")]
mod tests;
