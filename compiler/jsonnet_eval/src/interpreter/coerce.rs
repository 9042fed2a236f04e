//! Type-coercion helpers.
//!
//! `expect_*` forces a deferred and checks its type; `*_value` checks an
//! already forced value. A mismatch is a runtime error naming both the
//! expected and the actual type.

use std::rc::Rc;

use jsonnet_ir::SourceLocation;

use super::Interpreter;
use crate::errors::{type_mismatch, EvalError};
use crate::{Deferred, FunctionValue, ObjectValue, Value};

macro_rules! coercions {
    ($($expect:ident, $check:ident: $variant:ident => $ty:ty, $expected:literal;)*) => {
        $(
            pub(crate) fn $check(&self, value: Value, site: SourceLocation) -> Result<$ty, EvalError> {
                match value {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(self.runtime_error(type_mismatch($expected, other.type_name()), site)),
                }
            }

            pub(crate) fn $expect(&mut self, deferred: &Deferred, site: SourceLocation) -> Result<$ty, EvalError> {
                let value = deferred.force(self)?;
                self.$check(value, site)
            }
        )*
    };
}

impl Interpreter {
    coercions! {
        expect_number, number_value: Number => f64, "number";
        expect_string, string_value: Str => Rc<str>, "string";
        expect_boolean, boolean_value: Bool => bool, "boolean";
        expect_array, array_value: Array => Rc<[Deferred]>, "array";
        expect_function, function_value: Function => FunctionValue, "function";
        expect_object, object_value: Object => ObjectValue, "object";
    }
}
