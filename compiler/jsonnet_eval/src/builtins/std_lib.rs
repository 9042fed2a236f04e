//! The native half of the standard library, bound as `std`.

use jsonnet_ir::{Hide, SourceLocation, StringInterner};
use jsonnet_stack::ensure_sufficient_stack;
use rustc_hash::FxHashMap;
use smallvec::smallvec;

use super::operators::{checked_number, modulo};
use super::{Builtin, BuiltinFn};
use crate::errors::{bad_builtin_argument, function_equality, EvalError, EvalResult};
use crate::object::{ObjectField, UnboundField};
use crate::{BindingFrame, Deferred, FunctionValue, Interpreter, ObjectValue, Value};

macro_rules! std_builtin {
    ($static:ident, $name:literal, [$($param:literal),*], $kind:ident($func:ident)) => {
        static $static: Builtin = Builtin {
            name: $name,
            params: &[$($param),*],
            func: BuiltinFn::$kind($func),
        };
    };
}

std_builtin!(LENGTH, "length", ["x"], Unary(length));
std_builtin!(TYPE, "type", ["x"], Unary(type_of));
std_builtin!(TO_STRING, "toString", ["a"], Unary(to_string));
std_builtin!(CODEPOINT, "codepoint", ["str"], Unary(codepoint));
std_builtin!(CHAR, "char", ["n"], Unary(chr));
std_builtin!(MAKE_ARRAY, "makeArray", ["sz", "func"], Binary(make_array));
std_builtin!(FILTER, "filter", ["func", "arr"], Binary(filter));
std_builtin!(FLOOR, "floor", ["x"], Unary(floor));
std_builtin!(CEIL, "ceil", ["x"], Unary(ceil));
std_builtin!(SQRT, "sqrt", ["x"], Unary(sqrt));
std_builtin!(POW, "pow", ["x", "n"], Binary(pow));
std_builtin!(EXP, "exp", ["x"], Unary(exp));
std_builtin!(LOG, "log", ["x"], Unary(log));
std_builtin!(MODULO, "modulo", ["x", "y"], Binary(modulo));
std_builtin!(PRIMITIVE_EQUALS, "primitiveEquals", ["x", "y"], Binary(primitive_equals));
std_builtin!(EQUALS, "equals", ["x", "y"], Binary(equals));
std_builtin!(OBJECT_FIELDS_EX, "objectFieldsEx", ["obj", "hidden"], Binary(object_fields_ex));
std_builtin!(OBJECT_HAS_EX, "objectHasEx", ["obj", "fname", "hidden"], Ternary(object_has_ex));
std_builtin!(EXT_VAR, "extVar", ["x"], Unary(ext_var));

/// Every builtin reachable through `std`.
pub static STD_BUILTINS: &[&Builtin] = &[
    &LENGTH,
    &TYPE,
    &TO_STRING,
    &CODEPOINT,
    &CHAR,
    &MAKE_ARRAY,
    &FILTER,
    &FLOOR,
    &CEIL,
    &SQRT,
    &POW,
    &EXP,
    &LOG,
    &MODULO,
    &PRIMITIVE_EQUALS,
    &EQUALS,
    &OBJECT_FIELDS_EX,
    &OBJECT_HAS_EX,
    &EXT_VAR,
];

/// Build the `std` object: one hidden field per builtin.
pub fn std_object(interner: &StringInterner) -> ObjectValue {
    let fields: FxHashMap<_, _> = STD_BUILTINS
        .iter()
        .map(|&builtin| {
            (
                interner.intern(builtin.name),
                ObjectField {
                    hide: Hide::Hidden,
                    field: UnboundField::Ready(Value::Function(FunctionValue::Builtin(builtin))),
                },
            )
        })
        .collect();
    ObjectValue::simple(BindingFrame::empty(), fields, Vec::new())
}

const HERE: SourceLocation = SourceLocation::UNKNOWN;

fn length(interp: &mut Interpreter, x: &Deferred) -> EvalResult {
    #[expect(clippy::cast_precision_loss, reason = "lengths stay far below 2^53")]
    let len = |n: usize| Value::Number(n as f64);
    match x.force(interp)? {
        Value::Str(s) => Ok(len(s.chars().count())),
        Value::Array(elems) => Ok(len(elems.len())),
        Value::Object(obj) => Ok(len(obj.fields(false).len())),
        Value::Function(func) => Ok(len(func.arity())),
        other => Err(interp.builtin_error(bad_builtin_argument(
            "length",
            format!(
                "operates on strings, objects, and arrays, got {}",
                other.type_name()
            ),
        ))),
    }
}

fn type_of(interp: &mut Interpreter, x: &Deferred) -> EvalResult {
    let value = x.force(interp)?;
    Ok(Value::string(value.type_name()))
}

fn to_string(interp: &mut Interpreter, a: &Deferred) -> EvalResult {
    let value = a.force(interp)?;
    if let Value::Str(_) = value {
        return Ok(value);
    }
    let text = interp.to_display_string(&value)?;
    Ok(Value::string(&text))
}

fn codepoint(interp: &mut Interpreter, s: &Deferred) -> EvalResult {
    let s = interp.expect_string(s, HERE)?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Number(f64::from(u32::from(c)))),
        _ => Err(interp.builtin_error(bad_builtin_argument(
            "codepoint",
            format!("takes a string of length 1, got length {}", s.chars().count()),
        ))),
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "range checked before the cast"
)]
fn chr(interp: &mut Interpreter, n: &Deferred) -> EvalResult {
    let n = interp.expect_number(n, HERE)?;
    if n < 0.0 {
        return Err(interp.builtin_error(bad_builtin_argument(
            "char",
            format!("Codepoints must be >= 0, got {n}"),
        )));
    }
    match (n <= f64::from(u32::MAX))
        .then(|| char::from_u32(n as u32))
        .flatten()
    {
        Some(c) => Ok(Value::string(c.encode_utf8(&mut [0; 4]))),
        None => Err(interp.builtin_error(bad_builtin_argument(
            "char",
            format!("Invalid unicode codepoint, got {n}"),
        ))),
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "size checked to be a non-negative integer"
)]
fn make_array(interp: &mut Interpreter, sz: &Deferred, func: &Deferred) -> EvalResult {
    let size = interp.expect_number(sz, HERE)?;
    if size.fract() != 0.0 {
        return Err(interp.builtin_error(bad_builtin_argument(
            "makeArray",
            format!("requires size to be an integer, got {size}"),
        )));
    }
    if size < 0.0 {
        return Err(interp.builtin_error(bad_builtin_argument(
            "makeArray",
            format!("requires size >= 0, got {size}"),
        )));
    }
    let func = interp.expect_function(func, HERE)?;
    let elements: Vec<Deferred> = (0..size as usize)
        .map(|i| {
            let index = Deferred::Ready(Value::Number(i as f64));
            Deferred::call(func.clone(), smallvec![index], HERE)
        })
        .collect();
    Ok(Value::Array(elements.into()))
}

fn filter(interp: &mut Interpreter, func: &Deferred, arr: &Deferred) -> EvalResult {
    let func = interp.expect_function(func, HERE)?;
    let elements = interp.expect_array(arr, HERE)?;
    let mut kept = Vec::with_capacity(elements.len());
    for element in elements.iter() {
        match interp.call_function(&func, std::slice::from_ref(element), HERE)? {
            Value::Bool(true) => kept.push(element.clone()),
            Value::Bool(false) => {}
            other => {
                return Err(interp.builtin_error(bad_builtin_argument(
                    "filter",
                    format!("function must return boolean, got: {}", other.type_name()),
                )))
            }
        }
    }
    Ok(Value::Array(kept.into()))
}

fn math_unary(interp: &mut Interpreter, x: &Deferred, op: fn(f64) -> f64) -> EvalResult {
    let x = interp.expect_number(x, HERE)?;
    checked_number(interp, op(x))
}

fn floor(interp: &mut Interpreter, x: &Deferred) -> EvalResult {
    math_unary(interp, x, f64::floor)
}

fn ceil(interp: &mut Interpreter, x: &Deferred) -> EvalResult {
    math_unary(interp, x, f64::ceil)
}

fn sqrt(interp: &mut Interpreter, x: &Deferred) -> EvalResult {
    math_unary(interp, x, f64::sqrt)
}

fn exp(interp: &mut Interpreter, x: &Deferred) -> EvalResult {
    math_unary(interp, x, f64::exp)
}

fn log(interp: &mut Interpreter, x: &Deferred) -> EvalResult {
    math_unary(interp, x, f64::ln)
}

fn pow(interp: &mut Interpreter, x: &Deferred, n: &Deferred) -> EvalResult {
    let x = interp.expect_number(x, HERE)?;
    let n = interp.expect_number(n, HERE)?;
    checked_number(interp, x.powf(n))
}

fn primitive_equals(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    let x = x.force(interp)?;
    let y = y.force(interp)?;
    if x.type_name() != y.type_name() {
        return Ok(Value::Bool(false));
    }
    let equal = match (&x, &y) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Function(_), _) => return Err(interp.builtin_error(function_equality())),
        _ => {
            return Err(interp.builtin_error(bad_builtin_argument(
                "primitiveEquals",
                format!("operates on primitive types, got {}", x.type_name()),
            )))
        }
    };
    Ok(Value::Bool(equal))
}

fn equals(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    let x = x.force(interp)?;
    let y = y.force(interp)?;
    Ok(Value::Bool(values_equal(interp, &x, &y)?))
}

/// Deep structural equality. Values of different types are unequal;
/// comparing two functions is an error.
pub(crate) fn values_equal(
    interp: &mut Interpreter,
    x: &Value,
    y: &Value,
) -> Result<bool, EvalError> {
    ensure_sufficient_stack(|| match (x, y) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Number(a), Value::Number(b)) => Ok(a == b),
        (Value::Str(a), Value::Str(b)) => Ok(a == b),
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return Ok(false);
            }
            for (left, right) in a.iter().zip(b.iter()) {
                let left = left.force(interp)?;
                let right = right.force(interp)?;
                if !values_equal(interp, &left, &right)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Object(a), Value::Object(b)) => {
            let fields = interp.sorted_fields(a, false);
            if fields != interp.sorted_fields(b, false) {
                return Ok(false);
            }
            for name in fields {
                let left = interp.object_index(a, 0, name, HERE)?;
                let right = interp.object_index(b, 0, name, HERE)?;
                if !values_equal(interp, &left, &right)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Function(_), Value::Function(_)) => {
            Err(interp.builtin_error(function_equality()))
        }
        _ => Ok(false),
    })
}

fn object_fields_ex(interp: &mut Interpreter, obj: &Deferred, hidden: &Deferred) -> EvalResult {
    let obj = interp.expect_object(obj, HERE)?;
    let include_hidden = interp.expect_boolean(hidden, HERE)?;
    let names = interp.sorted_fields(&obj, include_hidden);
    let interner = interp.interner().clone();
    Ok(Value::array(
        names.into_iter().map(|name| Value::string(interner.lookup(name))),
    ))
}

fn object_has_ex(
    interp: &mut Interpreter,
    obj: &Deferred,
    fname: &Deferred,
    hidden: &Deferred,
) -> EvalResult {
    let obj = interp.expect_object(obj, HERE)?;
    let fname = interp.expect_string(fname, HERE)?;
    let include_hidden = interp.expect_boolean(hidden, HERE)?;
    let name = interp.interner().intern(&fname);
    Ok(Value::Bool(obj.has_field(name, include_hidden)))
}

fn ext_var(interp: &mut Interpreter, x: &Deferred) -> EvalResult {
    let name = interp.expect_string(x, HERE)?;
    let name = interp.interner().intern(&name);
    interp.ext_var(name)
}
