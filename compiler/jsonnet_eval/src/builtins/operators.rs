//! Operator builtins.
//!
//! Every binary and unary operator maps to exactly one builtin. Arithmetic
//! results that are not finite are errors rather than values.

use jsonnet_ir::{BinaryOp, SourceLocation, UnaryOp};

use super::std_lib::values_equal;
use super::{Builtin, BuiltinFn};
use crate::errors::{
    binary_operand_mismatch, division_by_zero, negative_shift, not_a_number, overflow,
    unary_operand_mismatch, EvalResult,
};
use crate::{Deferred, Interpreter, ObjectValue, Value};

const XY: &[&str] = &["x", "y"];
const X: &[&str] = &["x"];

macro_rules! binary {
    ($static:ident, $name:literal, $func:ident) => {
        pub static $static: Builtin = Builtin {
            name: $name,
            params: XY,
            func: BuiltinFn::Binary($func),
        };
    };
}

macro_rules! unary {
    ($static:ident, $name:literal, $func:ident) => {
        pub static $static: Builtin = Builtin {
            name: $name,
            params: X,
            func: BuiltinFn::Unary($func),
        };
    };
}

binary!(MULT, "operator*", mult);
binary!(DIV, "operator/", div);
binary!(MODULO, "operator%", modulo);
binary!(PLUS, "operator+", plus);
binary!(MINUS, "operator-", minus);
binary!(SHIFT_L, "operator<<", shift_l);
binary!(SHIFT_R, "operator>>", shift_r);
binary!(LESS, "operator<", less);
binary!(LESS_EQ, "operator<=", less_eq);
binary!(GREATER, "operator>", greater);
binary!(GREATER_EQ, "operator>=", greater_eq);
binary!(EQUALS, "equals", equals);
binary!(NOT_EQUALS, "notEquals", not_equals);
binary!(BIT_AND, "operator&", bit_and);
binary!(BIT_XOR, "operator^", bit_xor);
binary!(BIT_OR, "operator|", bit_or);
binary!(AND, "operator&&", and);
binary!(OR, "operator||", or);

unary!(NOT, "operator!", not);
unary!(BIT_NOT, "operator~", bit_not);
unary!(UNARY_PLUS, "operator+", unary_plus);
unary!(UNARY_MINUS, "operator-", unary_minus);

/// The builtin an operator dispatches to.
pub fn binary_builtin(op: BinaryOp) -> &'static Builtin {
    match op {
        BinaryOp::Mul => &MULT,
        BinaryOp::Div => &DIV,
        BinaryOp::Mod => &MODULO,
        BinaryOp::Add => &PLUS,
        BinaryOp::Sub => &MINUS,
        BinaryOp::Shl => &SHIFT_L,
        BinaryOp::Shr => &SHIFT_R,
        BinaryOp::Lt => &LESS,
        BinaryOp::LtEq => &LESS_EQ,
        BinaryOp::Gt => &GREATER,
        BinaryOp::GtEq => &GREATER_EQ,
        BinaryOp::Eq => &EQUALS,
        BinaryOp::NotEq => &NOT_EQUALS,
        BinaryOp::BitAnd => &BIT_AND,
        BinaryOp::BitXor => &BIT_XOR,
        BinaryOp::BitOr => &BIT_OR,
        BinaryOp::And => &AND,
        BinaryOp::Or => &OR,
    }
}

pub fn unary_builtin(op: UnaryOp) -> &'static Builtin {
    match op {
        UnaryOp::Not => &NOT,
        UnaryOp::BitNot => &BIT_NOT,
        UnaryOp::Plus => &UNARY_PLUS,
        UnaryOp::Neg => &UNARY_MINUS,
    }
}

/// Reject NaN and infinities.
pub(super) fn checked_number(interp: &Interpreter, n: f64) -> EvalResult {
    if n.is_nan() {
        return Err(interp.builtin_error(not_a_number()));
    }
    if n.is_infinite() {
        return Err(interp.builtin_error(overflow()));
    }
    Ok(Value::Number(n))
}

fn numbers(
    interp: &mut Interpreter,
    x: &Deferred,
    y: &Deferred,
) -> Result<(f64, f64), crate::EvalError> {
    let x = interp.expect_number(x, SourceLocation::UNKNOWN)?;
    let y = interp.expect_number(y, SourceLocation::UNKNOWN)?;
    Ok((x, y))
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "bitwise operators work on the integer part, saturating"
)]
fn to_i64(n: f64) -> i64 {
    n as i64
}

#[expect(clippy::cast_precision_loss, reason = "results above 2^53 round")]
fn from_i64(n: i64) -> Value {
    Value::Number(n as f64)
}

// Arithmetic

fn mult(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    let (x, y) = numbers(interp, x, y)?;
    checked_number(interp, x * y)
}

fn div(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    let (x, y) = numbers(interp, x, y)?;
    if y == 0.0 {
        return Err(interp.builtin_error(division_by_zero()));
    }
    checked_number(interp, x / y)
}

pub(super) fn modulo(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    let (x, y) = numbers(interp, x, y)?;
    if y == 0.0 {
        return Err(interp.builtin_error(division_by_zero()));
    }
    checked_number(interp, x % y)
}

fn minus(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    let (x, y) = numbers(interp, x, y)?;
    checked_number(interp, x - y)
}

/// `+`: numbers add, strings and arrays concatenate, objects combine. A
/// string with anything else concatenates the other side's `toString`.
fn plus(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    let x = x.force(interp)?;
    let y = y.force(interp)?;
    match (x, y) {
        (Value::Number(a), Value::Number(b)) => checked_number(interp, a + b),
        (Value::Str(a), Value::Str(b)) => Ok(Value::string(&format!("{a}{b}"))),
        (Value::Str(a), other) => {
            let b = interp.to_display_string(&other)?;
            Ok(Value::string(&format!("{a}{b}")))
        }
        (other, Value::Str(b)) => {
            let a = interp.to_display_string(&other)?;
            Ok(Value::string(&format!("{a}{b}")))
        }
        (Value::Array(a), Value::Array(b)) => {
            Ok(Value::Array(a.iter().chain(b.iter()).cloned().collect()))
        }
        (Value::Object(a), Value::Object(b)) => Ok(Value::Object(ObjectValue::combine(a, b))),
        (a, b) => Err(interp.builtin_error(binary_operand_mismatch(
            "+",
            a.type_name(),
            b.type_name(),
        ))),
    }
}

// Shifts and bitwise operators

fn shift_l(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    let (x, y) = numbers(interp, x, y)?;
    if y < 0.0 {
        return Err(interp.builtin_error(negative_shift()));
    }
    let shift = u32::try_from(to_i64(y) & 63).unwrap_or(0);
    Ok(from_i64(to_i64(x).wrapping_shl(shift)))
}

fn shift_r(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    let (x, y) = numbers(interp, x, y)?;
    if y < 0.0 {
        return Err(interp.builtin_error(negative_shift()));
    }
    let shift = u32::try_from(to_i64(y) & 63).unwrap_or(0);
    Ok(from_i64(to_i64(x).wrapping_shr(shift)))
}

fn bit_and(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    let (x, y) = numbers(interp, x, y)?;
    Ok(from_i64(to_i64(x) & to_i64(y)))
}

fn bit_xor(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    let (x, y) = numbers(interp, x, y)?;
    Ok(from_i64(to_i64(x) ^ to_i64(y)))
}

fn bit_or(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    let (x, y) = numbers(interp, x, y)?;
    Ok(from_i64(to_i64(x) | to_i64(y)))
}

// Comparison

/// Ordering of two values: numbers, strings, or arrays of those
/// (lexicographic).
fn compare(
    interp: &mut Interpreter,
    op: &'static str,
    x: &Value,
    y: &Value,
) -> Result<std::cmp::Ordering, crate::EvalError> {
    use std::cmp::Ordering;

    match (x, y) {
        (Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b).unwrap_or(Ordering::Equal)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Array(a), Value::Array(b)) => {
            for (left, right) in a.iter().zip(b.iter()) {
                let left = left.force(interp)?;
                let right = right.force(interp)?;
                let ord = compare(interp, op, &left, &right)?;
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
            }
            Ok(a.len().cmp(&b.len()))
        }
        _ => Err(interp.builtin_error(binary_operand_mismatch(
            op,
            x.type_name(),
            y.type_name(),
        ))),
    }
}

fn ordered(
    interp: &mut Interpreter,
    op: &'static str,
    x: &Deferred,
    y: &Deferred,
    accept: fn(std::cmp::Ordering) -> bool,
) -> EvalResult {
    let x = x.force(interp)?;
    let y = y.force(interp)?;
    let ord = compare(interp, op, &x, &y)?;
    Ok(Value::Bool(accept(ord)))
}

fn less(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    ordered(interp, "<", x, y, std::cmp::Ordering::is_lt)
}

fn less_eq(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    ordered(interp, "<=", x, y, std::cmp::Ordering::is_le)
}

fn greater(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    ordered(interp, ">", x, y, std::cmp::Ordering::is_gt)
}

fn greater_eq(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    ordered(interp, ">=", x, y, std::cmp::Ordering::is_ge)
}

fn equals(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    let x = x.force(interp)?;
    let y = y.force(interp)?;
    Ok(Value::Bool(values_equal(interp, &x, &y)?))
}

fn not_equals(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    let x = x.force(interp)?;
    let y = y.force(interp)?;
    Ok(Value::Bool(!values_equal(interp, &x, &y)?))
}

// Logic

/// The right operand is only forced when the left is `true`.
fn and(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    if !interp.expect_boolean(x, SourceLocation::UNKNOWN)? {
        return Ok(Value::Bool(false));
    }
    Ok(Value::Bool(interp.expect_boolean(y, SourceLocation::UNKNOWN)?))
}

/// The right operand is only forced when the left is `false`.
fn or(interp: &mut Interpreter, x: &Deferred, y: &Deferred) -> EvalResult {
    if interp.expect_boolean(x, SourceLocation::UNKNOWN)? {
        return Ok(Value::Bool(true));
    }
    Ok(Value::Bool(interp.expect_boolean(y, SourceLocation::UNKNOWN)?))
}

// Unary

fn not(interp: &mut Interpreter, x: &Deferred) -> EvalResult {
    match x.force(interp)? {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        other => Err(interp.builtin_error(unary_operand_mismatch("!", other.type_name()))),
    }
}

fn bit_not(interp: &mut Interpreter, x: &Deferred) -> EvalResult {
    match x.force(interp)? {
        Value::Number(n) => Ok(from_i64(!to_i64(n))),
        other => Err(interp.builtin_error(unary_operand_mismatch("~", other.type_name()))),
    }
}

fn unary_plus(interp: &mut Interpreter, x: &Deferred) -> EvalResult {
    match x.force(interp)? {
        Value::Number(n) => Ok(Value::Number(n)),
        other => Err(interp.builtin_error(unary_operand_mismatch("+", other.type_name()))),
    }
}

fn unary_minus(interp: &mut Interpreter, x: &Deferred) -> EvalResult {
    match x.force(interp)? {
        Value::Number(n) => Ok(Value::Number(-n)),
        other => Err(interp.builtin_error(unary_operand_mismatch("-", other.type_name()))),
    }
}
