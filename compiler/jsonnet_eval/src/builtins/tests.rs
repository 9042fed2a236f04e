use jsonnet_ir::{BinaryOp, SourceLocation, UnaryOp};
use pretty_assertions::assert_eq;

use super::*;
use crate::errors::{EvalError, RuntimeErrorKind};
use crate::{FunctionValue, Value};

fn call(builtin: &'static Builtin, args: &[Value]) -> Result<Value, EvalError> {
    let mut interp = Interpreter::builder().build();
    let args: Vec<Deferred> = args.iter().cloned().map(Deferred::Ready).collect();
    interp.call_function(
        &FunctionValue::Builtin(builtin),
        &args,
        SourceLocation::UNKNOWN,
    )
}

fn std_fn(name: &str) -> &'static Builtin {
    STD_BUILTINS
        .iter()
        .copied()
        .find(|b| b.name == name)
        .expect("std function exists")
}

fn binop(op: BinaryOp, x: Value, y: Value) -> Result<Value, EvalError> {
    call(binary_builtin(op), &[x, y])
}

fn num(result: Result<Value, EvalError>) -> f64 {
    result
        .expect("builtin succeeds")
        .as_number()
        .expect("a number")
}

fn boolean(result: Result<Value, EvalError>) -> bool {
    result
        .expect("builtin succeeds")
        .as_bool()
        .expect("a boolean")
}

fn string(result: Result<Value, EvalError>) -> String {
    result
        .expect("builtin succeeds")
        .as_str()
        .expect("a string")
        .to_string()
}

fn n(x: f64) -> Value {
    Value::Number(x)
}

#[test]
fn test_operator_names() {
    assert_eq!(binary_builtin(BinaryOp::Add).name, "operator+");
    assert_eq!(binary_builtin(BinaryOp::Eq).name, "equals");
    assert_eq!(binary_builtin(BinaryOp::NotEq).name, "notEquals");
    assert_eq!(binary_builtin(BinaryOp::Or).name, "operator||");
    assert_eq!(unary_builtin(UnaryOp::Neg).name, "operator-");
    assert!(std::ptr::eq(binary_builtin(BinaryOp::Add), &PLUS));
}

#[test]
fn test_arithmetic() {
    assert_eq!(num(binop(BinaryOp::Mul, n(6.0), n(7.0))), 42.0);
    assert_eq!(num(binop(BinaryOp::Div, n(7.0), n(2.0))), 3.5);
    assert_eq!(num(binop(BinaryOp::Sub, n(1.0), n(3.0))), -2.0);
    assert_eq!(num(binop(BinaryOp::Mod, n(7.0), n(3.0))), 1.0);
    assert_eq!(num(binop(BinaryOp::Mod, n(-7.0), n(3.0))), -1.0);
}

#[test]
fn test_division_by_zero() {
    for op in [BinaryOp::Div, BinaryOp::Mod] {
        let err = binop(op, n(1.0), n(0.0)).expect_err("zero divisor");
        assert_eq!(err.runtime_kind(), Some(&RuntimeErrorKind::DivisionByZero));
    }
}

#[test]
fn test_bitwise_and_shifts() {
    assert_eq!(num(binop(BinaryOp::BitAnd, n(12.0), n(10.0))), 8.0);
    assert_eq!(num(binop(BinaryOp::BitOr, n(12.0), n(10.0))), 14.0);
    assert_eq!(num(binop(BinaryOp::BitXor, n(12.0), n(10.0))), 6.0);
    assert_eq!(num(binop(BinaryOp::Shl, n(1.0), n(4.0))), 16.0);
    assert_eq!(num(binop(BinaryOp::Shr, n(-16.0), n(2.0))), -4.0);
    assert_eq!(num(call(unary_builtin(UnaryOp::BitNot), &[n(0.0)])), -1.0);

    let err = binop(BinaryOp::Shl, n(1.0), n(-1.0)).expect_err("negative shift");
    assert_eq!(err.runtime_kind(), Some(&RuntimeErrorKind::NegativeShift));
}

#[test]
fn test_plus_dispatch() {
    assert_eq!(
        string(binop(BinaryOp::Add, Value::string("a"), Value::string("b"))),
        "ab"
    );
    assert_eq!(string(binop(BinaryOp::Add, Value::string("n="), n(1.5))), "n=1.5");
    assert_eq!(string(binop(BinaryOp::Add, Value::Null, Value::string("!"))), "null!");
    assert_eq!(
        string(binop(
            BinaryOp::Add,
            Value::string(""),
            Value::array([n(1.0), Value::string("x")])
        )),
        r#"[1, "x"]"#
    );

    let joined = binop(
        BinaryOp::Add,
        Value::array([n(1.0)]),
        Value::array([n(2.0), n(3.0)]),
    )
    .expect("array concat");
    let Value::Array(elements) = joined else {
        panic!("expected an array");
    };
    assert_eq!(elements.len(), 3);
}

#[test]
fn test_comparison() {
    assert!(boolean(binop(BinaryOp::Lt, n(1.0), n(2.0))));
    assert!(boolean(binop(BinaryOp::GtEq, n(2.0), n(2.0))));
    assert!(boolean(binop(
        BinaryOp::Lt,
        Value::string("abc"),
        Value::string("abd")
    )));
    assert!(boolean(binop(
        BinaryOp::Lt,
        Value::array([n(1.0), n(2.0)]),
        Value::array([n(1.0), n(2.0), n(0.0)])
    )));

    let err = binop(BinaryOp::Lt, n(1.0), Value::string("a")).expect_err("mixed types");
    assert_eq!(
        err.runtime_kind(),
        Some(&RuntimeErrorKind::BinaryOperandMismatch {
            op: "<",
            left: "number",
            right: "string",
        })
    );
}

#[test]
fn test_equality() {
    assert!(boolean(binop(
        BinaryOp::Eq,
        Value::array([n(1.0), Value::string("a")]),
        Value::array([n(1.0), Value::string("a")])
    )));
    assert!(!boolean(binop(BinaryOp::Eq, n(1.0), Value::string("1"))));
    assert!(boolean(binop(BinaryOp::NotEq, Value::Null, Value::Bool(false))));

    let f = Value::Function(FunctionValue::Builtin(std_fn("floor")));
    let err = binop(BinaryOp::Eq, f.clone(), f).expect_err("functions");
    assert_eq!(err.runtime_kind(), Some(&RuntimeErrorKind::FunctionEquality));
}

#[test]
fn test_logic_requires_booleans() {
    let err = binop(BinaryOp::And, n(1.0), Value::Bool(true)).expect_err("number lhs");
    assert_eq!(
        err.runtime_kind(),
        Some(&RuntimeErrorKind::TypeMismatch {
            expected: "boolean",
            got: "number",
        })
    );
    assert!(!boolean(call(unary_builtin(UnaryOp::Not), &[Value::Bool(true)])));
    assert_eq!(num(call(unary_builtin(UnaryOp::Neg), &[n(3.0)])), -3.0);
}

#[test]
fn test_std_math() {
    assert_eq!(num(call(std_fn("floor"), &[n(2.7)])), 2.0);
    assert_eq!(num(call(std_fn("ceil"), &[n(2.1)])), 3.0);
    assert_eq!(num(call(std_fn("sqrt"), &[n(16.0)])), 4.0);
    assert_eq!(num(call(std_fn("pow"), &[n(2.0), n(10.0)])), 1024.0);
    assert_eq!(num(call(std_fn("exp"), &[n(0.0)])), 1.0);
    assert_eq!(num(call(std_fn("log"), &[n(1.0)])), 0.0);
    assert_eq!(num(call(std_fn("modulo"), &[n(10.0), n(4.0)])), 2.0);

    let err = call(std_fn("sqrt"), &[n(-1.0)]).expect_err("not a number");
    assert_eq!(err.runtime_kind(), Some(&RuntimeErrorKind::NotANumber));
    let err = call(std_fn("log"), &[n(0.0)]).expect_err("-inf");
    assert_eq!(err.runtime_kind(), Some(&RuntimeErrorKind::Overflow));
}

#[test]
fn test_std_strings() {
    assert_eq!(num(call(std_fn("codepoint"), &[Value::string("A")])), 65.0);
    assert_eq!(string(call(std_fn("char"), &[n(955.0)])), "λ");
    assert_eq!(string(call(std_fn("type"), &[Value::Null])), "null");
    assert_eq!(string(call(std_fn("toString"), &[n(1.0)])), "1");
    assert_eq!(num(call(std_fn("length"), &[Value::string("héllo")])), 5.0);

    let err = call(std_fn("codepoint"), &[Value::string("ab")]).expect_err("two chars");
    assert_eq!(
        err.to_string(),
        "RUNTIME ERROR: codepoint: takes a string of length 1, got length 2"
    );
}

#[test]
fn test_std_length_rejects_numbers() {
    let err = call(std_fn("length"), &[n(1.0)]).expect_err("numbers have no length");
    assert_eq!(
        err.to_string(),
        "RUNTIME ERROR: length: operates on strings, objects, and arrays, got number"
    );
}

#[test]
fn test_primitive_equals() {
    assert!(boolean(call(
        std_fn("primitiveEquals"),
        &[Value::string("a"), Value::string("a")]
    )));
    assert!(!boolean(call(std_fn("primitiveEquals"), &[n(1.0), Value::Null])));
    let err = call(
        std_fn("primitiveEquals"),
        &[Value::array([]), Value::array([])],
    )
    .expect_err("arrays are not primitive");
    assert_eq!(
        err.to_string(),
        "RUNTIME ERROR: primitiveEquals: operates on primitive types, got array"
    );
}

#[test]
fn test_builtin_frame_in_trace() {
    let err = call(std_fn("sqrt"), &[Value::string("x")]).expect_err("type error");
    let trace = err
        .as_runtime()
        .and_then(|e| e.backtrace.as_ref())
        .expect("trace");
    assert_eq!(trace.frames()[0].name, "builtin function <sqrt>");
}

#[test]
fn test_equality_frames_are_named_after_builtins() {
    let f = Value::Function(FunctionValue::Builtin(std_fn("floor")));
    for (op, name) in [
        (BinaryOp::Eq, "builtin function <equals>"),
        (BinaryOp::NotEq, "builtin function <notEquals>"),
    ] {
        let err = binop(op, f.clone(), f.clone()).expect_err("functions");
        let trace = err
            .as_runtime()
            .and_then(|e| e.backtrace.as_ref())
            .expect("trace");
        assert_eq!(trace.frames()[0].name, name);
    }
}

#[test]
fn test_std_object_fields_are_hidden() {
    let interp = Interpreter::builder().build();
    let std = interp.std_object();
    assert!(std.fields(false).is_empty());
    assert_eq!(std.fields(true).len(), STD_BUILTINS.len());
}
