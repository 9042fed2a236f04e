use jsonnet_ir::{BinaryOp, UnaryOp};
use pretty_assertions::assert_eq;

use super::{runtime_message, Fixture};
use crate::errors::RuntimeErrorKind;
use crate::EvalError;

#[test]
fn self_outside_object() {
    let mut fx = Fixture::new();
    let root = fx.arena.self_ref();
    assert_eq!(
        runtime_message(fx.run(root)),
        "Can't use self outside of an object."
    );
}

#[test]
fn super_outside_object() {
    let mut fx = Fixture::new();
    let root = fx.super_dot("f");
    assert_eq!(
        runtime_message(fx.run(root)),
        "Can't use super outside of an object."
    );
}

#[test]
fn super_without_parent_field() {
    // { a: super.a }.a
    let mut fx = Fixture::new();
    let sup = fx.super_dot("a");
    let fields = [fx.field("a", sup)];
    let obj = fx.object(&fields);
    let root = fx.dot(obj, "a");
    assert_eq!(runtime_message(fx.run(root)), "Field does not exist: a");
}

#[test]
fn missing_field() {
    // { x: 1 }.y
    let mut fx = Fixture::new();
    let one = fx.num(1.0);
    let fields = [fx.field("x", one)];
    let obj = fx.object(&fields);
    let root = fx.dot(obj, "y");
    assert_eq!(runtime_message(fx.run(root)), "Field does not exist: y");
}

#[test]
fn user_error_carries_trace() {
    // local f = function() error "bad"; f()
    let mut fx = Fixture::new();
    let bad = fx.error("bad");
    let def = fx.function(&[], bad);
    let f = fx.var("f");
    let call = fx.arena.apply(f, &[]);
    let root = fx.local(&[("f", def)], call);

    let err = fx.run(root).expect_err("error raised");
    let runtime = err.as_runtime().expect("runtime error");
    assert_eq!(runtime.message, "bad");
    let trace = runtime.backtrace.as_ref().expect("trace attached");
    let names: Vec<&str> = trace.frames().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["function <anonymous>", "function <anonymous>", "<main>"]);
}

#[test]
fn infinite_recursion_hits_stack_limit() {
    // local f = function(x) f(x); f(1)
    let build = || {
        let mut fx = Fixture::new();
        let f = fx.var("f");
        let x = fx.var("x");
        let rec = fx.arena.apply(f, &[x]);
        let def = fx.function(&["x"], rec);
        let f = fx.var("f");
        let one = fx.num(1.0);
        let call = fx.arena.apply(f, &[one]);
        let root = fx.local(&[("f", def)], call);
        fx.run_with(root, |b| b.max_stack(40))
    };

    let trace_len = |result: Result<String, EvalError>| {
        let err = result.expect_err("recursion never ends");
        assert_eq!(
            err.runtime_kind(),
            Some(&RuntimeErrorKind::StackOverflow { limit: 40 })
        );
        assert_eq!(err.to_string(), "RUNTIME ERROR: Max stack frames exceeded.");
        err.as_runtime()
            .and_then(|e| e.backtrace.as_ref())
            .map(crate::EvalBacktrace::len)
            .expect("overflow carries a backtrace")
    };

    let first = trace_len(build());
    let second = trace_len(build());
    assert_eq!(first, 41);
    assert_eq!(first, second);
}

#[test]
fn deep_recursion_with_large_limit_does_not_crash_host() {
    // local f = function(n) if n == 0 then 0 else f(n - 1); f(5000)
    let mut fx = Fixture::new();
    let n = fx.var("n");
    let zero = fx.num(0.0);
    let done = fx.binary(BinaryOp::Eq, n, zero);
    let base = fx.num(0.0);
    let f = fx.var("f");
    let n2 = fx.var("n");
    let one = fx.num(1.0);
    let pred = fx.binary(BinaryOp::Sub, n2, one);
    let rec = fx.arena.apply(f, &[pred]);
    let body = fx.arena.conditional(done, base, rec);
    let def = fx.function(&["n"], body);
    let f = fx.var("f");
    let start = fx.num(5000.0);
    let call = fx.arena.apply(f, &[start]);
    let root = fx.local(&[("f", def)], call);
    let out = fx
        .run_with(root, |b| b.max_stack(100_000))
        .expect("fits in the frame limit");
    assert_eq!(out, "0\n");
}

#[test]
fn arity_mismatch() {
    // (function(x) x)(1, 2)
    let mut fx = Fixture::new();
    let x = fx.var("x");
    let func = fx.function(&["x"], x);
    let one = fx.num(1.0);
    let two = fx.num(2.0);
    let root = fx.arena.apply(func, &[one, two]);
    assert_eq!(
        runtime_message(fx.run(root)),
        "Function expects 1 argument, got 2"
    );
}

#[test]
fn calling_a_non_function() {
    let mut fx = Fixture::new();
    let target = fx.num(1.0);
    let root = fx.arena.apply(target, &[]);
    assert_eq!(
        runtime_message(fx.run(root)),
        "Unexpected type number, expected function"
    );
}

#[test]
fn binary_operand_mismatch() {
    // 1 + true
    let mut fx = Fixture::new();
    let one = fx.num(1.0);
    let t = fx.arena.boolean(true);
    let root = fx.binary(BinaryOp::Add, one, t);
    assert_eq!(
        runtime_message(fx.run(root)),
        "Binary operator + does not operate on types number and boolean."
    );

    // 1 - "a"
    let mut fx = Fixture::new();
    let one = fx.num(1.0);
    let a = fx.str("a");
    let root = fx.binary(BinaryOp::Sub, one, a);
    assert_eq!(
        runtime_message(fx.run(root)),
        "Unexpected type string, expected number"
    );
}

#[test]
fn unary_operand_mismatch() {
    let mut fx = Fixture::new();
    let s = fx.str("a");
    let root = fx.arena.unary(UnaryOp::Not, s);
    assert_eq!(
        runtime_message(fx.run(root)),
        "Unary operator ! does not operate on type string."
    );
}

#[test]
fn division_by_zero() {
    let mut fx = Fixture::new();
    let one = fx.num(1.0);
    let zero = fx.num(0.0);
    let root = fx.binary(BinaryOp::Div, one, zero);
    assert_eq!(runtime_message(fx.run(root)), "Division by zero.");
}

#[test]
fn overflow_is_an_error() {
    // 1e308 * 10
    let mut fx = Fixture::new();
    let big = fx.num(1e308);
    let ten = fx.num(10.0);
    let root = fx.binary(BinaryOp::Mul, big, ten);
    assert_eq!(runtime_message(fx.run(root)), "Overflow");
}

#[test]
fn index_errors() {
    // [1, 2][2]
    let mut fx = Fixture::new();
    let one = fx.num(1.0);
    let two = fx.num(2.0);
    let arr = fx.arena.array(&[one, two]);
    let idx = fx.num(2.0);
    let root = fx.arena.index(arr, idx);
    assert_eq!(
        runtime_message(fx.run(root)),
        "Index 2 out of bounds, not within [0, 2)"
    );

    // [1][0.5]
    let mut fx = Fixture::new();
    let one = fx.num(1.0);
    let arr = fx.arena.array(&[one]);
    let idx = fx.num(0.5);
    let root = fx.arena.index(arr, idx);
    assert_eq!(
        fx.run(root).expect_err("fractional index").runtime_kind(),
        Some(&RuntimeErrorKind::NonIntegerIndex {
            index: "0.5".to_string()
        })
    );

    // true[0]
    let mut fx = Fixture::new();
    let t = fx.arena.boolean(true);
    let idx = fx.num(0.0);
    let root = fx.arena.index(t, idx);
    assert_eq!(runtime_message(fx.run(root)), "Value non indexable: boolean");
}

#[test]
fn string_indexing_by_codepoint() {
    // "héllo"[1]
    let mut fx = Fixture::new();
    let s = fx.str("héllo");
    let idx = fx.num(1.0);
    let root = fx.arena.index(s, idx);
    assert_eq!(fx.run(root).expect("in bounds"), "\"é\"\n");
}

#[test]
fn error_requires_string_operand() {
    // error 1
    let mut fx = Fixture::new();
    let one = fx.num(1.0);
    let root = fx.arena.error(one);
    assert_eq!(
        runtime_message(fx.run(root)),
        "Unexpected type number, expected string"
    );
}

#[test]
fn unbound_variable_is_internal() {
    let mut fx = Fixture::new();
    let root = fx.var("nowhere");
    let err = fx.run(root).expect_err("front end contract broken");
    assert!(err.is_internal());
    assert!(err.to_string().starts_with("(CRASH) Unknown variable: nowhere"));
}

#[test]
fn stack_is_empty_after_error() {
    let mut fx = Fixture::new();
    let boom = fx.error("boom");
    let fields = [fx.field("a", boom)];
    let root = fx.object(&fields);
    let program = jsonnet_ir::Program::new(fx.arena, root);
    let mut interp = crate::Interpreter::builder().interner(fx.interner).build();
    interp.evaluate(&program).expect_err("field fails");
    assert_eq!(interp.stack_depth(), 0);
}
