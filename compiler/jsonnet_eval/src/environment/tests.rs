use super::*;
use jsonnet_ir::StringInterner;

use crate::Value;

fn ready_number(deferred: Option<&Binding>) -> Option<f64> {
    match deferred {
        Some(Binding::Value(Deferred::Ready(Value::Number(n)))) => Some(*n),
        _ => None,
    }
}

#[test]
fn test_overlay_shadows_base() {
    let interner = StringInterner::new();
    let x = interner.intern("x");
    let y = interner.intern("y");

    let base = BindingFrame::empty().add_bindings([
        (x, Deferred::Ready(Value::Number(1.0))),
        (y, Deferred::Ready(Value::Number(2.0))),
    ]);
    let inner = base.add_bindings([(x, Deferred::Ready(Value::Number(10.0)))]);

    assert_eq!(ready_number(inner.lookup(x)), Some(10.0));
    assert_eq!(ready_number(inner.lookup(y)), Some(2.0));
    // The base frame is untouched.
    assert_eq!(ready_number(base.lookup(x)), Some(1.0));
    assert_eq!(inner.depth(), 2);
}

#[test]
fn test_lookup_missing() {
    let interner = StringInterner::new();
    let frame = BindingFrame::empty();
    assert!(frame.lookup(interner.intern("nope")).is_none());
    assert_eq!(frame.depth(), 0);
}

#[test]
fn test_empty_overlay_reuses_frame() {
    let base = BindingFrame::empty();
    let same = base.add_bindings(std::iter::empty());
    assert_eq!(same.depth(), 0);
}

#[test]
fn test_slots_reserve_and_fill() {
    let interner = StringInterner::new();
    let a = interner.intern("a");
    let b = interner.intern("b");

    let mut arena = SlotArena::new();
    let first = arena.reserve(2);
    assert_eq!(arena.len(), 2);

    let frame = BindingFrame::empty().with_slots([(a, first), (b, SlotArena::nth(first, 1))]);
    arena.fill(SlotArena::nth(first, 1), Deferred::Ready(Value::Bool(true)));

    match frame.lookup(b) {
        Some(Binding::Slot(slot)) => {
            assert!(matches!(
                arena.get(*slot),
                Some(Deferred::Ready(Value::Bool(true)))
            ));
        }
        other => panic!("expected a slot binding, got {other:?}"),
    }
    // An unfilled slot still holds its placeholder error.
    assert!(matches!(arena.get(first), Some(Deferred::Error(_))));
}

#[test]
fn test_self_binding_unbound() {
    let binding = SelfBinding::unbound();
    assert!(binding.self_obj.is_none());
    assert_eq!(binding.super_depth, 0);
}
