use super::*;
use jsonnet_ir::StringInterner;
use pretty_assertions::assert_eq;

fn leaf(fields: &[(Name, Hide, f64)]) -> ObjectValue {
    let fields = fields
        .iter()
        .map(|&(name, hide, n)| {
            (
                name,
                ObjectField {
                    hide,
                    field: UnboundField::Ready(Value::Number(n)),
                },
            )
        })
        .collect();
    ObjectValue::simple(BindingFrame::empty(), fields, Vec::new())
}

fn hit_value(hit: &FieldHit, name: Name) -> Option<f64> {
    match hit.field(name).map(|f| &f.field) {
        Some(UnboundField::Ready(Value::Number(n))) => Some(*n),
        _ => None,
    }
}

#[test]
fn test_find_field_prefers_right() {
    let interner = StringInterner::new();
    let a = interner.intern("a");
    let b = interner.intern("b");

    let base = leaf(&[(a, Hide::Inherit, 1.0), (b, Hide::Inherit, 1.0)]);
    let derived = leaf(&[(a, Hide::Inherit, 2.0)]);
    let obj = ObjectValue::combine(base, derived);

    assert_eq!(obj.inheritance_size(), 2);

    let hit = obj.find_field(0, a).expect("a exists");
    assert_eq!(hit.depth, 0);
    assert_eq!(hit_value(&hit, a), Some(2.0));

    let hit = obj.find_field(0, b).expect("b exists");
    assert_eq!(hit.depth, 1);
    assert_eq!(hit_value(&hit, b), Some(1.0));
}

#[test]
fn test_find_field_respects_min_depth() {
    let interner = StringInterner::new();
    let a = interner.intern("a");

    // ((l0 + l1) + l2), every leaf defines `a`.
    let obj = ObjectValue::combine(
        ObjectValue::combine(leaf(&[(a, Hide::Inherit, 0.0)]), leaf(&[(a, Hide::Inherit, 1.0)])),
        leaf(&[(a, Hide::Inherit, 2.0)]),
    );

    let depths: Vec<(u32, Option<f64>)> = (0..3)
        .map(|min| {
            let hit = obj.find_field(min, a).expect("field at every depth");
            (hit.depth, hit_value(&hit, a))
        })
        .collect();
    assert_eq!(
        depths,
        vec![(0, Some(2.0)), (1, Some(1.0)), (2, Some(0.0))]
    );
    assert!(obj.find_field(3, a).is_none());
}

#[test]
fn test_find_field_skips_over_right_subtree() {
    let interner = StringInterner::new();
    let a = interner.intern("a");
    let b = interner.intern("b");

    // l0 + (l1 + l2): `b` only lives in l0.
    let obj = ObjectValue::combine(
        leaf(&[(b, Hide::Inherit, 0.0)]),
        ObjectValue::combine(leaf(&[(a, Hide::Inherit, 1.0)]), leaf(&[(a, Hide::Inherit, 2.0)])),
    );
    let hit = obj.find_field(1, b).expect("b in the base leaf");
    assert_eq!(hit.depth, 2);
    let hit = obj.find_field(1, a).expect("a in the middle leaf");
    assert_eq!(hit.depth, 1);
    assert_eq!(hit_value(&hit, a), Some(1.0));
}

#[test]
fn test_visibility_merge() {
    let interner = StringInterner::new();
    let h = interner.intern("h");
    let v = interner.intern("v");
    let plain = interner.intern("plain");

    let base = leaf(&[
        (h, Hide::Hidden, 0.0),
        (v, Hide::Visible, 0.0),
        (plain, Hide::Inherit, 0.0),
    ]);
    // `:` on the right keeps the left's decision, `:::` forces visible.
    let derived = leaf(&[(h, Hide::Inherit, 1.0), (plain, Hide::Hidden, 1.0)]);
    let obj = ObjectValue::combine(base, derived);

    let vis = obj.field_visibility();
    assert_eq!(vis.get(&h), Some(&Hide::Hidden));
    assert_eq!(vis.get(&v), Some(&Hide::Visible));
    assert_eq!(vis.get(&plain), Some(&Hide::Hidden));

    assert!(obj.has_field(h, true));
    assert!(!obj.has_field(h, false));
    assert!(obj.has_field(v, false));

    let mut visible = obj.fields(false);
    visible.sort_by_key(|name| interner.lookup(*name));
    assert_eq!(visible, vec![v]);
    assert_eq!(obj.fields(true).len(), 3);

    let unhidden = ObjectValue::combine(obj, leaf(&[(h, Hide::Visible, 2.0)]));
    assert!(unhidden.has_field(h, false));
}

#[test]
fn test_leaves_order_and_depths() {
    let interner = StringInterner::new();
    let a = interner.intern("a");
    let l0 = leaf(&[(a, Hide::Inherit, 0.0)]);
    let l1 = leaf(&[(a, Hide::Inherit, 1.0)]);
    let l2 = leaf(&[(a, Hide::Inherit, 2.0)]);
    let obj = ObjectValue::combine(l0, ObjectValue::combine(l1, l2));

    let depths: Vec<u32> = obj.leaves().iter().map(|(_, depth)| *depth).collect();
    assert_eq!(depths, vec![0, 1, 2]);
}

#[test]
fn test_identity_and_assertion_state() {
    let obj = leaf(&[]);
    let same = obj.clone();
    let other = leaf(&[]);
    assert!(obj.ptr_eq(&same));
    assert!(!obj.ptr_eq(&other));
    assert!(!obj.has_asserts());

    assert_eq!(obj.assertion_state(), AssertionState::NotChecked);
    same.set_assertion_state(AssertionState::Passed);
    assert_eq!(obj.assertion_state(), AssertionState::Passed);
    // Combining yields a fresh concrete object with its own state.
    let combined = ObjectValue::combine(obj, other);
    assert_eq!(combined.assertion_state(), AssertionState::NotChecked);
}
