//! Object model: simple objects, mixin trees and field lookup.
//!
//! An object literal evaluates to a [`SimpleObject`]: its field bodies are
//! captured unevaluated together with the identifier scope they were written
//! in. `a + b` on two objects builds an [`ExtendedObject`], a persistent
//! binary tree whose leaves are simple objects; the right-most leaf is the
//! most derived. Neither is ever copied or mutated after construction apart
//! from the assertion check state.
//!
//! # Super depth
//!
//! A field is found by walking the tree right to left, skipping the first
//! `min_depth` leaves. The number of leaves to the right of the leaf that
//! defines the field is the field's super depth; `super.f` inside that field
//! searches again from `depth + 1`.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use jsonnet_ir::{ExprId, Hide, Name, SharedArena};
use jsonnet_stack::ensure_sufficient_stack;
use rustc_hash::FxHashMap;

use crate::{BindingFrame, Value};

/// A field body not yet bound to a concrete `self`.
#[derive(Clone)]
pub enum UnboundField {
    /// Code from an object literal.
    Code {
        arena: SharedArena,
        body: ExprId,
        /// `f+: body`
        plus_super: bool,
    },
    /// A precomputed value (the fields of `std`).
    Ready(Value),
}

/// One field of a simple object.
#[derive(Clone)]
pub struct ObjectField {
    pub hide: Hide,
    pub field: UnboundField,
}

/// Where a field lookup landed.
#[derive(Clone)]
pub struct FieldHit {
    /// Leaf that defines the field.
    pub leaf: Rc<SimpleObject>,
    /// Number of leaves to the right of `leaf`.
    pub depth: u32,
}

impl FieldHit {
    /// The field definition in `leaf`.
    pub fn field(&self, name: Name) -> Option<&ObjectField> {
        self.leaf.fields.get(&name)
    }
}

/// Progress of the assertion check for one concrete object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum AssertionState {
    #[default]
    NotChecked,
    /// Checking; nested accesses treat the object as valid.
    InProgress,
    Passed,
}

/// An object literal.
pub struct SimpleObject {
    /// Scope the field bodies were written in.
    pub up_values: BindingFrame,
    pub fields: FxHashMap<Name, ObjectField>,
    pub asserts: Vec<UnboundField>,
    assertions: Cell<AssertionState>,
}

impl SimpleObject {
    pub fn new(
        up_values: BindingFrame,
        fields: FxHashMap<Name, ObjectField>,
        asserts: Vec<UnboundField>,
    ) -> Self {
        SimpleObject {
            up_values,
            fields,
            asserts,
            assertions: Cell::new(AssertionState::NotChecked),
        }
    }
}

/// `left + right`.
pub struct ExtendedObject {
    pub left: ObjectValue,
    pub right: ObjectValue,
    total_size: u32,
    has_asserts: bool,
    assertions: Cell<AssertionState>,
}

/// Object value: a leaf or a mixin tree.
#[derive(Clone)]
pub enum ObjectValue {
    Simple(Rc<SimpleObject>),
    Extended(Rc<ExtendedObject>),
}

impl ObjectValue {
    pub fn simple(
        up_values: BindingFrame,
        fields: FxHashMap<Name, ObjectField>,
        asserts: Vec<UnboundField>,
    ) -> Self {
        ObjectValue::Simple(Rc::new(SimpleObject::new(up_values, fields, asserts)))
    }

    /// `left + right` in O(1).
    pub fn combine(left: ObjectValue, right: ObjectValue) -> Self {
        let total_size = left.inheritance_size().saturating_add(right.inheritance_size());
        let has_asserts = left.has_asserts() || right.has_asserts();
        ObjectValue::Extended(Rc::new(ExtendedObject {
            left,
            right,
            total_size,
            has_asserts,
            assertions: Cell::new(AssertionState::NotChecked),
        }))
    }

    /// Number of simple-object leaves.
    pub fn inheritance_size(&self) -> u32 {
        match self {
            ObjectValue::Simple(_) => 1,
            ObjectValue::Extended(ext) => ext.total_size,
        }
    }

    /// True if any leaf carries assertions.
    pub fn has_asserts(&self) -> bool {
        match self {
            ObjectValue::Simple(obj) => !obj.asserts.is_empty(),
            ObjectValue::Extended(ext) => ext.has_asserts,
        }
    }

    pub fn assertion_state(&self) -> AssertionState {
        self.assertion_cell().get()
    }

    pub fn set_assertion_state(&self, state: AssertionState) {
        self.assertion_cell().set(state);
    }

    fn assertion_cell(&self) -> &Cell<AssertionState> {
        match self {
            ObjectValue::Simple(obj) => &obj.assertions,
            ObjectValue::Extended(ext) => &ext.assertions,
        }
    }

    /// Identity of this concrete object.
    pub fn ptr_key(&self) -> usize {
        match self {
            ObjectValue::Simple(obj) => Rc::as_ptr(obj) as usize,
            ObjectValue::Extended(ext) => Rc::as_ptr(ext) as usize,
        }
    }

    pub fn ptr_eq(&self, other: &ObjectValue) -> bool {
        self.ptr_key() == other.ptr_key()
    }

    /// Find the right-most leaf defining `name`, skipping the first
    /// `min_depth` leaves from the right.
    pub fn find_field(&self, min_depth: u32, name: Name) -> Option<FieldHit> {
        self.find_field_from(min_depth, name, 0)
    }

    fn find_field_from(&self, min_depth: u32, name: Name, skipped: u32) -> Option<FieldHit> {
        match self {
            ObjectValue::Simple(obj) => (min_depth == 0 && obj.fields.contains_key(&name))
                .then(|| FieldHit {
                    leaf: Rc::clone(obj),
                    depth: skipped,
                }),
            ObjectValue::Extended(ext) => ensure_sufficient_stack(|| {
                let right_size = ext.right.inheritance_size();
                if right_size > min_depth {
                    if let Some(hit) = ext.right.find_field_from(min_depth, name, skipped) {
                        return Some(hit);
                    }
                }
                ext.left.find_field_from(
                    min_depth.saturating_sub(right_size),
                    name,
                    skipped.saturating_add(right_size),
                )
            }),
        }
    }

    /// True if a field named `name` exists (hidden fields count only when
    /// `include_hidden`).
    pub fn has_field(&self, name: Name, include_hidden: bool) -> bool {
        if include_hidden {
            return self.find_field(0, name).is_some();
        }
        self.field_visibility()
            .get(&name)
            .is_some_and(|hide| *hide != Hide::Hidden)
    }

    /// Effective visibility of every field.
    ///
    /// Merged left first; a right definition overrides unless it is
    /// `Inherit`, which keeps what the left decided.
    pub fn field_visibility(&self) -> FxHashMap<Name, Hide> {
        let mut out = FxHashMap::default();
        self.collect_visibility(&mut out);
        out
    }

    fn collect_visibility(&self, out: &mut FxHashMap<Name, Hide>) {
        match self {
            ObjectValue::Simple(obj) => {
                for (name, field) in &obj.fields {
                    match field.hide {
                        Hide::Inherit => {
                            out.entry(*name).or_insert(Hide::Inherit);
                        }
                        hide => {
                            out.insert(*name, hide);
                        }
                    }
                }
            }
            ObjectValue::Extended(ext) => ensure_sufficient_stack(|| {
                ext.left.collect_visibility(out);
                ext.right.collect_visibility(out);
            }),
        }
    }

    /// Field names, unordered. Hidden fields only when `include_hidden`.
    pub fn fields(&self, include_hidden: bool) -> Vec<Name> {
        self.field_visibility()
            .into_iter()
            .filter(|(_, hide)| include_hidden || *hide != Hide::Hidden)
            .map(|(name, _)| name)
            .collect()
    }

    /// Every leaf with its super depth, most derived first.
    pub fn leaves(&self) -> Vec<(Rc<SimpleObject>, u32)> {
        let mut out = Vec::with_capacity(self.inheritance_size() as usize);
        self.collect_leaves(0, &mut out);
        out
    }

    fn collect_leaves(&self, skipped: u32, out: &mut Vec<(Rc<SimpleObject>, u32)>) {
        match self {
            ObjectValue::Simple(obj) => out.push((Rc::clone(obj), skipped)),
            ObjectValue::Extended(ext) => ensure_sufficient_stack(|| {
                ext.right.collect_leaves(skipped, out);
                ext.left
                    .collect_leaves(skipped.saturating_add(ext.right.inheritance_size()), out);
            }),
        }
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectValue::Simple(obj) => write!(f, "SimpleObject(fields={})", obj.fields.len()),
            ObjectValue::Extended(ext) => write!(f, "ExtendedObject(size={})", ext.total_size),
        }
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "Tests use expect for brevity")]
mod tests;
