//! Environment for variable and `self` lookup.
//!
//! A [`BindingFrame`] is an immutable, persistent chain of maps from
//! identifier to binding. Function calls and `local` expressions layer a new
//! frame over the captured one; lookups never mutate an outer frame.
//!
//! # Recursive locals
//!
//! `local` binds are mutually recursive: every bind body is evaluated in the
//! frame that contains all the binds. Storing the bind thunks directly in
//! that frame would form an `Rc` cycle (frame -> thunk -> env -> frame), so
//! the frame instead holds [`Binding::Slot`] indices into the interpreter's
//! [`SlotArena`], and the arena owns the thunks.

use std::rc::Rc;

use jsonnet_ir::Name;
use rustc_hash::FxHashMap;

use crate::{Deferred, ObjectValue};

/// Index of a recursive-local slot in the interpreter's [`SlotArena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlotId(u32);

impl SlotId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What an identifier is bound to.
#[derive(Clone, Debug)]
pub enum Binding {
    /// Function argument, `std`, or any other directly held deferred.
    Value(Deferred),
    /// A `local` bind owned by the slot arena.
    Slot(SlotId),
}

struct FrameNode {
    bindings: FxHashMap<Name, Binding>,
    parent: BindingFrame,
}

/// Immutable, persistent identifier scope.
///
/// Cloning is an `Rc` clone.
#[derive(Clone, Default)]
pub struct BindingFrame(Option<Rc<FrameNode>>);

impl BindingFrame {
    /// The frame with no bindings.
    pub fn empty() -> Self {
        BindingFrame(None)
    }

    /// New frame where `overlay` shadows `self`.
    #[must_use]
    pub fn add_bindings(&self, overlay: impl IntoIterator<Item = (Name, Deferred)>) -> Self {
        self.extend(
            overlay
                .into_iter()
                .map(|(name, value)| (name, Binding::Value(value))),
        )
    }

    /// New frame binding each name to a recursive-local slot.
    #[must_use]
    pub fn with_slots(&self, slots: impl IntoIterator<Item = (Name, SlotId)>) -> Self {
        self.extend(
            slots
                .into_iter()
                .map(|(name, slot)| (name, Binding::Slot(slot))),
        )
    }

    fn extend(&self, bindings: impl IntoIterator<Item = (Name, Binding)>) -> Self {
        let bindings: FxHashMap<Name, Binding> = bindings.into_iter().collect();
        if bindings.is_empty() {
            return self.clone();
        }
        BindingFrame(Some(Rc::new(FrameNode {
            bindings,
            parent: self.clone(),
        })))
    }

    /// Innermost binding for `name`.
    pub fn lookup(&self, name: Name) -> Option<&Binding> {
        let mut current = self.0.as_deref();
        while let Some(node) = current {
            if let Some(binding) = node.bindings.get(&name) {
                return Some(binding);
            }
            current = node.parent.0.as_deref();
        }
        None
    }

    /// Number of layered frames.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.0.as_deref();
        while let Some(node) = current {
            depth += 1;
            current = node.parent.0.as_deref();
        }
        depth
    }
}

impl std::fmt::Debug for BindingFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BindingFrame(depth={})", self.depth())
    }
}

/// Owner of the thunks of every `local` bind evaluated so far.
///
/// Slots live as long as the interpreter.
#[derive(Default)]
pub struct SlotArena {
    slots: Vec<Deferred>,
}

impl SlotArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `count` consecutive slots, returning the first.
    ///
    /// Reserved slots hold a placeholder error until filled.
    pub fn reserve(&mut self, count: usize) -> SlotId {
        let first = self.slots.len();
        let placeholder = Deferred::error(crate::errors::crash("local read before it was bound"));
        self.slots.resize(first + count, placeholder);
        // Overflowing u32 slots means billions of live locals.
        SlotId(u32::try_from(first).unwrap_or(u32::MAX))
    }

    /// Slot `offset` places after `first`.
    #[inline]
    pub fn nth(first: SlotId, offset: usize) -> SlotId {
        SlotId(first.0.saturating_add(u32::try_from(offset).unwrap_or(u32::MAX)))
    }

    pub fn fill(&mut self, slot: SlotId, value: Deferred) {
        if let Some(entry) = self.slots.get_mut(slot.index()) {
            *entry = value;
        }
    }

    /// Deferred stored in `slot`, if it exists.
    pub fn get(&self, slot: SlotId) -> Option<Deferred> {
        self.slots.get(slot.index()).cloned()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The object `self` and `super` refer to, and how far up the inheritance
/// chain `super` starts.
#[derive(Clone, Debug, Default)]
pub struct SelfBinding {
    pub self_obj: Option<ObjectValue>,
    pub super_depth: u32,
}

impl SelfBinding {
    /// Binding for code outside any object; `self` and `super` are errors.
    pub fn unbound() -> Self {
        SelfBinding {
            self_obj: None,
            super_depth: 0,
        }
    }

    pub fn object(self_obj: ObjectValue, super_depth: u32) -> Self {
        SelfBinding {
            self_obj: Some(self_obj),
            super_depth,
        }
    }
}

/// Everything an expression body can refer to.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    pub up_values: BindingFrame,
    pub self_binding: SelfBinding,
}

impl Environment {
    pub fn new(up_values: BindingFrame, self_binding: SelfBinding) -> Self {
        Environment {
            up_values,
            self_binding,
        }
    }

    /// Same `self`, different identifier scope.
    #[must_use]
    pub fn with_up_values(&self, up_values: BindingFrame) -> Self {
        Environment {
            up_values,
            self_binding: self.self_binding.clone(),
        }
    }
}

#[cfg(test)]
mod tests;
