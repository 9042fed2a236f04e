//! Field resolution, assertion checking and the field cache.
//!
//! Indexing an object first runs its assertions (once per concrete object),
//! then finds the defining leaf, binds `self` to the object being indexed and
//! `super` to the leaves left of the definition, and evaluates the body.
//! Forced values are cached per (object, field, super depth).

use jsonnet_ir::{Name, SourceLocation};

use super::{CachedField, FieldKey, Interpreter};
use crate::builtins::PLUS;
use crate::diagnostics::{FrameContext, TraceFrame};
use crate::errors::{assertion_failed, field_does_not_exist, type_mismatch, EvalError, EvalResult};
use crate::object::{AssertionState, FieldHit, UnboundField};
use crate::{Deferred, Environment, ObjectValue, SelfBinding, Value};

impl Interpreter {
    /// Value of field `name` of `obj`, searching from super depth
    /// `min_depth` (0 for `obj.name`, `depth + 1` for `super.name`).
    pub fn object_index(
        &mut self,
        obj: &ObjectValue,
        min_depth: u32,
        name: Name,
        site: SourceLocation,
    ) -> EvalResult {
        self.check_assertions(obj)?;
        let Some(hit) = obj.find_field(min_depth, name) else {
            let err = field_does_not_exist(self.interner.lookup(name));
            return Err(self.runtime_error(err, site));
        };

        let key = FieldKey {
            object: obj.ptr_key(),
            name,
            depth: hit.depth,
        };
        if let Some(cached) = self.field_cache.get(&key) {
            debug_assert!(cached.owner.ptr_eq(obj));
            return Ok(cached.value.clone());
        }

        let value = self.evaluate_field(obj, &hit, name, site)?;
        self.field_cache.insert(
            key,
            CachedField {
                owner: obj.clone(),
                value: value.clone(),
            },
        );
        Ok(value)
    }

    fn evaluate_field(
        &mut self,
        obj: &ObjectValue,
        hit: &FieldHit,
        name: Name,
        site: SourceLocation,
    ) -> EvalResult {
        let Some(field) = hit.field(name) else {
            return Err(crate::errors::crash("field hit without a definition"));
        };
        let (arena, body, plus_super) = match &field.field {
            UnboundField::Ready(value) => return Ok(value.clone()),
            UnboundField::Code {
                arena,
                body,
                plus_super,
            } => (arena.clone(), *body, *plus_super),
        };

        let env = Environment::new(
            hit.leaf.up_values.clone(),
            SelfBinding::object(obj.clone(), hit.depth),
        );
        let frame = TraceFrame::new(arena.location(body), FrameContext::Field(name));
        let value = self.with_frame(frame, |this| this.eval(&arena, body, &env))?;

        let super_depth = hit.depth.saturating_add(1);
        if !plus_super || obj.find_field(super_depth, name).is_none() {
            return Ok(value);
        }
        let inherited = self.object_index(obj, super_depth, name, site)?;
        self.call_builtin(
            &PLUS,
            &[Deferred::Ready(inherited), Deferred::Ready(value)],
            site,
        )
    }

    /// Run every assertion of `obj` unless that already happened.
    ///
    /// An object being checked counts as valid for accesses made by its own
    /// assertions. A failed check leaves the object unchecked, so a later
    /// access fails the same way.
    pub(crate) fn check_assertions(&mut self, obj: &ObjectValue) -> Result<(), EvalError> {
        if !obj.has_asserts() {
            return Ok(());
        }
        match obj.assertion_state() {
            AssertionState::Passed | AssertionState::InProgress => return Ok(()),
            AssertionState::NotChecked => {}
        }

        obj.set_assertion_state(AssertionState::InProgress);
        match self.run_assertions(obj) {
            Ok(()) => {
                obj.set_assertion_state(AssertionState::Passed);
                Ok(())
            }
            Err(err) => {
                obj.set_assertion_state(AssertionState::NotChecked);
                Err(err)
            }
        }
    }

    fn run_assertions(&mut self, obj: &ObjectValue) -> Result<(), EvalError> {
        for (leaf, depth) in obj.leaves() {
            for assertion in &leaf.asserts {
                let (value, location) = match assertion {
                    UnboundField::Ready(value) => (value.clone(), SourceLocation::UNKNOWN),
                    UnboundField::Code { arena, body, .. } => {
                        let location = arena.location(*body);
                        let env = Environment::new(
                            leaf.up_values.clone(),
                            SelfBinding::object(obj.clone(), depth),
                        );
                        let frame = TraceFrame::new(location, FrameContext::Assertion);
                        let value = self.with_frame(frame, |this| this.eval(arena, *body, &env))?;
                        (value, location)
                    }
                };
                match value {
                    Value::Bool(true) => {}
                    Value::Bool(false) => {
                        return Err(self.runtime_error(assertion_failed(), location));
                    }
                    other => {
                        let err = type_mismatch("boolean", other.type_name());
                        return Err(self.runtime_error(err, location));
                    }
                }
            }
        }
        Ok(())
    }

    /// Field names of `obj` in manifest order.
    pub(crate) fn sorted_fields(&self, obj: &ObjectValue, include_hidden: bool) -> Vec<Name> {
        let mut names = obj.fields(include_hidden);
        names.sort_by_key(|name| self.interner.lookup(*name));
        names
    }
}
