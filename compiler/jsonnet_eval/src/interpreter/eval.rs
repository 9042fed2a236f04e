//! Expression evaluation: one arm per node kind.
//!
//! Compound nodes do not evaluate their children eagerly unless the node's
//! semantics demand it. Array elements, call arguments and `local` binds
//! become thunks; object fields stay unbound until indexed.

use std::rc::Rc;

use jsonnet_ir::{ExprId, ExprKind, ExprRange, FieldRange, SharedArena, SourceLocation};
use jsonnet_stack::ensure_sufficient_stack;
use rustc_hash::FxHashMap;

use super::Interpreter;
use crate::builtins::{binary_builtin, unary_builtin};
use crate::diagnostics::{EvalCounters, FrameContext};
use crate::errors::{
    crash, duplicate_field, field_name_not_string, index_out_of_bounds, non_integer_index,
    not_indexable, self_outside_object, super_outside_object, unknown_variable, user_error,
    EvalError, EvalResult,
};
use crate::object::{ObjectField, UnboundField};
use crate::thunk::{Args, ExprThunk};
use crate::{
    Binding, Closure, Deferred, Environment, FunctionValue, ObjectValue, SlotArena, Value,
};

impl Interpreter {
    /// Evaluate `id` from `arena` in `env`.
    pub fn eval(&mut self, arena: &SharedArena, id: ExprId, env: &Environment) -> EvalResult {
        self.count(EvalCounters::count_expression);
        ensure_sufficient_stack(|| self.eval_inner(arena, id, env))
    }

    fn eval_inner(&mut self, arena: &SharedArena, id: ExprId, env: &Environment) -> EvalResult {
        let site = arena.location(id);
        match *arena.kind(id) {
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Bool(b) => Ok(Value::Bool(b)),
            ExprKind::Number(bits) => Ok(Value::Number(f64::from_bits(bits))),
            ExprKind::Str(s) => Ok(Value::string(self.interner.lookup(s))),

            ExprKind::Var(name) => {
                let deferred = match env.up_values.lookup(name) {
                    Some(Binding::Value(deferred)) => deferred.clone(),
                    Some(Binding::Slot(slot)) => match self.slots.get(*slot) {
                        Some(deferred) => deferred,
                        None => return Err(crash(format!("unallocated slot {}", slot.index()))),
                    },
                    None => return Err(unknown_variable(self.interner.lookup(name))),
                };
                deferred.force(self)
            }

            ExprKind::Local { binds, body } => {
                let binds = arena.binds(binds);
                let first = self.slots.reserve(binds.len());
                let up_values = env.up_values.with_slots(
                    binds
                        .iter()
                        .enumerate()
                        .map(|(i, bind)| (bind.name, SlotArena::nth(first, i))),
                );
                let local_env = env.with_up_values(up_values);
                for (i, bind) in binds.iter().enumerate() {
                    let thunk = Deferred::thunk(
                        FrameContext::Thunk(bind.name),
                        local_env.clone(),
                        arena.clone(),
                        bind.body,
                    );
                    self.slots.fill(SlotArena::nth(first, i), thunk);
                }
                self.eval(arena, body, &local_env)
            }

            ExprKind::Function { params, body } => {
                Ok(Value::Function(FunctionValue::Closure(Rc::new(Closure {
                    env: env.clone(),
                    arena: arena.clone(),
                    params,
                    body,
                    location: site,
                }))))
            }

            ExprKind::Apply { target, args } => {
                let target = self.eval(arena, target, env)?;
                let function = self.function_value(target, site)?;
                let args = self.arg_thunks(arena, args, env);
                self.call_function(&function, &args, site)
            }

            ExprKind::Array(elements) => {
                let context = FrameContext::Thunk(self.names.array_element);
                let elements: Vec<Deferred> = arena
                    .exprs(elements)
                    .iter()
                    .map(|&element| Deferred::thunk(context, env.clone(), arena.clone(), element))
                    .collect();
                Ok(Value::Array(elements.into()))
            }

            ExprKind::Object { asserts, fields } => self.eval_object(arena, asserts, fields, env),

            ExprKind::Binary { op, left, right } => {
                let builtin = binary_builtin(op);
                let left = self.eval(arena, left, env)?;
                let right = if op.is_short_circuit() {
                    Deferred::Expr(Rc::new(ExprThunk {
                        context: FrameContext::Thunk(self.names.rhs),
                        env: env.clone(),
                        arena: arena.clone(),
                        body: right,
                    }))
                } else {
                    Deferred::Ready(self.eval(arena, right, env)?)
                };
                self.call_builtin(builtin, &[Deferred::Ready(left), right], site)
            }

            ExprKind::Unary { op, operand } => {
                let operand = self.eval(arena, operand, env)?;
                self.call_builtin(unary_builtin(op), &[Deferred::Ready(operand)], site)
            }

            ExprKind::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_site = arena.location(cond);
                let cond = self.eval(arena, cond, env)?;
                if self.boolean_value(cond, cond_site)? {
                    self.eval(arena, then_branch, env)
                } else {
                    self.eval(arena, else_branch, env)
                }
            }

            ExprKind::Index { target, index } => {
                let target = self.eval(arena, target, env)?;
                let index = self.eval(arena, index, env)?;
                self.index_value(target, index, site)
            }

            ExprKind::SuperIndex { index } => {
                let Some(root) = env.self_binding.self_obj.clone() else {
                    return Err(self.runtime_error(super_outside_object(), site));
                };
                let index = self.eval(arena, index, env)?;
                let name = self.string_value(index, site)?;
                let name = self.interner.intern(&name);
                let depth = env.self_binding.super_depth.saturating_add(1);
                self.object_index(&root, depth, name, site)
            }

            ExprKind::SelfRef => match &env.self_binding.self_obj {
                Some(obj) => Ok(Value::Object(obj.clone())),
                None => Err(self.runtime_error(self_outside_object(), site)),
            },

            ExprKind::Error(message) => {
                let message = self.eval(arena, message, env)?;
                let message = self.string_value(message, site)?;
                Err(self.runtime_error(user_error(&message), site))
            }

            ExprKind::Import(path) => self.import_code(arena, path, site),
            ExprKind::ImportStr(path) => self.import_string(arena, path, site),
        }
    }

    /// One memoized thunk per call argument.
    fn arg_thunks(&self, arena: &SharedArena, args: ExprRange, env: &Environment) -> Args {
        let context = FrameContext::Thunk(self.names.arg);
        arena
            .exprs(args)
            .iter()
            .map(|&arg| Deferred::thunk(context, env.clone(), arena.clone(), arg))
            .collect()
    }

    /// Build a simple object: field names are evaluated now, bodies and
    /// assertions are captured unevaluated with the current scope.
    fn eval_object(
        &mut self,
        arena: &SharedArena,
        asserts: ExprRange,
        fields: FieldRange,
        env: &Environment,
    ) -> EvalResult {
        let mut object_fields = FxHashMap::default();
        for field in arena.fields(fields) {
            let name_site = arena.location(field.name);
            let name = match self.eval(arena, field.name, env)? {
                Value::Null => continue,
                Value::Str(s) => self.interner.intern(&s),
                _ => return Err(self.runtime_error(field_name_not_string(), name_site)),
            };
            let unbound = ObjectField {
                hide: field.hide,
                field: UnboundField::Code {
                    arena: arena.clone(),
                    body: field.body,
                    plus_super: field.plus_super,
                },
            };
            if object_fields.insert(name, unbound).is_some() {
                let err = duplicate_field(self.interner.lookup(name));
                return Err(self.runtime_error(err, name_site));
            }
        }
        let asserts = arena
            .exprs(asserts)
            .iter()
            .map(|&body| UnboundField::Code {
                arena: arena.clone(),
                body,
                plus_super: false,
            })
            .collect();
        Ok(Value::Object(ObjectValue::simple(
            env.up_values.clone(),
            object_fields,
            asserts,
        )))
    }

    /// `target[index]` for objects, arrays and strings.
    pub(crate) fn index_value(
        &mut self,
        target: Value,
        index: Value,
        site: SourceLocation,
    ) -> EvalResult {
        match target {
            Value::Object(obj) => {
                let name = self.string_value(index, site)?;
                let name = self.interner.intern(&name);
                self.object_index(&obj, 0, name, site)
            }
            Value::Array(elements) => {
                let i = self.position(index, elements.len(), site)?;
                elements[i].force(self)
            }
            Value::Str(s) => {
                let len = s.chars().count();
                let i = self.position(index, len, site)?;
                let c = s.chars().nth(i).unwrap_or_default();
                Ok(Value::string(c.encode_utf8(&mut [0; 4])))
            }
            other => Err(self.runtime_error(not_indexable(other.type_name()), site)),
        }
    }

    /// Integral, in-bounds position for an array or string index.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        reason = "index checked to be integral and in bounds first"
    )]
    fn position(&self, index: Value, len: usize, site: SourceLocation) -> Result<usize, EvalError> {
        let n = self.number_value(index, site)?;
        if n.fract() != 0.0 {
            return Err(self.runtime_error(non_integer_index(n), site));
        }
        if n < 0.0 || n >= len as f64 {
            return Err(self.runtime_error(index_out_of_bounds(n as i64, len), site));
        }
        Ok(n as usize)
    }
}
