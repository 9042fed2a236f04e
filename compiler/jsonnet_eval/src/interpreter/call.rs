//! Function application.

use jsonnet_ir::{Name, SourceLocation};

use super::Interpreter;
use crate::builtins::{Builtin, BuiltinFn};
use crate::diagnostics::{EvalCounters, FrameContext, TraceFrame};
use crate::errors::{arity_mismatch, missing_argument, unknown_parameter, EvalResult};
use crate::thunk::Args;
use crate::{Deferred, FunctionValue, Value};

impl Interpreter {
    /// Apply `function` to positional `args`.
    pub fn call_function(
        &mut self,
        function: &FunctionValue,
        args: &[Deferred],
        site: SourceLocation,
    ) -> EvalResult {
        match function {
            FunctionValue::Closure(closure) => {
                if args.len() != closure.arity() {
                    let err = arity_mismatch(None, closure.arity(), args.len());
                    return Err(self.runtime_error(err, site));
                }
                self.count(EvalCounters::count_function_call);
                let params = closure.arena.params(closure.params);
                let up_values = closure
                    .env
                    .up_values
                    .add_bindings(params.iter().copied().zip(args.iter().cloned()));
                let env = closure.env.with_up_values(up_values);
                self.with_frame(TraceFrame::new(site, FrameContext::Function), |this| {
                    this.eval(&closure.arena, closure.body, &env)
                })
            }
            FunctionValue::Builtin(builtin) => self.call_builtin(*builtin, args, site),
        }
    }

    /// Run a native function inside a `builtin function <name>` frame.
    pub(crate) fn call_builtin(
        &mut self,
        builtin: &'static Builtin,
        args: &[Deferred],
        site: SourceLocation,
    ) -> EvalResult {
        if args.len() != builtin.arity() {
            let err = arity_mismatch(Some(builtin.name), builtin.arity(), args.len());
            return Err(self.runtime_error(err, site));
        }
        self.count(EvalCounters::count_builtin_call);
        let frame = TraceFrame::new(site, FrameContext::Builtin(builtin.name));
        self.with_frame(frame, |this| match (builtin.func, args) {
            (BuiltinFn::Unary(f), [a]) => f(this, a),
            (BuiltinFn::Binary(f), [a, b]) => f(this, a, b),
            (BuiltinFn::Ternary(f), [a, b, c]) => f(this, a, b, c),
            _ => Err(crate::errors::crash(format!(
                "builtin {} registered with the wrong arity",
                builtin.name
            ))),
        })
    }

    /// Call the program's result with the configured top-level arguments.
    ///
    /// Values other than functions pass through untouched. Arguments are
    /// matched to parameters by name; an argument no parameter accepts, or a
    /// parameter left without an argument, is an error.
    pub(crate) fn apply_top_level_args(
        &mut self,
        value: Value,
        site: SourceLocation,
    ) -> EvalResult {
        let Value::Function(function) = value else {
            return Ok(value);
        };
        let params: Vec<Name> = match &function {
            FunctionValue::Closure(closure) => closure.arena.params(closure.params).to_vec(),
            FunctionValue::Builtin(builtin) => builtin
                .params
                .iter()
                .map(|param| self.interner.intern(param))
                .collect(),
        };

        if let Some((name, _)) = self.tlas.iter().find(|(name, _)| !params.contains(name)) {
            let err = unknown_parameter(self.interner.lookup(*name));
            return Err(self.runtime_error(err, site));
        }

        let mut args = Args::with_capacity(params.len());
        for param in params {
            let Some(index) = self.tlas.iter().position(|(name, _)| *name == param) else {
                let err = missing_argument(self.interner.lookup(param));
                return Err(self.runtime_error(err, site));
            };
            let source = self.tlas[index].1.clone();
            args.push(self.external_deferred(
                param,
                &source,
                "top-level-arg",
                FrameContext::TopLevelArg(param),
            ));
        }
        tracing::debug!(count = args.len(), "applying top-level arguments");
        self.call_function(&function, &args, site)
    }
}
