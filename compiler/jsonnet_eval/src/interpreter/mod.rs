//! Tree-walking interpreter.
//!
//! One `Interpreter` evaluates one program (plus whatever it imports) on a
//! single thread. It owns everything that outlives a single expression:
//!
//! - the bounded [`CallStack`] and optional [`EvalCounters`]
//! - the [`SlotArena`] holding recursive `local` binds
//! - the field cache, keyed by concrete object, field name and super depth
//! - the import cache, external variables and top-level arguments
//! - the `std` object and the base environment binding it
//!
//! Evaluation is split across submodules by concern: `eval` dispatches on
//! node kinds, `call` applies functions and builtins, `objects` resolves
//! fields and assertions, `coerce` holds the `expect_*` helpers and
//! `external` handles imports and external code.

mod builder;
mod call;
mod coerce;
mod eval;
mod external;
mod frame_guard;
mod objects;

use std::rc::Rc;

use jsonnet_ir::{Name, Program, SharedInterner, SourceLocation};
use rustc_hash::FxHashMap;

pub use builder::{EvalConfig, ExtSource, InterpreterBuilder};
pub use frame_guard::FrameGuard;

use crate::diagnostics::{CallStack, EvalCounters, FrameContext, TraceFrame};
use crate::errors::{EvalError, EvalResult, RuntimeError};
use crate::frontend::Frontend;
use crate::imports::{ImportCache, Importer};
use crate::{BindingFrame, Deferred, Environment, ObjectValue, SelfBinding, SlotArena, Value};

/// Names the evaluator uses for frames it synthesizes.
struct FrameNames {
    arg: Name,
    array_element: Name,
    rhs: Name,
}

/// An external variable and, once compiled, its deferred value.
struct ExtVar {
    source: ExtSource,
    compiled: Option<Deferred>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct FieldKey {
    object: usize,
    name: Name,
    depth: u32,
}

/// A forced field value; `owner` keeps the object alive so its address is
/// not reused while the entry exists.
struct CachedField {
    owner: ObjectValue,
    value: Value,
}

/// Evaluates programs to values and manifests them as JSON.
pub struct Interpreter {
    interner: SharedInterner,
    config: EvalConfig,
    stack: CallStack,
    slots: SlotArena,
    field_cache: FxHashMap<FieldKey, CachedField>,
    imports: ImportCache,
    importer: Rc<dyn Importer>,
    frontend: Rc<dyn Frontend>,
    ext_vars: FxHashMap<Name, ExtVar>,
    tlas: Vec<(Name, ExtSource)>,
    std_object: ObjectValue,
    /// Environment of every top-level file: only `std` is bound.
    base_env: Environment,
    counters: Option<EvalCounters>,
    names: FrameNames,
}

impl Interpreter {
    /// Builder with default configuration.
    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// Evaluate `program` and manifest the result as multi-line JSON
    /// followed by a newline.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate(&mut self, program: &Program) -> Result<String, EvalError> {
        self.run_main(program, |this, value| {
            let mut out = this.manifest(&value, true)?;
            out.push('\n');
            Ok(out)
        })
    }

    /// Evaluate `program` (applying top-level arguments if it is a function)
    /// without manifesting it.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate_value(&mut self, program: &Program) -> EvalResult {
        self.run_main(program, |_, value| Ok(value))
    }

    fn run_main<T>(
        &mut self,
        program: &Program,
        finish: impl FnOnce(&mut Interpreter, Value) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        let location = program.arena.location(program.root);
        self.with_frame(TraceFrame::new(location, FrameContext::Main), |this| {
            let env = this.base_env.clone();
            let value = this.eval(&program.arena, program.root, &env)?;
            let value = this.apply_top_level_args(value, location)?;
            finish(this, value)
        })
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Counters, when profiling is enabled.
    pub fn counters(&self) -> Option<&EvalCounters> {
        self.counters.as_ref()
    }

    pub fn std_object(&self) -> &ObjectValue {
        &self.std_object
    }

    /// Current call depth.
    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    /// Attach the current backtrace to `err`, raised at `site`.
    pub(crate) fn runtime_error(&self, err: RuntimeError, site: SourceLocation) -> EvalError {
        self.stack.attach_backtrace(err, site, &self.interner)
    }

    /// Error raised by native code, located by the enclosing frame.
    pub(crate) fn builtin_error(&self, err: RuntimeError) -> EvalError {
        self.runtime_error(err, SourceLocation::UNKNOWN)
    }

    #[inline]
    pub(crate) fn count(&mut self, bump: fn(&mut EvalCounters)) {
        if let Some(counters) = self.counters.as_mut() {
            bump(counters);
        }
    }

    fn base_environment(std_name: Name, std_object: &ObjectValue) -> Environment {
        let up_values = BindingFrame::empty().add_bindings([(
            std_name,
            Deferred::Ready(Value::Object(std_object.clone())),
        )]);
        Environment::new(up_values, SelfBinding::unbound())
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("config", &self.config)
            .field("stack_depth", &self.stack.depth())
            .field("slots", &self.slots.len())
            .field("cached_fields", &self.field_cache.len())
            .field("imports", &self.imports)
            .finish_non_exhaustive()
    }
}
