//! Jsonnet Eval - lazy evaluator for desugared Jsonnet programs.
//!
//! This crate takes a desugared, statically analyzed program (see
//! `jsonnet_ir`) and produces a value graph, which it can manifest as JSON.
//!
//! # Architecture
//!
//! - `Value` and `Deferred`: forced values and the memoized thunks that
//!   produce them
//! - `ObjectValue`: mixin trees of object literals with `self`/`super`
//!   resolution by super depth
//! - `Environment`: persistent binding frames plus the slot arena that holds
//!   recursive `local` binds
//! - `builtins`: operators and the `std` object as native functions taking
//!   unforced arguments
//! - `CallStack`: bounded frame stack; every runtime error carries a
//!   snapshot of it
//! - `Interpreter`: evaluation, field resolution, assertions, imports
//! - `Vm`: the top-level entry point, which also turns panics into errors
//!
//! Upstream (parsing, desugaring, static analysis) is reached only through
//! the [`Frontend`] trait; [`JsonFrontend`] covers JSON input.

pub mod builtins;
pub mod diagnostics;
mod environment;
pub mod errors;
pub mod frontend;
pub mod imports;
mod interpreter;
mod manifest;
pub mod object;
mod thunk;
mod tracing_setup;
mod value;
mod vm;

pub use diagnostics::{CallStack, EvalCounters, FrameContext, TraceFrame};
pub use environment::{Binding, BindingFrame, Environment, SelfBinding, SlotArena, SlotId};
pub use errors::{
    EvalBacktrace, EvalError, EvalResult, InternalError, RuntimeError, RuntimeErrorKind,
    StaticError,
};
pub use frontend::{Frontend, JsonFrontend};
pub use imports::{FileImporter, ImportError, ImportedData, Importer, MemoryImporter};
pub use interpreter::{EvalConfig, ExtSource, FrameGuard, Interpreter, InterpreterBuilder};
pub use object::ObjectValue;
pub use thunk::{Args, CachedThunk, CallThunk, Deferred, ExprThunk};
pub use tracing_setup::init_tracing;
pub use value::{Closure, FunctionValue, Value};
pub use vm::Vm;

#[cfg(test)]
#[expect(clippy::expect_used, reason = "Tests use expect for brevity")]
mod tests;
