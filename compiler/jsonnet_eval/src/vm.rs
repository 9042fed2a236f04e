//! Top-level entry point: compile a snippet, evaluate it, manifest it.

use std::panic::{self, AssertUnwindSafe};

use jsonnet_ir::SharedInterner;

use crate::errors::{crash, EvalError};
use crate::{init_tracing, InterpreterBuilder};

/// A configured evaluator.
///
/// Every call to [`Vm::evaluate_snippet`] builds a fresh interpreter, so
/// caches and the call stack never leak between evaluations.
#[derive(Clone, Debug)]
pub struct Vm {
    builder: InterpreterBuilder,
}

impl Vm {
    pub fn new() -> Self {
        Self::with_builder(InterpreterBuilder::new())
    }

    pub fn with_builder(builder: InterpreterBuilder) -> Self {
        init_tracing();
        Vm { builder }
    }

    pub fn interner(&self) -> &SharedInterner {
        self.builder.get_interner()
    }

    /// Compile `code` as `filename` and manifest its value as multi-line
    /// JSON.
    ///
    /// A panic anywhere below is reported as an internal error rather than
    /// unwinding into the caller.
    #[tracing::instrument(level = "debug", skip(self, code))]
    pub fn evaluate_snippet(&self, filename: &str, code: &str) -> Result<String, EvalError> {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let program = self
                .builder
                .get_frontend()
                .compile(self.builder.get_interner(), filename, code)
                .map_err(EvalError::Static)?;
            self.builder.clone().build().evaluate(&program)
        }));
        match result {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::warn!(%message, "evaluation panicked");
                Err(crash(message))
            }
        }
    }

    /// Render `err` the way a command line front end prints it, keeping at
    /// most `max_trace` frames of the backtrace.
    pub fn format_error(&self, err: &EvalError) -> String {
        match err {
            EvalError::Runtime(e) => {
                format!(
                    "RUNTIME ERROR: {}",
                    e.render(self.builder.get_config().max_trace)
                )
            }
            other => other.to_string(),
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
