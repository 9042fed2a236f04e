//! Diagnostic infrastructure for the evaluator.
//!
//! This module provides:
//! - `CallStack`: bounded frame tracking for function calls, builtin calls,
//!   thunk forces and imports
//! - `TraceFrame` / `FrameContext`: per-frame metadata (location, context)
//! - `EvalCounters`: optional performance counters for profiling
//!
//! `CallStack` captures backtraces at error sites. The snapshot is stored
//! on `RuntimeError` as an [`EvalBacktrace`].

use std::fmt;

use jsonnet_ir::{Name, SourceLocation, StringInterner};

use crate::errors::{stack_overflow, BacktraceFrame, EvalBacktrace, EvalError, RuntimeError};

/// What a stack frame is doing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameContext {
    /// The top-level program.
    Main,
    /// Forcing a named thunk (local, argument, array element).
    Thunk(Name),
    /// Calling a closure.
    Function,
    Builtin(&'static str),
    /// Forcing an object field.
    Field(Name),
    /// Checking object assertions.
    Assertion,
    Import(Name),
    ExtVar(Name),
    /// Forcing a top-level argument given as code.
    TopLevelArg(Name),
}

impl FrameContext {
    /// Render the context for a backtrace.
    pub fn describe(self, interner: &StringInterner) -> String {
        match self {
            FrameContext::Main => "<main>".to_string(),
            FrameContext::Thunk(name) => format!("thunk <{}>", interner.lookup(name)),
            FrameContext::Function => "function <anonymous>".to_string(),
            FrameContext::Builtin(name) => format!("builtin function <{name}>"),
            FrameContext::Field(name) => format!("field <{}>", interner.lookup(name)),
            FrameContext::Assertion => "object assertion".to_string(),
            FrameContext::Import(path) => format!("import {:?}", interner.lookup(path)),
            FrameContext::ExtVar(name) => format!("extVar <{}>", interner.lookup(name)),
            FrameContext::TopLevelArg(name) => {
                format!("top-level argument <{}>", interner.lookup(name))
            }
        }
    }
}

/// A single frame in the live call stack.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TraceFrame {
    /// Where the frame was entered (call site, field definition, ...).
    pub location: SourceLocation,
    pub context: FrameContext,
}

impl TraceFrame {
    pub fn new(location: SourceLocation, context: FrameContext) -> Self {
        TraceFrame { location, context }
    }

    fn to_backtrace(self, interner: &StringInterner) -> BacktraceFrame {
        let (file, span) = if self.location.is_unknown() {
            (None, None)
        } else {
            (
                Some(interner.lookup(self.location.file).to_string()),
                Some(self.location.span),
            )
        };
        BacktraceFrame {
            name: self.context.describe(interner),
            file,
            span,
        }
    }
}

/// Live call stack for the interpreter.
///
/// Every frame-producing operation pushes on entry and pops on every exit
/// path (see `FrameGuard`). The depth check is integrated into `push()`.
///
/// # Example
///
/// ```ignore
/// let mut stack = CallStack::new(500);
/// stack.push(TraceFrame::new(location, FrameContext::Function))?;
/// // ... evaluate function body ...
/// stack.pop();
/// ```
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<TraceFrame>,
    max_depth: usize,
}

impl CallStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame, checking the depth limit.
    ///
    /// Returns a `StackOverflow` error if the limit would be exceeded. The
    /// frame is NOT pushed on overflow, and the returned error does not yet
    /// carry a backtrace.
    pub fn push(&mut self, frame: TraceFrame) -> Result<(), RuntimeError> {
        if self.frames.len() >= self.max_depth {
            tracing::debug!(limit = self.max_depth, "call stack limit reached");
            return Err(stack_overflow(self.max_depth));
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the most recent frame.
    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn current_frame(&self) -> Option<&TraceFrame> {
        self.frames.last()
    }

    /// Snapshot the stack, innermost first.
    ///
    /// `site` is the location the error was raised at; when known it becomes
    /// the first frame, labelled with the context of the innermost frame.
    pub fn capture(&self, site: SourceLocation, interner: &StringInterner) -> EvalBacktrace {
        let mut frames = Vec::with_capacity(self.frames.len() + 1);
        if !site.is_unknown() {
            let context = self
                .frames
                .last()
                .map_or(FrameContext::Main, |frame| frame.context);
            frames.push(TraceFrame::new(site, context).to_backtrace(interner));
        }
        frames.extend(
            self.frames
                .iter()
                .rev()
                .map(|frame| frame.to_backtrace(interner)),
        );
        EvalBacktrace::new(frames)
    }

    /// Attach a backtrace to `err` unless it already carries one.
    pub fn attach_backtrace(
        &self,
        err: RuntimeError,
        site: SourceLocation,
        interner: &StringInterner,
    ) -> EvalError {
        if err.backtrace.is_some() {
            return EvalError::Runtime(err);
        }
        EvalError::Runtime(err.with_backtrace(self.capture(site, interner)))
    }
}

/// Optional performance counters.
///
/// Stored as `Option<EvalCounters>` on the interpreter. When `None`, all
/// counter increments are skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalCounters {
    pub expressions_evaluated: u64,
    pub thunks_forced: u64,
    pub function_calls: u64,
    pub builtin_calls: u64,
}

impl EvalCounters {
    #[inline]
    pub fn count_expression(&mut self) {
        self.expressions_evaluated = self.expressions_evaluated.wrapping_add(1);
    }

    #[inline]
    pub fn count_thunk_force(&mut self) {
        self.thunks_forced = self.thunks_forced.wrapping_add(1);
    }

    #[inline]
    pub fn count_function_call(&mut self) {
        self.function_calls = self.function_calls.wrapping_add(1);
    }

    #[inline]
    pub fn count_builtin_call(&mut self) {
        self.builtin_calls = self.builtin_calls.wrapping_add(1);
    }

    /// Format a summary report.
    pub fn report(&self) -> String {
        format!(
            "Evaluation profile:\n  \
             Expressions evaluated: {}\n  \
             Thunks forced:         {}\n  \
             Function calls:        {}\n  \
             Builtin calls:         {}",
            self.expressions_evaluated, self.thunks_forced, self.function_calls, self.builtin_calls,
        )
    }
}

impl fmt::Display for EvalCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report())
    }
}
