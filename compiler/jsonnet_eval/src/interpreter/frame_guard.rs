//! RAII-style guard for call stack frames.
//!
//! Every frame pushed on the interpreter's [`CallStack`](crate::diagnostics::CallStack)
//! must be popped on every exit path: normal return, `?` propagation and
//! unwinding. [`FrameGuard`] pops in `Drop`.
//!
//! # Design
//!
//! The guard holds `&mut Interpreter` and implements `Deref`/`DerefMut`, so
//! code inside the frame uses the guard exactly like the interpreter itself.
//!
//! # Usage
//!
//! ```text
//! // Direct guard usage
//! {
//!     let mut framed = interpreter.enter_frame(frame)?;
//!     framed.eval(&arena, body, &env)?;
//! } // frame popped here, even on panic
//!
//! // Closure-based (convenience, also grows the native stack if needed)
//! interpreter.with_frame(frame, |this| this.eval(&arena, body, &env))
//! ```

use std::ops::{Deref, DerefMut};

use jsonnet_stack::ensure_sufficient_stack;

use super::Interpreter;
use crate::diagnostics::TraceFrame;
use crate::errors::EvalError;

/// RAII guard that pops one call stack frame on drop.
pub struct FrameGuard<'a> {
    interpreter: &'a mut Interpreter,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.interpreter.stack.pop();
    }
}

impl Deref for FrameGuard<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for FrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl Interpreter {
    /// Push `frame`, failing with "Max stack frames exceeded." if the stack
    /// is full. The frame is popped when the returned guard drops.
    pub fn enter_frame(&mut self, frame: TraceFrame) -> Result<FrameGuard<'_>, EvalError> {
        if let Err(err) = self.stack.push(frame) {
            return Err(self.runtime_error(err, frame.location));
        }
        Ok(FrameGuard { interpreter: self })
    }

    /// Run `f` inside `frame`.
    pub fn with_frame<T, F>(&mut self, frame: TraceFrame, f: F) -> Result<T, EvalError>
    where
        F: FnOnce(&mut Interpreter) -> Result<T, EvalError>,
    {
        let mut guard = self.enter_frame(frame)?;
        ensure_sufficient_stack(|| f(&mut *guard))
    }
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "Tests use expect for brevity")]
mod tests {
    use jsonnet_ir::SourceLocation;

    use crate::diagnostics::{FrameContext, TraceFrame};
    use crate::errors::RuntimeErrorKind;
    use crate::Interpreter;

    fn frame() -> TraceFrame {
        TraceFrame::new(SourceLocation::UNKNOWN, FrameContext::Function)
    }

    #[test]
    fn guard_pops_on_drop() {
        let mut interp = Interpreter::builder().build();
        {
            let guard = interp.enter_frame(frame()).expect("room for one frame");
            assert_eq!(guard.stack_depth(), 1);
        }
        assert_eq!(interp.stack_depth(), 0);
    }

    #[test]
    fn with_frame_pops_on_error() {
        let mut interp = Interpreter::builder().build();
        let result: Result<(), _> = interp.with_frame(frame(), |this| {
            assert_eq!(this.stack_depth(), 1);
            Err(crate::errors::crash("inner failure"))
        });
        assert!(result.is_err());
        assert_eq!(interp.stack_depth(), 0);
    }

    #[test]
    fn enter_frame_respects_limit() {
        let mut interp = Interpreter::builder().max_stack(2).build();
        let result = interp.with_frame(frame(), |this| {
            this.with_frame(frame(), |inner| {
                inner.with_frame(frame(), |_| Ok(()))
            })
        });
        let err = result.expect_err("third frame exceeds the limit");
        assert_eq!(
            err.runtime_kind(),
            Some(&RuntimeErrorKind::StackOverflow { limit: 2 })
        );
        let trace = err
            .as_runtime()
            .and_then(|e| e.backtrace.as_ref())
            .expect("overflow carries a backtrace");
        assert_eq!(trace.len(), 2);
        assert_eq!(interp.stack_depth(), 0);
    }
}
