//! Deferred values and the laziness engine.
//!
//! A [`Deferred`] is a value that may not have been computed yet. Forcing one
//! needs the interpreter (to evaluate, push frames and report errors), so
//! all forcing goes through [`Deferred::force`].
//!
//! Only [`CachedThunk`] memoizes. Forcing it clones the inner deferred out,
//! forces that, and replaces the slot with [`Deferred::Ready`] on success.
//! Errors are not cached; forcing again recomputes and fails the same way.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use jsonnet_ir::{ExprId, SharedArena, SourceLocation};
use smallvec::SmallVec;

use crate::diagnostics::{FrameContext, TraceFrame};
use crate::errors::{EvalError, EvalResult};
use crate::{Environment, FunctionValue, Interpreter, Value};

/// Argument list of a call.
pub type Args = SmallVec<[Deferred; 4]>;

/// An expression waiting to be evaluated in a captured environment.
pub struct ExprThunk {
    /// Frame pushed while forcing.
    pub context: FrameContext,
    pub env: Environment,
    pub arena: SharedArena,
    pub body: ExprId,
}

/// A function application waiting to happen.
pub struct CallThunk {
    pub function: FunctionValue,
    pub args: Args,
    pub location: SourceLocation,
}

/// Memoizing wrapper around another deferred.
pub struct CachedThunk {
    inner: RefCell<Deferred>,
}

impl CachedThunk {
    pub fn new(inner: Deferred) -> Self {
        CachedThunk {
            inner: RefCell::new(inner),
        }
    }

    /// True once a force has succeeded.
    pub fn is_forced(&self) -> bool {
        matches!(*self.inner.borrow(), Deferred::Ready(_))
    }

    fn force(&self, interpreter: &mut Interpreter) -> EvalResult {
        // Clone out so no borrow is held while the inner deferred runs; it
        // may force this same thunk again.
        let inner = self.inner.borrow().clone();
        if let Deferred::Ready(value) = inner {
            return Ok(value);
        }
        let value = inner.force(interpreter)?;
        *self.inner.borrow_mut() = Deferred::Ready(value.clone());
        Ok(value)
    }
}

/// A possibly-unevaluated value.
#[derive(Clone)]
pub enum Deferred {
    Ready(Value),
    Expr(Rc<ExprThunk>),
    Call(Rc<CallThunk>),
    Cached(Rc<CachedThunk>),
    /// Fails with the carried error every time it is forced.
    Error(Rc<EvalError>),
}

impl Deferred {
    /// Memoized thunk over `body` in `env`.
    pub fn thunk(
        context: FrameContext,
        env: Environment,
        arena: SharedArena,
        body: ExprId,
    ) -> Self {
        Deferred::cached(Deferred::Expr(Rc::new(ExprThunk {
            context,
            env,
            arena,
            body,
        })))
    }

    /// Memoized call of `function` with `args`.
    pub fn call(function: FunctionValue, args: Args, location: SourceLocation) -> Self {
        Deferred::cached(Deferred::Call(Rc::new(CallThunk {
            function,
            args,
            location,
        })))
    }

    pub fn cached(inner: Deferred) -> Self {
        match inner {
            Deferred::Ready(_) | Deferred::Error(_) | Deferred::Cached(_) => inner,
            _ => Deferred::Cached(Rc::new(CachedThunk::new(inner))),
        }
    }

    pub fn error(err: EvalError) -> Self {
        Deferred::Error(Rc::new(err))
    }

    /// Compute the value (or fetch the memoized one).
    pub fn force(&self, interpreter: &mut Interpreter) -> EvalResult {
        match self {
            Deferred::Ready(value) => Ok(value.clone()),
            Deferred::Expr(thunk) => {
                interpreter.count(crate::diagnostics::EvalCounters::count_thunk_force);
                let frame = TraceFrame::new(thunk.arena.location(thunk.body), thunk.context);
                interpreter.with_frame(frame, |this| {
                    this.eval(&thunk.arena, thunk.body, &thunk.env)
                })
            }
            Deferred::Call(call) => {
                interpreter.call_function(&call.function, &call.args, call.location)
            }
            Deferred::Cached(cached) => cached.force(interpreter),
            Deferred::Error(err) => Err((**err).clone()),
        }
    }
}

impl From<Value> for Deferred {
    fn from(value: Value) -> Self {
        Deferred::Ready(value)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deferred::Ready(value) => write!(f, "Ready({value:?})"),
            Deferred::Expr(thunk) => write!(f, "Expr({:?})", thunk.body),
            Deferred::Call(call) => write!(f, "Call({:?})", call.function),
            Deferred::Cached(cached) => write!(f, "Cached({:?})", cached.inner.borrow()),
            Deferred::Error(err) => write!(f, "Error({err})"),
        }
    }
}
