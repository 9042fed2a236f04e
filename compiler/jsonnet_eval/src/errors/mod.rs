//! Error types produced while forcing values.
//!
//! # Structured Error Categories
//!
//! `RuntimeErrorKind` carries the typed category of every runtime failure.
//! The `#[cold]` factory functions at the bottom of this module are the only
//! way evaluator code builds a [`RuntimeError`]; they fill in both `kind`
//! and `message`. The interpreter then attaches the live call stack as an
//! [`EvalBacktrace`] before the error leaves the failing frame.
//!
//! [`EvalError`] is what every evaluation step returns:
//! - `Runtime`: anything that went wrong while forcing (user `error`, type
//!   mismatches, missing fields, failed assertions, stack exhaustion, ...)
//! - `Static`: a front-end error surfaced lazily by an import or by external
//!   code that was compiled on first use
//! - `Internal`: a broken contract with the front end (an unresolved
//!   variable, a malformed tree) or a host panic caught at the top level

use std::fmt;

use jsonnet_ir::{SourceLocation, Span};

use crate::Value;

/// Result of forcing a value.
pub type EvalResult = Result<Value, EvalError>;

/// Typed runtime error category.
///
/// The `Display` impl produces the user-facing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    // User
    /// `error "..."` in user code.
    UserError { message: String },
    AssertionFailed,

    // Types
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },
    BinaryOperandMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    UnaryOperandMismatch {
        op: &'static str,
        operand: &'static str,
    },

    // Arithmetic
    DivisionByZero,
    Overflow,
    NotANumber,
    NegativeShift,

    // Objects
    FieldDoesNotExist { field: String },
    FieldNameNotString,
    DuplicateField { field: String },
    SelfOutsideObject,
    SuperOutsideObject,

    // Indexing
    NotIndexable { type_name: &'static str },
    IndexOutOfBounds { index: i64, len: usize },
    NonIntegerIndex { index: String },

    // Functions
    ArityMismatch {
        name: Option<&'static str>,
        expected: usize,
        got: usize,
    },
    MissingArgument { name: String },
    UnknownParameter { name: String },
    StackOverflow { limit: usize },
    /// A builtin rejected an argument value of the right type.
    BadBuiltinArgument {
        builtin: &'static str,
        message: String,
    },
    FunctionEquality,

    // Output
    ManifestFunction,

    // Environment
    UndefinedExtVar { name: String },
    ImportFailed { message: String },
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserError { message } => write!(f, "{message}"),
            Self::AssertionFailed => write!(f, "Object assertion failed."),

            Self::TypeMismatch { expected, got } => {
                write!(f, "Unexpected type {got}, expected {expected}")
            }
            Self::BinaryOperandMismatch { op, left, right } => {
                write!(f, "Binary operator {op} does not operate on types {left} and {right}.")
            }
            Self::UnaryOperandMismatch { op, operand } => {
                write!(f, "Unary operator {op} does not operate on type {operand}.")
            }

            Self::DivisionByZero => write!(f, "Division by zero."),
            Self::Overflow => write!(f, "Overflow"),
            Self::NotANumber => write!(f, "Not a number"),
            Self::NegativeShift => write!(f, "Shift by negative exponent."),

            Self::FieldDoesNotExist { field } => write!(f, "Field does not exist: {field}"),
            Self::FieldNameNotString => write!(f, "Field name was not a string."),
            Self::DuplicateField { field } => write!(f, "Duplicate field name: \"{field}\""),
            Self::SelfOutsideObject => write!(f, "Can't use self outside of an object."),
            Self::SuperOutsideObject => write!(f, "Can't use super outside of an object."),

            Self::NotIndexable { type_name } => write!(f, "Value non indexable: {type_name}"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "Index {index} out of bounds, not within [0, {len})")
            }
            Self::NonIntegerIndex { index } => {
                write!(f, "Index must be an integer, got {index}")
            }

            Self::ArityMismatch {
                name,
                expected,
                got,
            } => {
                let arg_word = if *expected == 1 {
                    "argument"
                } else {
                    "arguments"
                };
                match name {
                    Some(name) => write!(f, "{name} expects {expected} {arg_word}, got {got}"),
                    None => write!(f, "Function expects {expected} {arg_word}, got {got}"),
                }
            }
            Self::MissingArgument { name } => write!(f, "Missing argument: {name}"),
            Self::UnknownParameter { name } => write!(f, "Function has no parameter {name}"),
            Self::StackOverflow { .. } => write!(f, "Max stack frames exceeded."),
            Self::BadBuiltinArgument { builtin, message } => write!(f, "{builtin}: {message}"),
            Self::FunctionEquality => write!(f, "Cannot test equality of functions"),

            Self::ManifestFunction => write!(f, "Couldn't manifest function in JSON output."),

            Self::UndefinedExtVar { name } => write!(f, "Undefined external variable: {name}"),
            Self::ImportFailed { message } => write!(f, "{message}"),
        }
    }
}

/// A single frame in an evaluation backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    /// Context the frame belongs to, e.g. `function <anonymous>`.
    pub name: String,
    /// File name, absent for synthesized code.
    pub file: Option<String>,
    pub span: Option<Span>,
}

impl fmt::Display for BacktraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.span) {
            (Some(file), Some(span)) => write!(f, "{file}:{span}\t{}", self.name),
            (Some(file), None) => write!(f, "{file}\t{}", self.name),
            _ => write!(f, "<builtin>\t{}", self.name),
        }
    }
}

/// Immutable snapshot of the call stack at an error site.
///
/// Frames are ordered innermost (most recent) first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Render at most `max_frames` frames (0 renders all of them), eliding
    /// the middle of long traces.
    pub fn render(&self, max_frames: usize) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        if max_frames == 0 || self.frames.len() <= max_frames {
            for frame in &self.frames {
                let _ = writeln!(out, "\t{frame}");
            }
            return out;
        }
        let head = max_frames / 2;
        let tail = max_frames - head;
        for frame in &self.frames[..head] {
            let _ = writeln!(out, "\t{frame}");
        }
        let _ = writeln!(out, "\t...");
        for frame in &self.frames[self.frames.len() - tail..] {
            let _ = writeln!(out, "\t{frame}");
        }
        out
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(0))
    }
}

/// Failure while forcing a value.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    /// Human-readable message; equals `kind.to_string()`.
    pub message: String,
    /// Call stack at the error site, attached by the interpreter.
    pub backtrace: Option<EvalBacktrace>,
}

impl RuntimeError {
    fn from_kind(kind: RuntimeErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            backtrace: None,
        }
    }

    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        self.backtrace = Some(backtrace);
        self
    }

    /// Message followed by the rendered backtrace.
    pub fn render(&self, max_frames: usize) -> String {
        match &self.backtrace {
            Some(bt) if !bt.is_empty() => format!("{}\n{}", self.message, bt.render(max_frames)),
            _ => self.message.clone(),
        }
    }
}

/// Error reported by the front end (lexer, parser, desugarer, analyzer).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StaticError {
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl StaticError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

/// Violated front-end contract or recovered host panic.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct InternalError {
    pub message: String,
}

/// Any error surfaced by evaluation.
#[derive(Clone, Debug, thiserror::Error)]
pub enum EvalError {
    #[error("RUNTIME ERROR: {0}")]
    Runtime(#[from] RuntimeError),
    #[error("STATIC ERROR: {0}")]
    Static(#[from] StaticError),
    #[error("(CRASH) {0}")]
    Internal(#[from] InternalError),
}

impl EvalError {
    pub fn as_runtime(&self) -> Option<&RuntimeError> {
        match self {
            EvalError::Runtime(err) => Some(err),
            _ => None,
        }
    }

    /// Runtime error category, if this is a runtime error.
    pub fn runtime_kind(&self) -> Option<&RuntimeErrorKind> {
        self.as_runtime().map(|err| &err.kind)
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, EvalError::Internal(_))
    }
}

// Internal errors

#[cold]
pub fn unknown_variable(name: &str) -> EvalError {
    EvalError::Internal(InternalError {
        message: format!("Unknown variable: {name} (should have been caught statically)"),
    })
}

#[cold]
pub fn crash(message: impl Into<String>) -> EvalError {
    EvalError::Internal(InternalError {
        message: message.into(),
    })
}

// User errors

#[cold]
pub fn user_error(message: &str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::UserError {
        message: message.to_string(),
    })
}

#[cold]
pub fn assertion_failed() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::AssertionFailed)
}

// Type errors

#[cold]
pub fn type_mismatch(expected: &'static str, got: &'static str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::TypeMismatch { expected, got })
}

#[cold]
pub fn binary_operand_mismatch(
    op: &'static str,
    left: &'static str,
    right: &'static str,
) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::BinaryOperandMismatch { op, left, right })
}

#[cold]
pub fn unary_operand_mismatch(op: &'static str, operand: &'static str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::UnaryOperandMismatch { op, operand })
}

// Arithmetic errors

#[cold]
pub fn division_by_zero() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::DivisionByZero)
}

#[cold]
pub fn overflow() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::Overflow)
}

#[cold]
pub fn not_a_number() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::NotANumber)
}

#[cold]
pub fn negative_shift() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::NegativeShift)
}

// Object errors

#[cold]
pub fn field_does_not_exist(field: &str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::FieldDoesNotExist {
        field: field.to_string(),
    })
}

#[cold]
pub fn field_name_not_string() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::FieldNameNotString)
}

#[cold]
pub fn duplicate_field(field: &str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::DuplicateField {
        field: field.to_string(),
    })
}

#[cold]
pub fn self_outside_object() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::SelfOutsideObject)
}

#[cold]
pub fn super_outside_object() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::SuperOutsideObject)
}

// Index errors

#[cold]
pub fn not_indexable(type_name: &'static str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::NotIndexable { type_name })
}

#[cold]
pub fn index_out_of_bounds(index: i64, len: usize) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::IndexOutOfBounds { index, len })
}

#[cold]
pub fn non_integer_index(index: f64) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::NonIntegerIndex {
        index: index.to_string(),
    })
}

// Function errors

#[cold]
pub fn arity_mismatch(name: Option<&'static str>, expected: usize, got: usize) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::ArityMismatch {
        name,
        expected,
        got,
    })
}

#[cold]
pub fn missing_argument(name: &str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::MissingArgument {
        name: name.to_string(),
    })
}

#[cold]
pub fn unknown_parameter(name: &str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::UnknownParameter {
        name: name.to_string(),
    })
}

#[cold]
pub fn stack_overflow(limit: usize) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::StackOverflow { limit })
}

#[cold]
pub fn bad_builtin_argument(builtin: &'static str, message: impl Into<String>) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::BadBuiltinArgument {
        builtin,
        message: message.into(),
    })
}

#[cold]
pub fn function_equality() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::FunctionEquality)
}

// Output and environment errors

#[cold]
pub fn manifest_function() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::ManifestFunction)
}

#[cold]
pub fn undefined_ext_var(name: &str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::UndefinedExtVar {
        name: name.to_string(),
    })
}

#[cold]
pub fn import_failed(message: String) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::ImportFailed { message })
}
