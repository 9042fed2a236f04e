//! Desugared syntax tree.
//!
//! Nodes live in an [`ExprArena`](crate::ExprArena) and refer to their
//! children by [`ExprId`]. The node set is the output of the desugarer:
//! object comprehensions, `assert` expressions, string formatting and slicing
//! have already been rewritten into this core.
//!
//! The static analyzer guarantees that every [`ExprKind::Var`] resolves to an
//! enclosing `local`, function parameter or the implicit `std` binding.

mod operators;
mod ranges;

use std::fmt;

pub use operators::{BinaryOp, UnaryOp};
pub use ranges::{BindRange, ExprRange, FieldRange, ParamRange};

use crate::{ExprId, Name};

/// Manifestation visibility of an object field.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Hide {
    /// `::` - never manifested, even if a super object shows it.
    Hidden,
    /// `:` - keeps whatever visibility the super object decided.
    #[default]
    Inherit,
    /// `:::` - always manifested.
    Visible,
}

/// One binding of a `local` expression.
///
/// All binds of one `local` are in scope in every bind body.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Bind {
    pub name: Name,
    pub body: ExprId,
}

/// One field of a desugared object literal.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FieldDef {
    /// Evaluates to the field name; `null` omits the field.
    pub name: ExprId,
    pub hide: Hide,
    pub body: ExprId,
    /// `f+: body`, evaluated as `super.f + body` when a super field exists.
    pub plus_super: bool,
}

/// Expression node kinds.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum ExprKind {
    Null,
    Bool(bool),
    /// Number literal, stored as bits for `Hash`.
    Number(u64),
    Str(Name),

    Var(Name),
    Local {
        binds: BindRange,
        body: ExprId,
    },
    Function {
        params: ParamRange,
        body: ExprId,
    },
    Apply {
        target: ExprId,
        args: ExprRange,
    },

    Array(ExprRange),
    Object {
        asserts: ExprRange,
        fields: FieldRange,
    },

    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Conditional {
        cond: ExprId,
        then_branch: ExprId,
        else_branch: ExprId,
    },

    Index {
        target: ExprId,
        index: ExprId,
    },
    SuperIndex {
        index: ExprId,
    },
    SelfRef,

    Error(ExprId),
    Import(Name),
    ImportStr(Name),
}

impl ExprKind {
    /// Number literal from an `f64`.
    pub fn number(n: f64) -> Self {
        ExprKind::Number(n.to_bits())
    }

    /// Short description used in stack frames and debug output.
    pub const fn describe(&self) -> &'static str {
        match self {
            ExprKind::Null => "null",
            ExprKind::Bool(_) => "boolean literal",
            ExprKind::Number(_) => "number literal",
            ExprKind::Str(_) => "string literal",
            ExprKind::Var(_) => "variable",
            ExprKind::Local { .. } => "local",
            ExprKind::Function { .. } => "function",
            ExprKind::Apply { .. } => "function call",
            ExprKind::Array(_) => "array",
            ExprKind::Object { .. } => "object",
            ExprKind::Binary { .. } => "binary operator",
            ExprKind::Unary { .. } => "unary operator",
            ExprKind::Conditional { .. } => "if",
            ExprKind::Index { .. } => "index",
            ExprKind::SuperIndex { .. } => "super index",
            ExprKind::SelfRef => "self",
            ExprKind::Error(_) => "error",
            ExprKind::Import(_) => "import",
            ExprKind::ImportStr(_) => "importstr",
        }
    }
}

impl fmt::Debug for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprKind::Null => write!(f, "Null"),
            ExprKind::Bool(b) => write!(f, "Bool({b})"),
            ExprKind::Number(bits) => write!(f, "Number({})", f64::from_bits(*bits)),
            ExprKind::Str(name) => write!(f, "Str({name:?})"),
            ExprKind::Var(name) => write!(f, "Var({name:?})"),
            ExprKind::Local { binds, body } => write!(f, "Local({binds:?}, {body:?})"),
            ExprKind::Function { params, body } => write!(f, "Function({params:?}, {body:?})"),
            ExprKind::Apply { target, args } => write!(f, "Apply({target:?}, {args:?})"),
            ExprKind::Array(elems) => write!(f, "Array({elems:?})"),
            ExprKind::Object { asserts, fields } => write!(f, "Object({asserts:?}, {fields:?})"),
            ExprKind::Binary { op, left, right } => {
                write!(f, "Binary({left:?} {} {right:?})", op.as_symbol())
            }
            ExprKind::Unary { op, operand } => write!(f, "Unary({}{operand:?})", op.as_symbol()),
            ExprKind::Conditional {
                cond,
                then_branch,
                else_branch,
            } => write!(f, "If({cond:?}, {then_branch:?}, {else_branch:?})"),
            ExprKind::Index { target, index } => write!(f, "Index({target:?}[{index:?}])"),
            ExprKind::SuperIndex { index } => write!(f, "SuperIndex({index:?})"),
            ExprKind::SelfRef => write!(f, "Self"),
            ExprKind::Error(e) => write!(f, "Error({e:?})"),
            ExprKind::Import(path) => write!(f, "Import({path:?})"),
            ExprKind::ImportStr(path) => write!(f, "ImportStr({path:?})"),
        }
    }
}
