//! Jsonnet IR - the desugared syntax tree consumed by the evaluator.
//!
//! This crate is the boundary between the upstream front end (lexer, parser,
//! desugarer, static analyzer) and the evaluation core:
//! - Names for interned identifiers and field names
//! - Spans and source locations for stack traces
//! - Desugared AST nodes (`ExprKind`) stored flat in an [`ExprArena`]
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: identifiers and string literals are `Name(u32)`
//! - **Flatten Everything**: no `Box<Expr>`, children are `ExprId(u32)` indices
//! - **Desugared only**: comprehensions, string formatting, `assert` sugar and
//!   method-call syntax are gone by the time a tree reaches this crate
//!
//! Number literals are stored as `u64` bits so `ExprKind` stays `Eq + Hash`.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod arena;
pub mod ast;
mod expr_id;
mod interner;
mod name;
mod span;

pub use arena::{ExprArena, Program, SharedArena};
pub use ast::{
    BinaryOp, Bind, BindRange, ExprKind, ExprRange, FieldDef, FieldRange, Hide, ParamRange,
    UnaryOp,
};
pub use expr_id::ExprId;
pub use interner::{InternError, SharedInterner, StringInterner, StringLookup};
pub use name::Name;
pub use span::{SourceLocation, Span, SpanError};
