//! Arena allocation for the flat syntax tree.
//!
//! One arena holds one source file: the main program, one imported file, or
//! one external code snippet. Closures carry the [`SharedArena`] they were
//! created in, so a function defined in an import keeps evaluating against
//! its own file after it has been passed elsewhere.

use std::fmt;
use std::sync::Arc;

use crate::ast::{Bind, BindRange, ExprKind, ExprRange, FieldDef, FieldRange, ParamRange};
use crate::{BinaryOp, ExprId, Hide, Name, SourceLocation, Span, UnaryOp};

#[inline]
fn to_u32(len: usize, what: &str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("too many {what} in one arena: {len}"))
}

/// Contiguous storage for all expressions of one file.
///
/// `kinds` and `spans` are parallel arrays indexed by [`ExprId`]; child lists
/// are flattened into the side tables and referenced by range.
#[derive(Clone, Default)]
pub struct ExprArena {
    /// File the expressions came from (used for stack frames and as the base
    /// directory of relative imports).
    file: Name,
    kinds: Vec<ExprKind>,
    spans: Vec<Span>,
    expr_lists: Vec<ExprId>,
    binds: Vec<Bind>,
    params: Vec<Name>,
    fields: Vec<FieldDef>,
}

impl ExprArena {
    pub fn new(file: Name) -> Self {
        ExprArena {
            file,
            ..Self::default()
        }
    }

    /// Create with estimated capacity based on source size.
    /// Heuristic: ~1 expression per 20 bytes of source.
    pub fn with_capacity(file: Name, source_len: usize) -> Self {
        let estimated = source_len / 20;
        ExprArena {
            file,
            kinds: Vec::with_capacity(estimated),
            spans: Vec::with_capacity(estimated),
            expr_lists: Vec::with_capacity(estimated / 2),
            ..Self::default()
        }
    }

    #[inline]
    pub fn file(&self) -> Name {
        self.file
    }

    // ===== Expression allocation =====

    /// Allocate an expression, returning its ID.
    #[inline]
    pub fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId::new(to_u32(self.kinds.len(), "expressions"));
        self.kinds.push(kind);
        self.spans.push(span);
        id
    }

    /// # Panics
    /// Panics if `id` does not belong to this arena.
    #[inline]
    #[track_caller]
    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.kinds[id.index()]
    }

    #[inline]
    #[track_caller]
    pub fn span(&self, id: ExprId) -> Span {
        self.spans[id.index()]
    }

    /// File-qualified location of an expression.
    #[inline]
    #[track_caller]
    pub fn location(&self, id: ExprId) -> SourceLocation {
        SourceLocation::new(self.file, self.span(id))
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    // ===== Child lists =====

    pub fn push_exprs(&mut self, ids: &[ExprId]) -> ExprRange {
        if ids.is_empty() {
            return ExprRange::EMPTY;
        }
        let start = to_u32(self.expr_lists.len(), "expression list entries");
        self.expr_lists.extend_from_slice(ids);
        ExprRange::new(start, to_u32(ids.len(), "list elements"))
    }

    pub fn exprs(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.expr_lists[start..start + range.len()]
    }

    pub fn push_binds(&mut self, binds: &[Bind]) -> BindRange {
        if binds.is_empty() {
            return BindRange::EMPTY;
        }
        let start = to_u32(self.binds.len(), "binds");
        self.binds.extend_from_slice(binds);
        BindRange::new(start, to_u32(binds.len(), "binds"))
    }

    pub fn binds(&self, range: BindRange) -> &[Bind] {
        let start = range.start as usize;
        &self.binds[start..start + range.len()]
    }

    pub fn push_params(&mut self, params: &[Name]) -> ParamRange {
        if params.is_empty() {
            return ParamRange::EMPTY;
        }
        let start = to_u32(self.params.len(), "parameters");
        self.params.extend_from_slice(params);
        ParamRange::new(start, to_u32(params.len(), "parameters"))
    }

    pub fn params(&self, range: ParamRange) -> &[Name] {
        let start = range.start as usize;
        &self.params[start..start + range.len()]
    }

    pub fn push_fields(&mut self, fields: &[FieldDef]) -> FieldRange {
        if fields.is_empty() {
            return FieldRange::EMPTY;
        }
        let start = to_u32(self.fields.len(), "object fields");
        self.fields.extend_from_slice(fields);
        FieldRange::new(start, to_u32(fields.len(), "object fields"))
    }

    pub fn fields(&self, range: FieldRange) -> &[FieldDef] {
        let start = range.start as usize;
        &self.fields[start..start + range.len()]
    }

    // ===== Construction helpers =====
    //
    // Used by front ends that synthesize trees (the JSON front end, tests).
    // Every node gets `Span::DUMMY`; callers that track positions use `alloc`.

    pub fn null(&mut self) -> ExprId {
        self.alloc(ExprKind::Null, Span::DUMMY)
    }

    pub fn boolean(&mut self, value: bool) -> ExprId {
        self.alloc(ExprKind::Bool(value), Span::DUMMY)
    }

    pub fn number(&mut self, value: f64) -> ExprId {
        self.alloc(ExprKind::number(value), Span::DUMMY)
    }

    pub fn string(&mut self, value: Name) -> ExprId {
        self.alloc(ExprKind::Str(value), Span::DUMMY)
    }

    pub fn var(&mut self, name: Name) -> ExprId {
        self.alloc(ExprKind::Var(name), Span::DUMMY)
    }

    pub fn local(&mut self, binds: &[(Name, ExprId)], body: ExprId) -> ExprId {
        let binds: Vec<Bind> = binds
            .iter()
            .map(|&(name, body)| Bind { name, body })
            .collect();
        let binds = self.push_binds(&binds);
        self.alloc(ExprKind::Local { binds, body }, Span::DUMMY)
    }

    pub fn function(&mut self, params: &[Name], body: ExprId) -> ExprId {
        let params = self.push_params(params);
        self.alloc(ExprKind::Function { params, body }, Span::DUMMY)
    }

    pub fn apply(&mut self, target: ExprId, args: &[ExprId]) -> ExprId {
        let args = self.push_exprs(args);
        self.alloc(ExprKind::Apply { target, args }, Span::DUMMY)
    }

    pub fn array(&mut self, elements: &[ExprId]) -> ExprId {
        let elements = self.push_exprs(elements);
        self.alloc(ExprKind::Array(elements), Span::DUMMY)
    }

    pub fn object(&mut self, asserts: &[ExprId], fields: &[FieldDef]) -> ExprId {
        let asserts = self.push_exprs(asserts);
        let fields = self.push_fields(fields);
        self.alloc(ExprKind::Object { asserts, fields }, Span::DUMMY)
    }

    /// Field definition with a literal string name.
    pub fn field(&mut self, name: Name, hide: Hide, body: ExprId) -> FieldDef {
        FieldDef {
            name: self.string(name),
            hide,
            body,
            plus_super: false,
        }
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.alloc(ExprKind::Binary { op, left, right }, Span::DUMMY)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.alloc(ExprKind::Unary { op, operand }, Span::DUMMY)
    }

    pub fn conditional(&mut self, cond: ExprId, then_branch: ExprId, else_branch: ExprId) -> ExprId {
        self.alloc(
            ExprKind::Conditional {
                cond,
                then_branch,
                else_branch,
            },
            Span::DUMMY,
        )
    }

    pub fn index(&mut self, target: ExprId, index: ExprId) -> ExprId {
        self.alloc(ExprKind::Index { target, index }, Span::DUMMY)
    }

    /// `target.name` with a literal field name.
    pub fn index_field(&mut self, target: ExprId, name: Name) -> ExprId {
        let index = self.string(name);
        self.index(target, index)
    }

    /// `super.name`.
    pub fn super_field(&mut self, name: Name) -> ExprId {
        let index = self.string(name);
        self.alloc(ExprKind::SuperIndex { index }, Span::DUMMY)
    }

    pub fn self_ref(&mut self) -> ExprId {
        self.alloc(ExprKind::SelfRef, Span::DUMMY)
    }

    pub fn error(&mut self, message: ExprId) -> ExprId {
        self.alloc(ExprKind::Error(message), Span::DUMMY)
    }

    pub fn import(&mut self, path: Name) -> ExprId {
        self.alloc(ExprKind::Import(path), Span::DUMMY)
    }

    pub fn import_str(&mut self, path: Name) -> ExprId {
        self.alloc(ExprKind::ImportStr(path), Span::DUMMY)
    }
}

impl fmt::Debug for ExprArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExprArena {{ file: {:?}, {} exprs, {} list entries, {} binds, {} fields }}",
            self.file,
            self.kinds.len(),
            self.expr_lists.len(),
            self.binds.len(),
            self.fields.len()
        )
    }
}

/// Shared, immutable arena handle.
///
/// All arena sharing goes through this type: closures, object fields and
/// thunks each hold one so their bodies outlive the front end's copy.
#[derive(Clone)]
pub struct SharedArena(Arc<ExprArena>);

impl SharedArena {
    pub fn new(arena: ExprArena) -> Self {
        SharedArena(Arc::new(arena))
    }

    /// True if both handles point at the same arena.
    pub fn ptr_eq(&self, other: &SharedArena) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for SharedArena {
    type Target = ExprArena;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for SharedArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedArena({:?})", &*self.0)
    }
}

/// A compiled source file: its arena plus the root expression.
///
/// This is what a front end hands to the evaluator for the main file, for
/// every imported file and for every external code snippet.
#[derive(Clone, Debug)]
pub struct Program {
    pub arena: SharedArena,
    pub root: ExprId,
}

impl Program {
    pub fn new(arena: ExprArena, root: ExprId) -> Self {
        Program {
            arena: SharedArena::new(arena),
            root,
        }
    }
}
