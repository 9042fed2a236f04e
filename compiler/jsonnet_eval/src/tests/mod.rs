//! Evaluator behaviour tests.
//!
//! Programs are built directly as desugared trees with [`Fixture`], the way
//! a front end would hand them over.

mod runtime_errors;

use jsonnet_ir::{BinaryOp, ExprArena, ExprId, FieldDef, Hide, Name, Program, SharedInterner};

use crate::{EvalError, Interpreter, InterpreterBuilder, Value};

/// Builds one file's tree and evaluates it.
pub(crate) struct Fixture {
    pub interner: SharedInterner,
    pub arena: ExprArena,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_file("test.jsonnet")
    }

    pub fn with_file(file: &str) -> Self {
        let interner = SharedInterner::new();
        let arena = ExprArena::new(interner.intern(file));
        Fixture { interner, arena }
    }

    pub fn name(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    pub fn num(&mut self, n: f64) -> ExprId {
        self.arena.number(n)
    }

    pub fn str(&mut self, s: &str) -> ExprId {
        let name = self.name(s);
        self.arena.string(name)
    }

    pub fn var(&mut self, s: &str) -> ExprId {
        let name = self.name(s);
        self.arena.var(name)
    }

    pub fn error(&mut self, message: &str) -> ExprId {
        let message = self.str(message);
        self.arena.error(message)
    }

    pub fn local(&mut self, binds: &[(&str, ExprId)], body: ExprId) -> ExprId {
        let binds: Vec<(Name, ExprId)> = binds.iter().map(|&(n, e)| (self.name(n), e)).collect();
        self.arena.local(&binds, body)
    }

    pub fn function(&mut self, params: &[&str], body: ExprId) -> ExprId {
        let params: Vec<Name> = params.iter().map(|p| self.name(p)).collect();
        self.arena.function(&params, body)
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.arena.binary(op, left, right)
    }

    /// `name: body`
    pub fn field(&mut self, name: &str, body: ExprId) -> FieldDef {
        self.field_with(name, Hide::Inherit, body)
    }

    pub fn field_with(&mut self, name: &str, hide: Hide, body: ExprId) -> FieldDef {
        let name = self.name(name);
        self.arena.field(name, hide, body)
    }

    /// `name+: body`
    pub fn plus_field(&mut self, name: &str, body: ExprId) -> FieldDef {
        FieldDef {
            plus_super: true,
            ..self.field(name, body)
        }
    }

    pub fn object(&mut self, fields: &[FieldDef]) -> ExprId {
        self.arena.object(&[], fields)
    }

    /// `target.name`
    pub fn dot(&mut self, target: ExprId, name: &str) -> ExprId {
        let name = self.name(name);
        self.arena.index_field(target, name)
    }

    /// `self.name`
    pub fn self_dot(&mut self, name: &str) -> ExprId {
        let this = self.arena.self_ref();
        self.dot(this, name)
    }

    /// `super.name`
    pub fn super_dot(&mut self, name: &str) -> ExprId {
        let name = self.name(name);
        self.arena.super_field(name)
    }

    /// `std.name(args...)`
    pub fn std_call(&mut self, name: &str, args: &[ExprId]) -> ExprId {
        let std = self.var("std");
        let target = self.dot(std, name);
        self.arena.apply(target, args)
    }

    pub fn builder(&self) -> InterpreterBuilder {
        Interpreter::builder().interner(self.interner.clone())
    }

    /// Evaluate and manifest `root` with default settings.
    pub fn run(self, root: ExprId) -> Result<String, EvalError> {
        self.run_with(root, |b| b)
    }

    pub fn run_with(
        self,
        root: ExprId,
        configure: impl FnOnce(InterpreterBuilder) -> InterpreterBuilder,
    ) -> Result<String, EvalError> {
        let mut interp = configure(self.builder()).build();
        interp.evaluate(&Program::new(self.arena, root))
    }

    /// Evaluate `root` and manifest it on one line, without the trailing
    /// newline.
    pub fn run_compact(self, root: ExprId) -> Result<String, EvalError> {
        let mut interp = self.builder().build();
        let program = Program::new(self.arena, root);
        let value = interp.evaluate_value(&program)?;
        interp.manifest(&value, false)
    }

    pub fn value(self, root: ExprId) -> Result<Value, EvalError> {
        let mut interp = self.builder().build();
        interp.evaluate_value(&Program::new(self.arena, root))
    }
}

/// Runtime error message, panicking on success or another error class.
pub(crate) fn runtime_message(result: Result<String, EvalError>) -> String {
    match result {
        Err(EvalError::Runtime(err)) => err.message,
        other => panic!("expected a runtime error, got {other:?}"),
    }
}
