//! `InterpreterBuilder` for creating Interpreter instances with various configurations.

use std::rc::Rc;

use jsonnet_ir::SharedInterner;
use rustc_hash::FxHashMap;

use super::{ExtVar, FrameNames, Interpreter};
use crate::builtins::std_object;
use crate::diagnostics::{CallStack, EvalCounters};
use crate::frontend::{Frontend, JsonFrontend};
use crate::imports::{FileImporter, ImportCache, Importer};
use crate::SlotArena;

/// Plain-data evaluation settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalConfig {
    /// Maximum number of live stack frames.
    pub max_stack: usize,
    /// Maximum number of frames shown when rendering a backtrace (0 shows
    /// all of them).
    pub max_trace: usize,
    /// Collect [`EvalCounters`].
    pub profile: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            max_stack: 500,
            max_trace: 20,
            profile: false,
        }
    }
}

/// Value of an external variable or top-level argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtSource {
    /// Bound as a string as-is.
    String(String),
    /// Compiled with the configured front end on first use.
    Code(String),
}

/// Builder for creating Interpreter instances.
///
/// Cheap to clone; [`Vm`](crate::Vm) keeps one and builds a fresh
/// interpreter per evaluation.
#[derive(Clone)]
pub struct InterpreterBuilder {
    interner: SharedInterner,
    config: EvalConfig,
    ext_vars: Vec<(String, ExtSource)>,
    tlas: Vec<(String, ExtSource)>,
    importer: Rc<dyn Importer>,
    frontend: Rc<dyn Frontend>,
}

impl InterpreterBuilder {
    /// Default configuration: `max_stack` 500, the file importer with no
    /// library paths, and the JSON front end.
    pub fn new() -> Self {
        InterpreterBuilder {
            interner: SharedInterner::new(),
            config: EvalConfig::default(),
            ext_vars: Vec::new(),
            tlas: Vec::new(),
            importer: Rc::new(FileImporter::default()),
            frontend: Rc::new(JsonFrontend),
        }
    }

    /// Share an interner with the front end that produced the programs.
    #[must_use]
    pub fn interner(mut self, interner: SharedInterner) -> Self {
        self.interner = interner;
        self
    }

    #[must_use]
    pub fn config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn max_stack(mut self, max_stack: usize) -> Self {
        self.config.max_stack = max_stack;
        self
    }

    #[must_use]
    pub fn max_trace(mut self, max_trace: usize) -> Self {
        self.config.max_trace = max_trace;
        self
    }

    #[must_use]
    pub fn profile(mut self, profile: bool) -> Self {
        self.config.profile = profile;
        self
    }

    /// Bind external variable `name` to a string.
    #[must_use]
    pub fn ext_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.ext_vars
            .push((name.into(), ExtSource::String(value.into())));
        self
    }

    /// Bind external variable `name` to code.
    #[must_use]
    pub fn ext_code(mut self, name: impl Into<String>, code: impl Into<String>) -> Self {
        self.ext_vars.push((name.into(), ExtSource::Code(code.into())));
        self
    }

    /// Pass a string top-level argument.
    #[must_use]
    pub fn tla_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tlas.push((name.into(), ExtSource::String(value.into())));
        self
    }

    /// Pass a code top-level argument.
    #[must_use]
    pub fn tla_code(mut self, name: impl Into<String>, code: impl Into<String>) -> Self {
        self.tlas.push((name.into(), ExtSource::Code(code.into())));
        self
    }

    #[must_use]
    pub fn importer(mut self, importer: impl Importer + 'static) -> Self {
        self.importer = Rc::new(importer);
        self
    }

    #[must_use]
    pub fn frontend(mut self, frontend: impl Frontend + 'static) -> Self {
        self.frontend = Rc::new(frontend);
        self
    }

    pub fn get_interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn get_config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn get_frontend(&self) -> &Rc<dyn Frontend> {
        &self.frontend
    }

    /// Build the interpreter.
    ///
    /// A name given twice keeps the later value.
    pub fn build(self) -> Interpreter {
        let interner = self.interner;
        let std_object = std_object(&interner);
        let base_env = Interpreter::base_environment(interner.intern("std"), &std_object);

        let ext_vars: FxHashMap<_, _> = self
            .ext_vars
            .into_iter()
            .map(|(name, source)| {
                (
                    interner.intern(&name),
                    ExtVar {
                        source,
                        compiled: None,
                    },
                )
            })
            .collect();

        let mut tlas = Vec::with_capacity(self.tlas.len());
        for (name, source) in self.tlas {
            let name = interner.intern(&name);
            tlas.retain(|(existing, _)| *existing != name);
            tlas.push((name, source));
        }

        let names = FrameNames {
            arg: interner.intern("arg"),
            array_element: interner.intern("array_element"),
            rhs: interner.intern("rhs"),
        };

        Interpreter {
            stack: CallStack::new(self.config.max_stack),
            counters: self.config.profile.then(EvalCounters::default),
            config: self.config,
            slots: SlotArena::new(),
            field_cache: FxHashMap::default(),
            imports: ImportCache::new(),
            importer: self.importer,
            frontend: self.frontend,
            ext_vars,
            tlas,
            std_object,
            base_env,
            names,
            interner,
        }
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InterpreterBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpreterBuilder")
            .field("config", &self.config)
            .field("ext_vars", &self.ext_vars)
            .field("tlas", &self.tlas)
            .finish_non_exhaustive()
    }
}
