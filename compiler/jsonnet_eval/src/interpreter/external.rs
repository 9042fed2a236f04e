//! Imports, external variables and top-level arguments.
//!
//! All three compile source text lazily through the configured front end and
//! evaluate it in the base environment, where only `std` is bound.

use std::rc::Rc;

use jsonnet_ir::{Name, SharedArena, SourceLocation};

use super::{ExtSource, Interpreter};
use crate::diagnostics::FrameContext;
use crate::errors::{import_failed, undefined_ext_var, EvalError, EvalResult};
use crate::imports::{import_dir, ImportedData};
use crate::{Deferred, Value};

impl Interpreter {
    /// `import "path"`: the file's code, compiled once per resolved
    /// location and evaluated at most once.
    pub(crate) fn import_code(
        &mut self,
        arena: &SharedArena,
        path: Name,
        site: SourceLocation,
    ) -> EvalResult {
        let from_dir = import_dir(self.interner.lookup(arena.file()));
        let path_str = self.interner.lookup(path);
        if let Some(code) = self.imports.code(&from_dir, path_str) {
            return code.force(self);
        }

        let data = self.import_data(&from_dir, path_str, site)?;
        let code = match self
            .frontend
            .compile(&self.interner, &data.found_at, &data.content)
        {
            Ok(program) => Deferred::thunk(
                FrameContext::Import(path),
                self.base_env.clone(),
                program.arena,
                program.root,
            ),
            Err(err) => {
                tracing::debug!(path = path_str, %err, "imported file failed to compile");
                Deferred::error(EvalError::Static(err))
            }
        };
        self.imports.set_code(&from_dir, path_str, code.clone());
        code.force(self)
    }

    /// `importstr "path"`: the file's content as a string.
    pub(crate) fn import_string(
        &mut self,
        arena: &SharedArena,
        path: Name,
        site: SourceLocation,
    ) -> EvalResult {
        let from_dir = import_dir(self.interner.lookup(arena.file()));
        let data = self.import_data(&from_dir, self.interner.lookup(path), site)?;
        Ok(Value::Str(data.content))
    }

    fn import_data(
        &mut self,
        from_dir: &str,
        path: &str,
        site: SourceLocation,
    ) -> Result<ImportedData, EvalError> {
        let importer = Rc::clone(&self.importer);
        self.imports
            .import_data(&*importer, from_dir, path)
            .map_err(|err| self.runtime_error(import_failed(err.to_string()), site))
    }

    /// `std.extVar(name)`.
    pub(crate) fn ext_var(&mut self, name: Name) -> EvalResult {
        let Some(var) = self.ext_vars.get(&name) else {
            return Err(self.builtin_error(undefined_ext_var(self.interner.lookup(name))));
        };
        let deferred = match &var.compiled {
            Some(deferred) => deferred.clone(),
            None => {
                let source = var.source.clone();
                let deferred =
                    self.external_deferred(name, &source, "extvar", FrameContext::ExtVar(name));
                if let Some(var) = self.ext_vars.get_mut(&name) {
                    var.compiled = Some(deferred.clone());
                }
                deferred
            }
        };
        deferred.force(self)
    }

    /// Deferred value of an external variable or top-level argument.
    ///
    /// Strings are ready immediately. Code compiles now; a compile failure
    /// is reported when the value is forced.
    pub(crate) fn external_deferred(
        &self,
        name: Name,
        source: &ExtSource,
        kind: &str,
        context: FrameContext,
    ) -> Deferred {
        match source {
            ExtSource::String(value) => Deferred::Ready(Value::string(value)),
            ExtSource::Code(code) => {
                let file_name = format!("<{kind}:{}>", self.interner.lookup(name));
                tracing::debug!(file = %file_name, "compiling external code");
                match self.frontend.compile(&self.interner, &file_name, code) {
                    Ok(program) => Deferred::thunk(
                        context,
                        self.base_env.clone(),
                        program.arena,
                        program.root,
                    ),
                    Err(err) => Deferred::error(EvalError::Static(err)),
                }
            }
        }
    }
}
