//! Import resolution and caching.
//!
//! An [`Importer`] turns `(directory of the importing file, import path)`
//! into file contents. The interpreter caches every answer, failures
//! included, in an [`ImportCache`] so a path is resolved at most once per
//! evaluation and an imported file is compiled and evaluated at most once.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::Deferred;

/// Contents of a resolved import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedData {
    pub content: Rc<str>,
    /// Path the content was found at; becomes the file name of the imported
    /// code, so its own relative imports resolve against it.
    pub found_at: String,
}

/// Why an import could not be resolved.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    #[error("Couldn't open import {path:?}: No match locally or in the Jsonnet library paths.")]
    NotFound { path: String },
    #[error("Import not available {path}")]
    NotAvailable { path: String },
    #[error("Couldn't read import {path:?}: {message}")]
    Io { path: String, message: String },
}

/// Resolves import paths to file contents.
pub trait Importer {
    /// `from_dir` is the directory of the importing file ("" for snippets
    /// without a directory).
    fn import(&self, from_dir: &str, path: &str) -> Result<ImportedData, ImportError>;
}

/// Reads imports from disk: first relative to the importing file, then
/// from each library path, last one first.
#[derive(Clone, Debug, Default)]
pub struct FileImporter {
    jpaths: Vec<PathBuf>,
}

impl FileImporter {
    pub fn new(jpaths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        FileImporter {
            jpaths: jpaths.into_iter().map(Into::into).collect(),
        }
    }

    fn try_path(dir: &Path, path: &str) -> Result<Option<ImportedData>, ImportError> {
        let candidate = if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            dir.join(path)
        };
        match std::fs::read_to_string(&candidate) {
            Ok(content) => Ok(Some(ImportedData {
                content: Rc::from(content),
                found_at: candidate.to_string_lossy().into_owned(),
            })),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) if candidate.is_dir() => {
                tracing::debug!(path = %candidate.display(), %err, "import candidate is a directory");
                Ok(None)
            }
            Err(err) => Err(ImportError::Io {
                path: path.to_string(),
                message: err.to_string(),
            }),
        }
    }
}

impl Importer for FileImporter {
    fn import(&self, from_dir: &str, path: &str) -> Result<ImportedData, ImportError> {
        if let Some(found) = Self::try_path(Path::new(from_dir), path)? {
            return Ok(found);
        }
        for jpath in self.jpaths.iter().rev() {
            if let Some(found) = Self::try_path(jpath, path)? {
                return Ok(found);
            }
        }
        Err(ImportError::NotFound {
            path: path.to_string(),
        })
    }
}

/// Serves imports from an in-memory map keyed by path, ignoring the
/// importing directory.
#[derive(Clone, Debug, Default)]
pub struct MemoryImporter {
    files: FxHashMap<String, Rc<str>>,
}

impl MemoryImporter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, content: &str) -> Self {
        self.files.insert(path.into(), Rc::from(content));
        self
    }
}

impl Importer for MemoryImporter {
    fn import(&self, _from_dir: &str, path: &str) -> Result<ImportedData, ImportError> {
        match self.files.get(path) {
            Some(content) => Ok(ImportedData {
                content: Rc::clone(content),
                found_at: path.to_string(),
            }),
            None => Err(ImportError::NotAvailable {
                path: path.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ImportKey {
    dir: String,
    path: String,
}

struct ImportEntry {
    data: Result<ImportedData, ImportError>,
    /// The imported file as code, compiled and wrapped on first `import`.
    code: Option<Deferred>,
}

/// Per-evaluation cache of import results.
#[derive(Default)]
pub struct ImportCache {
    entries: FxHashMap<ImportKey, ImportEntry>,
}

impl ImportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve through `importer` unless already cached.
    pub fn import_data(
        &mut self,
        importer: &dyn Importer,
        from_dir: &str,
        path: &str,
    ) -> Result<ImportedData, ImportError> {
        let key = ImportKey {
            dir: from_dir.to_string(),
            path: path.to_string(),
        };
        let entry = self.entries.entry(key).or_insert_with(|| {
            tracing::debug!(from_dir, path, "resolving import");
            ImportEntry {
                data: importer.import(from_dir, path),
                code: None,
            }
        });
        entry.data.clone()
    }

    /// The cached code deferred for an import, if any.
    pub fn code(&self, from_dir: &str, path: &str) -> Option<Deferred> {
        self.entries
            .get(&ImportKey {
                dir: from_dir.to_string(),
                path: path.to_string(),
            })
            .and_then(|entry| entry.code.clone())
    }

    pub fn set_code(&mut self, from_dir: &str, path: &str, code: Deferred) {
        if let Some(entry) = self.entries.get_mut(&ImportKey {
            dir: from_dir.to_string(),
            path: path.to_string(),
        }) {
            entry.code = Some(code);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ImportCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImportCache({} entries)", self.entries.len())
    }
}

/// Directory imports from `file_name` resolve against.
pub fn import_dir(file_name: &str) -> String {
    Path::new(file_name)
        .parent()
        .map(|dir| dir.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "Tests use expect for brevity")]
mod tests;
