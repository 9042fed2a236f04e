use std::cell::Cell;

use super::*;
use pretty_assertions::assert_eq;

/// Counts how often the cache falls through to the importer.
struct CountingImporter {
    inner: MemoryImporter,
    calls: Cell<usize>,
}

impl Importer for CountingImporter {
    fn import(&self, from_dir: &str, path: &str) -> Result<ImportedData, ImportError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.import(from_dir, path)
    }
}

#[test]
fn test_memory_importer() {
    let importer = MemoryImporter::new().with_file("lib.json", "{\"a\": 1}");
    let data = importer.import("", "lib.json").expect("lib.json exists");
    assert_eq!(&*data.content, "{\"a\": 1}");
    assert_eq!(data.found_at, "lib.json");

    let err = importer.import("", "missing.json").expect_err("missing");
    assert_eq!(err.to_string(), "Import not available missing.json");
}

#[test]
fn test_not_found_message() {
    let err = ImportError::NotFound {
        path: "x.libsonnet".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Couldn't open import \"x.libsonnet\": No match locally or in the Jsonnet library paths."
    );
}

#[test]
fn test_cache_resolves_once() {
    let importer = CountingImporter {
        inner: MemoryImporter::new().with_file("a.json", "1"),
        calls: Cell::new(0),
    };
    let mut cache = ImportCache::new();
    for _ in 0..3 {
        cache.import_data(&importer, "dir", "a.json").expect("found");
    }
    assert_eq!(importer.calls.get(), 1);

    // Failures are cached too.
    for _ in 0..2 {
        assert!(cache.import_data(&importer, "dir", "b.json").is_err());
    }
    assert_eq!(importer.calls.get(), 2);

    // A different directory is a different key.
    cache.import_data(&importer, "other", "a.json").expect("found");
    assert_eq!(importer.calls.get(), 3);
    assert_eq!(cache.len(), 3);
}

#[test]
fn test_cache_code_slot() {
    let importer = MemoryImporter::new().with_file("a.json", "1");
    let mut cache = ImportCache::new();
    assert!(cache.code("", "a.json").is_none());

    cache.import_data(&importer, "", "a.json").expect("found");
    cache.set_code("", "a.json", Deferred::Ready(crate::Value::Null));
    assert!(matches!(
        cache.code("", "a.json"),
        Some(Deferred::Ready(crate::Value::Null))
    ));
}

#[test]
fn test_file_importer_search_order() {
    let root = std::env::temp_dir().join(format!("jsonnet-eval-imports-{}", std::process::id()));
    let local = root.join("local");
    let lib_a = root.join("lib_a");
    let lib_b = root.join("lib_b");
    for dir in [&local, &lib_a, &lib_b] {
        std::fs::create_dir_all(dir).expect("create dir");
    }
    std::fs::write(lib_a.join("shared.json"), "\"a\"").expect("write");
    std::fs::write(lib_b.join("shared.json"), "\"b\"").expect("write");
    std::fs::write(local.join("own.json"), "\"local\"").expect("write");

    let importer = FileImporter::new([lib_a.clone(), lib_b.clone()]);
    let local_dir = local.to_string_lossy().into_owned();

    let own = importer.import(&local_dir, "own.json").expect("local file");
    assert_eq!(&*own.content, "\"local\"");

    // Later library paths win.
    let shared = importer.import(&local_dir, "shared.json").expect("library file");
    assert_eq!(&*shared.content, "\"b\"");
    assert!(shared.found_at.ends_with("shared.json"));

    let err = importer
        .import(&local_dir, "nope.json")
        .expect_err("missing everywhere");
    assert!(matches!(err, ImportError::NotFound { .. }));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn test_import_dir() {
    assert_eq!(import_dir("a/b/c.jsonnet"), "a/b");
    assert_eq!(import_dir("c.jsonnet"), "");
    assert_eq!(import_dir(""), "");
}
