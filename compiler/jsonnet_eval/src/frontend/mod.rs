//! Front-end seam: turning source text into a [`Program`].
//!
//! The evaluator compiles lazily in two places: imported files and external
//! variables or top-level arguments given as code. Both go through the
//! configured [`Frontend`]. The full language front end (lexer, parser,
//! desugarer, static analyzer) lives outside this crate; [`JsonFrontend`]
//! handles the JSON subset of the language so `.json` files and JSON-valued
//! external code work out of the box.

use jsonnet_ir::{ExprArena, ExprId, Hide, Program, SourceLocation, Span, StringInterner};

use crate::errors::StaticError;

/// Compiles source text to a desugared, analyzed program.
pub trait Frontend {
    fn compile(
        &self,
        interner: &StringInterner,
        file_name: &str,
        source: &str,
    ) -> Result<Program, StaticError>;
}

/// Front end for JSON documents, built on `serde_json`.
///
/// Objects become object literals with `:` fields; numbers, strings,
/// booleans and `null` become literals.
#[derive(Copy, Clone, Debug, Default)]
pub struct JsonFrontend;

impl Frontend for JsonFrontend {
    #[tracing::instrument(level = "debug", skip(self, interner, source))]
    fn compile(
        &self,
        interner: &StringInterner,
        file_name: &str,
        source: &str,
    ) -> Result<Program, StaticError> {
        let file = interner.intern(file_name);
        let document: serde_json::Value = serde_json::from_str(source).map_err(|err| {
            let offset = byte_offset(source, err.line(), err.column());
            let span = Span::try_from_range(offset..offset).unwrap_or_default();
            StaticError::new(format!("{file_name}: {err}")).at(SourceLocation::new(file, span))
        })?;
        let mut arena = ExprArena::with_capacity(file, source.len());
        let root = lower(&mut arena, interner, &document);
        Ok(Program::new(arena, root))
    }
}

fn lower(arena: &mut ExprArena, interner: &StringInterner, value: &serde_json::Value) -> ExprId {
    use serde_json::Value as Json;

    jsonnet_stack::ensure_sufficient_stack(|| match value {
        Json::Null => arena.null(),
        Json::Bool(b) => arena.boolean(*b),
        Json::Number(n) => arena.number(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => {
            let name = interner.intern(s);
            arena.string(name)
        }
        Json::Array(items) => {
            let elements: Vec<ExprId> = items
                .iter()
                .map(|item| lower(arena, interner, item))
                .collect();
            arena.array(&elements)
        }
        Json::Object(map) => {
            let fields: Vec<_> = map
                .iter()
                .map(|(key, item)| {
                    let body = lower(arena, interner, item);
                    arena.field(interner.intern(key), Hide::Inherit, body)
                })
                .collect();
            arena.object(&[], &fields)
        }
    })
}

/// Byte offset of a 1-based line and column.
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}
