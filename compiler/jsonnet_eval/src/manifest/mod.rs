//! JSON manifestation.
//!
//! Turning a value into text forces everything reachable from it: every
//! array element and every visible field. Objects are checked against their
//! assertions first and their fields are written in sorted order.
//!
//! Multi-line output indents by three spaces per level, writes `"key": value`
//! pairs, and renders empty containers as `[ ]` and `{ }`. Single-line output
//! (used for `toString` and string concatenation) separates with `", "`.

use jsonnet_ir::SourceLocation;
use jsonnet_stack::ensure_sufficient_stack;

use crate::errors::{crash, manifest_function, EvalError};
use crate::{Interpreter, ObjectValue, Value};

const INDENT: &str = "   ";

impl Interpreter {
    /// Render `value` as JSON.
    pub fn manifest(&mut self, value: &Value, multiline: bool) -> Result<String, EvalError> {
        let mut out = String::new();
        self.manifest_into(value, multiline, "", &mut out)?;
        Ok(out)
    }

    /// Strings as-is; anything else as single-line JSON.
    pub(crate) fn to_display_string(&mut self, value: &Value) -> Result<String, EvalError> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => self.manifest(other, false),
        }
    }

    fn manifest_into(
        &mut self,
        value: &Value,
        multiline: bool,
        indent: &str,
        out: &mut String,
    ) -> Result<(), EvalError> {
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(true) => out.push_str("true"),
            Value::Bool(false) => out.push_str("false"),
            Value::Number(n) => out.push_str(&n.to_string()),
            Value::Str(s) => {
                let quoted = serde_json::to_string(&**s)
                    .map_err(|err| crash(format!("string escaping failed: {err}")))?;
                out.push_str(&quoted);
            }
            Value::Function(_) => return Err(self.builtin_error(manifest_function())),
            Value::Array(elements) => {
                if elements.is_empty() {
                    out.push_str("[ ]");
                    return Ok(());
                }
                let inner = format!("{indent}{INDENT}");
                out.push('[');
                for (i, element) in elements.iter().enumerate() {
                    separator(i, multiline, &inner, out);
                    let element = element.force(self)?;
                    ensure_sufficient_stack(|| {
                        self.manifest_into(&element, multiline, &inner, out)
                    })?;
                }
                closing(multiline, indent, out);
                out.push(']');
            }
            Value::Object(obj) => self.manifest_object(obj, multiline, indent, out)?,
        }
        Ok(())
    }

    fn manifest_object(
        &mut self,
        obj: &ObjectValue,
        multiline: bool,
        indent: &str,
        out: &mut String,
    ) -> Result<(), EvalError> {
        self.check_assertions(obj)?;
        let names = self.sorted_fields(obj, false);
        if names.is_empty() {
            out.push_str("{ }");
            return Ok(());
        }
        let inner = format!("{indent}{INDENT}");
        out.push('{');
        for (i, name) in names.into_iter().enumerate() {
            separator(i, multiline, &inner, out);
            let key = serde_json::to_string(self.interner().lookup(name))
                .map_err(|err| crash(format!("string escaping failed: {err}")))?;
            out.push_str(&key);
            out.push_str(": ");
            let value = self.object_index(obj, 0, name, SourceLocation::UNKNOWN)?;
            ensure_sufficient_stack(|| self.manifest_into(&value, multiline, &inner, out))?;
        }
        closing(multiline, indent, out);
        out.push('}');
        Ok(())
    }
}

fn separator(index: usize, multiline: bool, inner: &str, out: &mut String) {
    match (multiline, index) {
        (true, 0) => {
            out.push('\n');
            out.push_str(inner);
        }
        (true, _) => {
            out.push_str(",\n");
            out.push_str(inner);
        }
        (false, 0) => {}
        (false, _) => out.push_str(", "),
    }
}

fn closing(multiline: bool, indent: &str, out: &mut String) {
    if multiline {
        out.push('\n');
        out.push_str(indent);
    }
}
