//! Null-safe access into converted records.
//!
//! Converted records have no schema, so every read is a JSON pointer lookup that may miss. A
//! value counts as present only if it is a non-blank string, a number or a boolean.

use serde_json::Value;

/// Render a scalar as display text; `None` for null, blank strings, objects and arrays.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Text at `pointer`, if present.
pub(crate) fn text_at(record: &Value, pointer: &str) -> Option<String> {
    record.pointer(pointer).and_then(scalar_text)
}

/// Text at the first of `pointers` that is present.
///
/// Sequences are read through their first element, so a FHIR-style `given: ["Mario"]`
/// resolves the same way as `given_name: "Mario"`.
pub(crate) fn first_text_at(record: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|p| match record.pointer(p)? {
        Value::Array(items) => items.first().and_then(scalar_text),
        other => scalar_text(other),
    })
}

/// Length of the sequence at `pointer`; 0 when absent or not a sequence.
pub(crate) fn len_at(record: &Value, pointer: &str) -> usize {
    record
        .pointer(pointer)
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_scalars_and_skips_blanks() {
        let record = json!({"a": {"s": "x", "n": 72, "b": true, "blank": " ", "null": null, "obj": {}}});
        assert_eq!(text_at(&record, "/a/s").as_deref(), Some("x"));
        assert_eq!(text_at(&record, "/a/n").as_deref(), Some("72"));
        assert_eq!(text_at(&record, "/a/b").as_deref(), Some("true"));
        assert_eq!(text_at(&record, "/a/blank"), None);
        assert_eq!(text_at(&record, "/a/null"), None);
        assert_eq!(text_at(&record, "/a/obj"), None);
        assert_eq!(text_at(&record, "/missing/deeper/0"), None);
    }

    #[test]
    fn first_text_falls_back_and_reads_sequences() {
        let record = json!({"name": {"given": ["Mario", "Luigi"], "family_name": ""}});
        assert_eq!(
            first_text_at(&record, &["/name/given_name", "/name/given"]).as_deref(),
            Some("Mario")
        );
        assert_eq!(first_text_at(&record, &["/name/family_name", "/name/family"]), None);
    }

    #[test]
    fn lengths_default_to_zero() {
        let record = json!({"specimens": [1, 2, 3], "scalar": 1});
        assert_eq!(len_at(&record, "/specimens"), 3);
        assert_eq!(len_at(&record, "/scalar"), 0);
        assert_eq!(len_at(&record, "/absent"), 0);
    }
}
