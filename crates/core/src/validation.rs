//! Input validation utilities.
//!
//! Document ids and collection names become file names in the JSON document store, so they are
//! checked before any path is derived from them.

use crate::{RecordError, RecordResult};

const MAX_KEY_LEN: usize = 128;

/// Validates that a document id or collection name is safe to embed in a file path.
///
/// - Rejects empty or whitespace-only strings
/// - Bounds the length to avoid pathological inputs
/// - Restricts characters to ASCII alphanumerics plus `.`, `-` and `_`
/// - Rejects names made only of dots (`.` and `..`)
///
/// # Errors
///
/// Returns a `RecordError::InvalidInput` if the key is invalid.
pub fn validate_store_key(key: &str) -> RecordResult<()> {
    if key.trim().is_empty() {
        return Err(RecordError::InvalidInput(
            "document key cannot be empty".into(),
        ));
    }

    if key.len() > MAX_KEY_LEN {
        return Err(RecordError::InvalidInput(format!(
            "document key exceeds maximum length of {} characters",
            MAX_KEY_LEN
        )));
    }

    let ok = key
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));

    if !ok {
        return Err(RecordError::InvalidInput(format!(
            "document key '{key}' contains invalid characters (only alphanumeric, '.', '-', '_' allowed)"
        )));
    }

    if key.bytes().all(|b| b == b'.') {
        return Err(RecordError::InvalidInput(format!(
            "document key '{key}' is not allowed"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_ids() {
        for key in ["doc-1", "6650f3a2b1c4d5e6f7a8b9c0", "pat_001", "raw_lab_documents", "a.b"] {
            assert!(validate_store_key(key).is_ok(), "{key}");
        }
    }

    #[test]
    fn rejects_path_traversal_and_separators() {
        for key in ["", "  ", "..", ".", "../etc", "a/b", "a\\b", "spaced id", "ìd"] {
            assert!(validate_store_key(key).is_err(), "{key}");
        }
    }

    #[test]
    fn rejects_overlong_keys() {
        let key = "a".repeat(MAX_KEY_LEN + 1);
        assert!(validate_store_key(&key).is_err());
        assert!(validate_store_key(&"a".repeat(MAX_KEY_LEN)).is_ok());
    }
}
