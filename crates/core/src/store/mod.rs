//! The document store seam.
//!
//! Persistence is an external collaborator: the core only needs keyed JSON documents grouped in
//! collections, each stamped with an insertion time. [`DocumentStore`] captures exactly that,
//! and two implementations are provided:
//!
//! - [`FileStore`]: one JSON file per document under `<data_dir>/<collection>/`
//! - [`InMemoryStore`]: a process-local map, used by tests and throwaway runs
//!
//! Stores do not serialise concurrent writers; two writes to the same id race and the last one
//! wins.
//!
//! The trait is synchronous and [`FileStore`] does blocking filesystem I/O. Async callers run it
//! inline on their executor thread, which is fine for a handful of small files per request; a
//! listing over a large collection should move to `tokio::task::spawn_blocking` if that changes.
//!
//! Lookups (`get`, `replace`, `delete`) treat an id that could never have been stored as absent.
//! Only `insert` rejects such ids.

mod files;
mod memory;

pub use files::FileStore;
pub use memory::InMemoryStore;

use crate::constants::{ID_FIELD, INSERTED_AT_FIELD};
use crate::{RecordError, RecordResult};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// A document as held by a store.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub inserted_at: DateTime<Utc>,
    /// The document without the store-owned `_id` / `_inserted_at` keys.
    pub body: Value,
}

impl StoredDocument {
    /// The body with `_id` and `_inserted_at` added, as returned to API callers.
    pub fn to_json(&self) -> Value {
        let mut object = match &self.body {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        object.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        object.insert(
            INSERTED_AT_FIELD.to_string(),
            Value::String(self.inserted_at.to_rfc3339()),
        );
        Value::Object(object)
    }

    /// Rebuild a document from its [`StoredDocument::to_json`] form.
    pub(crate) fn from_json(value: Value) -> RecordResult<Self> {
        let Value::Object(mut object) = value else {
            return Err(RecordError::StoreUnavailable(
                "stored document is not a JSON object".into(),
            ));
        };
        let id = match object.remove(ID_FIELD) {
            Some(Value::String(id)) => id,
            _ => {
                return Err(RecordError::StoreUnavailable(
                    "stored document has no _id".into(),
                ))
            }
        };
        let inserted_at = object
            .remove(INSERTED_AT_FIELD)
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| {
                RecordError::StoreUnavailable(format!("stored document {id} has no valid _inserted_at"))
            })?;
        Ok(Self {
            id,
            inserted_at,
            body: Value::Object(object),
        })
    }
}

/// Keyed JSON document storage grouped in collections.
pub trait DocumentStore: Send + Sync {
    /// Store a new document under `id`, or under a freshly generated id if `id` is `None`.
    ///
    /// # Errors
    ///
    /// [`RecordError::InvalidInput`] if `body` is not a JSON object, `id` is not a safe store
    /// key, or a document with that id already exists.
    fn insert(&self, collection: &str, id: Option<&str>, body: Value)
        -> RecordResult<StoredDocument>;

    /// Replace the body of an existing document, keeping its id and insertion time.
    ///
    /// # Errors
    ///
    /// [`RecordError::DocumentNotFound`] if there is no such document.
    fn replace(&self, collection: &str, id: &str, body: Value) -> RecordResult<StoredDocument>;

    fn get(&self, collection: &str, id: &str) -> RecordResult<Option<StoredDocument>>;

    /// All documents in `collection`, newest first.
    fn list(&self, collection: &str) -> RecordResult<Vec<StoredDocument>>;

    /// Remove a document; `false` if it did not exist.
    fn delete(&self, collection: &str, id: &str) -> RecordResult<bool>;

    fn count(&self, collection: &str) -> RecordResult<u64>;
}

/// Generate a fresh document id (32 lowercase hex characters).
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Validate a body for storage and strip the store-owned keys from it.
pub(crate) fn prepare_body(body: Value) -> RecordResult<Value> {
    let Value::Object(mut object) = body else {
        return Err(RecordError::InvalidInput(
            "documents must be JSON objects".into(),
        ));
    };
    object.remove(ID_FIELD);
    object.remove(INSERTED_AT_FIELD);
    Ok(Value::Object(object))
}

/// Newest first; ties broken by id so listings are stable.
pub(crate) fn sort_newest_first(docs: &mut [StoredDocument]) {
    docs.sort_by(|a, b| {
        b.inserted_at
            .cmp(&a.inserted_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_form_round_trips() {
        let doc = StoredDocument {
            id: "abc".into(),
            inserted_at: "2025-06-11T10:30:00Z".parse().unwrap(),
            body: json!({"message_type": "OUL^R22"}),
        };
        let value = doc.to_json();
        assert_eq!(value["_id"], "abc");
        assert_eq!(value["_inserted_at"], "2025-06-11T10:30:00+00:00");
        assert_eq!(StoredDocument::from_json(value).unwrap(), doc);
    }

    #[test]
    fn prepare_body_strips_store_keys() {
        let body = prepare_body(json!({"_id": "x", "_inserted_at": "y", "a": 1})).unwrap();
        assert_eq!(body, json!({"a": 1}));
        assert!(prepare_body(json!([1, 2])).is_err());
    }

    #[test]
    fn generated_ids_are_canonical_hex() {
        let id = new_document_id();
        assert_eq!(id.len(), 32);
        assert!(id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
    }
}
