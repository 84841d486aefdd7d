//! Process-local document store.

use super::{new_document_id, prepare_body, sort_newest_first, DocumentStore, StoredDocument};
use crate::{RecordError, RecordResult};
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Collections = HashMap<String, BTreeMap<String, StoredDocument>>;

/// Document store held in memory, lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<Collections>,
    writes: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful insert, replace and delete calls so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    fn read_guard(&self) -> RecordResult<RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|_| RecordError::StoreUnavailable("in-memory store lock poisoned".into()))
    }

    fn write_guard(&self) -> RecordResult<RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|_| RecordError::StoreUnavailable("in-memory store lock poisoned".into()))
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}

impl DocumentStore for InMemoryStore {
    fn insert(
        &self,
        collection: &str,
        id: Option<&str>,
        body: Value,
    ) -> RecordResult<StoredDocument> {
        let body = prepare_body(body)?;
        let id = id.map_or_else(new_document_id, str::to_string);
        crate::validation::validate_store_key(&id)?;

        let mut collections = self.write_guard()?;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(RecordError::InvalidInput(format!(
                "document {id} already exists in {collection}"
            )));
        }

        let doc = StoredDocument {
            id: id.clone(),
            inserted_at: Utc::now(),
            body,
        };
        docs.insert(id, doc.clone());
        self.record_write();
        Ok(doc)
    }

    fn replace(&self, collection: &str, id: &str, body: Value) -> RecordResult<StoredDocument> {
        let body = prepare_body(body)?;
        let mut collections = self.write_guard()?;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| RecordError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        existing.body = body;
        let doc = existing.clone();
        self.record_write();
        Ok(doc)
    }

    fn get(&self, collection: &str, id: &str) -> RecordResult<Option<StoredDocument>> {
        Ok(self
            .read_guard()?
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    fn list(&self, collection: &str) -> RecordResult<Vec<StoredDocument>> {
        let mut docs: Vec<StoredDocument> = self
            .read_guard()?
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        sort_newest_first(&mut docs);
        Ok(docs)
    }

    fn delete(&self, collection: &str, id: &str) -> RecordResult<bool> {
        let removed = self
            .write_guard()?
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            self.record_write();
        }
        Ok(removed)
    }

    fn count(&self, collection: &str) -> RecordResult<u64> {
        Ok(self
            .read_guard()?
            .get(collection)
            .map_or(0, |docs| docs.len() as u64))
    }
}
