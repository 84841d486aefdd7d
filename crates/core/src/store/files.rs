//! JSON-file document store.
//!
//! Each document is one file at `<data_dir>/<collection>/<s1>/<s2>/<id>.json`, where `s1` and
//! `s2` are two-hex-digit shards derived from a hash of the id. The shards keep directory sizes
//! bounded no matter how ids are chosen. The file holds the document in its
//! [`StoredDocument::to_json`] form.

use super::{new_document_id, prepare_body, sort_newest_first, DocumentStore, StoredDocument};
use crate::validation::validate_store_key;
use crate::{RecordError, RecordResult};
use chrono::Utc;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

const DOCUMENT_EXTENSION: &str = "json";

/// Document store rooted at a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::StoreDirCreation`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> RecordResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(RecordError::StoreDirCreation)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> RecordResult<PathBuf> {
        validate_store_key(collection)?;
        Ok(self.root.join(collection))
    }

    fn document_path(&self, collection: &str, id: &str) -> RecordResult<PathBuf> {
        validate_store_key(id)?;
        let (s1, s2) = shards(id);
        Ok(self
            .collection_dir(collection)?
            .join(s1)
            .join(s2)
            .join(format!("{id}.{DOCUMENT_EXTENSION}")))
    }

    /// Path of an existing document, or `None` if `id` is not stored.
    ///
    /// An id that could never have been inserted resolves to `None` rather than an error.
    fn existing_path(&self, collection: &str, id: &str) -> RecordResult<Option<PathBuf>> {
        if validate_store_key(id).is_err() {
            return Ok(None);
        }
        let path = self.document_path(collection, id)?;
        Ok(path.is_file().then_some(path))
    }

    fn write(&self, path: &Path, doc: &StoredDocument) -> RecordResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(RecordError::StoreDirCreation)?;
        }
        let json =
            serde_json::to_string_pretty(&doc.to_json()).map_err(RecordError::Serialization)?;

        // Write beside the target and rename so readers never see a half-written file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(RecordError::FileWrite)?;
        fs::rename(&tmp, path).map_err(RecordError::FileWrite)
    }

    fn read(path: &Path) -> RecordResult<StoredDocument> {
        let contents = fs::read_to_string(path).map_err(RecordError::FileRead)?;
        let value: Value = serde_json::from_str(&contents).map_err(RecordError::Deserialization)?;
        StoredDocument::from_json(value)
    }

    /// Paths of every document file in `collection`.
    fn document_paths(&self, collection: &str) -> RecordResult<Vec<PathBuf>> {
        let dir = self.collection_dir(collection)?;
        let mut paths = Vec::new();

        let s1_iter = match fs::read_dir(&dir) {
            Ok(it) => it,
            Err(_) => return Ok(paths),
        };
        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };
            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let doc_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };
                for entry in doc_iter.flatten() {
                    let path = entry.path();
                    let is_document = path.is_file()
                        && path.extension().and_then(|e| e.to_str()) == Some(DOCUMENT_EXTENSION);
                    if is_document {
                        paths.push(path);
                    }
                }
            }
        }

        Ok(paths)
    }
}

impl DocumentStore for FileStore {
    fn insert(
        &self,
        collection: &str,
        id: Option<&str>,
        body: Value,
    ) -> RecordResult<StoredDocument> {
        let body = prepare_body(body)?;
        let id = id.map_or_else(new_document_id, str::to_string);
        let path = self.document_path(collection, &id)?;
        if path.exists() {
            return Err(RecordError::InvalidInput(format!(
                "document {id} already exists in {collection}"
            )));
        }

        let doc = StoredDocument {
            id,
            inserted_at: Utc::now(),
            body,
        };
        self.write(&path, &doc)?;
        Ok(doc)
    }

    fn replace(&self, collection: &str, id: &str, body: Value) -> RecordResult<StoredDocument> {
        let body = prepare_body(body)?;
        let Some(path) = self.existing_path(collection, id)? else {
            return Err(RecordError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        };

        let existing = Self::read(&path)?;
        let doc = StoredDocument { body, ..existing };
        self.write(&path, &doc)?;
        Ok(doc)
    }

    fn get(&self, collection: &str, id: &str) -> RecordResult<Option<StoredDocument>> {
        match self.existing_path(collection, id)? {
            Some(path) => Self::read(&path).map(Some),
            None => Ok(None),
        }
    }

    fn list(&self, collection: &str) -> RecordResult<Vec<StoredDocument>> {
        let mut docs = Vec::new();
        for path in self.document_paths(collection)? {
            match Self::read(&path) {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable document");
                }
            }
        }
        sort_newest_first(&mut docs);
        Ok(docs)
    }

    fn delete(&self, collection: &str, id: &str) -> RecordResult<bool> {
        let Some(path) = self.existing_path(collection, id)? else {
            return Ok(false);
        };
        fs::remove_file(&path).map_err(RecordError::FileWrite)?;
        Ok(true)
    }

    fn count(&self, collection: &str) -> RecordResult<u64> {
        Ok(self.document_paths(collection)?.len() as u64)
    }
}

/// Two-level shard directory names for `id` (FNV-1a, first four hex digits).
fn shards(id: &str) -> (String, String) {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = id
        .bytes()
        .fold(OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(PRIME));
    let hex = format!("{hash:016x}");
    (hex[0..2].to_string(), hex[2..4].to_string())
}
