//! Raw lab documents: storage, display and the assignment entry point.

use super::assignment::{self, AssignmentOutcome};
use crate::config::CoreConfig;
use crate::constants::RAW_LAB_COLLECTION;
use crate::lab::{LabDocumentDetail, RawLabDocument};
use crate::projection::FieldMap;
use crate::store::{new_document_id, DocumentStore, StoredDocument};
use crate::{RecordError, RecordResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// A raw lab document prepared for a listing view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabDocumentSummary {
    pub id: String,
    pub inserted_at: DateTime<Utc>,
    pub title: String,
    pub summary: FieldMap,
    pub assigned_patient_id: Option<String>,
}

#[derive(Clone)]
pub struct RawLabService {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn DocumentStore>,
}

impl RawLabService {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn DocumentStore>) -> Self {
        Self { cfg, store }
    }

    /// Newest raw lab documents, at most `limit` (or the configured page size).
    ///
    /// Documents that no longer decode are skipped with a warning.
    pub fn list(&self, limit: Option<usize>) -> RecordResult<Vec<LabDocumentSummary>> {
        let limit = self.cfg.effective_limit(limit);
        let mut summaries = Vec::new();

        for stored in self.store.list(RAW_LAB_COLLECTION)? {
            if summaries.len() == limit {
                break;
            }
            match RawLabDocument::from_value(stored.body) {
                Ok(doc) => summaries.push(LabDocumentSummary {
                    title: doc.title(),
                    summary: doc.summary(),
                    assigned_patient_id: doc.assigned_patient_id.clone(),
                    id: stored.id,
                    inserted_at: stored.inserted_at,
                }),
                Err(e) => {
                    tracing::warn!(id = %stored.id, error = %e, "skipping undecodable lab document");
                }
            }
        }

        Ok(summaries)
    }

    /// # Errors
    ///
    /// [`RecordError::DocumentNotFound`] if there is no such document.
    pub fn get(&self, id: &str) -> RecordResult<RawLabDocument> {
        let stored = self.fetch(id)?;
        RawLabDocument::from_value(stored.body).map_err(RecordError::Deserialization)
    }

    /// Detailed display view, with every result classified.
    pub fn detail(&self, id: &str) -> RecordResult<LabDocumentDetail> {
        Ok(self.get(id)?.detail())
    }

    /// Store a raw lab document as received from the upstream parser.
    ///
    /// The document is keyed by its `document_id`; one is generated if it has none. A new
    /// document is always unassigned, whatever the body says.
    ///
    /// # Errors
    ///
    /// [`RecordError::InvalidInput`] if the body is not an object, its `lab_results` is present
    /// but not a sequence, or a document with the same id exists.
    pub fn insert(&self, body: Value) -> RecordResult<StoredDocument> {
        if body
            .get("lab_results")
            .is_some_and(|results| !results.is_array() && !results.is_null())
        {
            return Err(RecordError::InvalidInput(
                "invalid lab document: lab_results must be a sequence".into(),
            ));
        }
        let mut doc = RawLabDocument::from_value(body)
            .map_err(|e| RecordError::InvalidInput(format!("invalid lab document: {e}")))?;

        let id = doc
            .document_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(new_document_id, str::to_string);
        doc.document_id = Some(id.clone());
        doc.assigned_patient_id = None;
        doc.assigned_at = None;

        let body = doc.to_value().map_err(RecordError::Serialization)?;
        let stored = self.store.insert(RAW_LAB_COLLECTION, Some(id.as_str()), body)?;
        tracing::info!(id = %stored.id, results = doc.lab_results.len(), "stored lab document");
        Ok(stored)
    }

    /// # Errors
    ///
    /// [`RecordError::DocumentNotFound`] if there is no such document.
    pub fn delete(&self, id: &str) -> RecordResult<()> {
        if self.store.delete(RAW_LAB_COLLECTION, id)? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    /// Assign a raw lab document to a patient.
    pub fn assign(&self, document_id: &str, patient_id: &str) -> RecordResult<AssignmentOutcome> {
        assignment::assign(self.store.as_ref(), document_id, patient_id)
    }

    fn fetch(&self, id: &str) -> RecordResult<StoredDocument> {
        self.store
            .get(RAW_LAB_COLLECTION, id)?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: &str) -> RecordError {
    RecordError::DocumentNotFound {
        collection: RAW_LAB_COLLECTION.to_string(),
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::RangeClass;
    use crate::store::FileStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn service(temp_dir: &TempDir) -> RawLabService {
        let cfg = Arc::new(CoreConfig::new(temp_dir.path().to_path_buf(), 50).unwrap());
        let store = FileStore::open(cfg.data_dir()).unwrap();
        RawLabService::new(cfg, Arc::new(store))
    }

    #[test]
    fn insert_keys_by_document_id_and_clears_assignment() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = service(&temp_dir);

        let stored = service
            .insert(json!({
                "document_id": "LAB-7",
                "patient_info": {"name": "VERDI^LUCA"},
                "lab_results": [{"value": "7.2", "reference_range": "<6"}],
                "assigned_patient_id": "someone"
            }))
            .unwrap();
        assert_eq!(stored.id, "LAB-7");

        let doc = service.get("LAB-7").unwrap();
        assert_eq!(doc.assigned_patient_id, None);

        let detail = service.detail("LAB-7").unwrap();
        assert_eq!(detail.title, "VERDI LUCA (LAB-7)");
        assert_eq!(detail.results[0].classification, RangeClass::Abnormal);
    }

    #[test]
    fn insert_generates_missing_ids() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = service(&temp_dir);

        let stored = service.insert(json!({"lab_results": []})).unwrap();
        let doc = service.get(&stored.id).unwrap();
        assert_eq!(doc.document_id.as_deref(), Some(stored.id.as_str()));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = service(&temp_dir);

        let err = service
            .insert(json!({"lab_results": "not a list"}))
            .expect_err("lab_results must be a sequence");
        assert!(matches!(err, RecordError::InvalidInput(_)));
    }

    #[test]
    fn list_get_and_delete() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = service(&temp_dir);
        service.insert(json!({"document_id": "A"})).unwrap();
        service.insert(json!({"document_id": "B"})).unwrap();

        let listed = service.list(None).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].summary.get("Status"), Some("unassigned"));
        assert_eq!(service.list(Some(1)).unwrap().len(), 1);

        service.delete("A").unwrap();
        assert!(matches!(
            service.get("A").expect_err("deleted"),
            RecordError::DocumentNotFound { .. }
        ));
        assert!(service.delete("A").is_err());
    }

    #[test]
    fn detail_degrades_malformed_results_to_unknown() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = service(&temp_dir);
        service
            .insert(json!({
                "document_id": "LAB-9",
                "lab_results": [
                    {"test_name": "POTASSIO", "value": "4.0", "reference_range": 5},
                    {"test_name": "SODIO", "value": true, "reference_range": "136 - 145"}
                ]
            }))
            .unwrap();

        let detail = service.detail("LAB-9").unwrap();
        let classes: Vec<RangeClass> = detail.results.iter().map(|r| r.classification).collect();
        assert_eq!(classes, vec![RangeClass::Unknown, RangeClass::Unknown]);
        assert_eq!(service.list(None).unwrap().len(), 1);
    }

    #[test]
    fn unstorable_ids_are_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = service(&temp_dir);

        for id in ["LAB 001", "MSG^001"] {
            let err = service.get(id).expect_err(id);
            assert_eq!(err.kind(), crate::ErrorKind::NotFound, "{id}");
            assert!(matches!(service.delete(id), Err(RecordError::DocumentNotFound { .. })));
        }
    }
}
