//! Converted variant records: listing, search, insertion and statistics.

use crate::config::CoreConfig;
use crate::projection::{ClinicalRecord, FieldMap};
use crate::search::{highlight, matches, HighlightedField, SearchCriteria};
use crate::stats::{aggregate, CollectionCount, StatsSummary};
use crate::store::{DocumentStore, StoredDocument};
use crate::variant::VariantTag;
use crate::{RecordError, RecordResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A variant record prepared for a listing view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordSummary {
    pub id: String,
    pub inserted_at: DateTime<Utc>,
    pub tag: VariantTag,
    pub title: String,
    pub summary: FieldMap,
    /// The stored record including `_id` and `_inserted_at`.
    pub record: Value,
}

impl RecordSummary {
    fn new(tag: VariantTag, doc: &StoredDocument) -> Self {
        let view = ClinicalRecord::new(Some(tag), &doc.body);
        Self {
            id: doc.id.clone(),
            inserted_at: doc.inserted_at,
            tag,
            title: view.title(),
            summary: view.summary(),
            record: doc.to_json(),
        }
    }
}

/// One search match with its highlight annotation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub highlights: Vec<HighlightedField>,
    pub record: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub tag: VariantTag,
    /// The criteria actually applied, after blanks were dropped.
    pub criteria: Vec<(String, String)>,
    /// Matches before the page limit was applied.
    pub total_matches: usize,
    pub results: Vec<SearchHit>,
}

/// Service over the three variant collections.
#[derive(Clone)]
pub struct DocumentService {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn DocumentStore>,
}

impl DocumentService {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn DocumentStore>) -> Self {
        Self { cfg, store }
    }

    /// Newest records of `tag`, at most `limit` (or the configured page size).
    pub fn list(&self, tag: VariantTag, limit: Option<usize>) -> RecordResult<Vec<RecordSummary>> {
        let limit = self.cfg.effective_limit(limit);
        Ok(self
            .store
            .list(tag.collection())?
            .iter()
            .take(limit)
            .map(|doc| RecordSummary::new(tag, doc))
            .collect())
    }

    /// Records of `criteria.tag()` satisfying every criterion, newest first.
    pub fn search(&self, criteria: &SearchCriteria) -> RecordResult<SearchOutcome> {
        let tag = criteria.tag();
        let limit = self.cfg.effective_limit(criteria.limit());

        let matched: Vec<StoredDocument> = self
            .store
            .list(tag.collection())?
            .into_iter()
            .filter(|doc| matches(&doc.body, criteria))
            .collect();
        let total_matches = matched.len();

        let results = matched
            .iter()
            .take(limit)
            .map(|doc| SearchHit {
                id: doc.id.clone(),
                title: ClinicalRecord::new(Some(tag), &doc.body).title(),
                highlights: highlight(&doc.body, criteria),
                record: doc.to_json(),
            })
            .collect();

        tracing::debug!(%tag, total_matches, limit, "search completed");

        Ok(SearchOutcome {
            tag,
            criteria: criteria.to_pairs(),
            total_matches,
            results,
        })
    }

    /// Store a converted record under the variant its message type names.
    ///
    /// `message_type` may be a bare tag (`ORU`) or a full HL7 type (`ORU^R01`).
    ///
    /// # Errors
    ///
    /// [`RecordError::InvalidInput`] if the message type names no known variant or the record
    /// is not a JSON object.
    pub fn insert(&self, message_type: &str, record: Value) -> RecordResult<StoredDocument> {
        let tag = VariantTag::from_message_type(message_type).ok_or_else(|| {
            RecordError::InvalidInput(format!("unsupported message type '{message_type}'"))
        })?;
        let doc = self.store.insert(tag.collection(), None, record)?;
        tracing::info!(%tag, id = %doc.id, "stored converted record");
        Ok(doc)
    }

    /// # Errors
    ///
    /// [`RecordError::DocumentNotFound`] if there is no such record.
    pub fn delete(&self, tag: VariantTag, id: &str) -> RecordResult<()> {
        if self.store.delete(tag.collection(), id)? {
            Ok(())
        } else {
            Err(RecordError::DocumentNotFound {
                collection: tag.collection().to_string(),
                id: id.to_string(),
            })
        }
    }

    /// Counts and shares of every variant collection.
    ///
    /// A collection whose count fails is reported with zero documents and the error text.
    pub fn stats(&self) -> StatsSummary {
        let counts: BTreeMap<VariantTag, CollectionCount> = VariantTag::ALL
            .iter()
            .map(|tag| {
                let collection = tag.collection();
                let count = match self.store.count(collection) {
                    Ok(n) => CollectionCount::counted(collection, n),
                    Err(e) => {
                        tracing::warn!(collection, error = %e, "failed to count collection");
                        CollectionCount::failed(collection, e.to_string())
                    }
                };
                (*tag, count)
            })
            .collect();
        aggregate(&counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use serde_json::json;

    fn service_with(store: Arc<InMemoryStore>, page_limit: usize) -> DocumentService {
        let cfg = Arc::new(CoreConfig::new("unused".into(), page_limit).unwrap());
        DocumentService::new(cfg, store)
    }

    fn mdm(patient_id: &str, document_type: &str) -> Value {
        json!({
            "patient_identification": {
                "name": {"family_name": "ROSSI", "given_name": "MARIO"},
                "identifiers": [{"id_number": patient_id}]
            },
            "document_header": {"document_type": document_type}
        })
    }

    #[test]
    fn insert_routes_by_message_type_prefix() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store.clone(), 50);

        service.insert("MDM^T02", mdm("1", "ZZZ")).unwrap();
        service.insert("oru^r01", json!({})).unwrap();
        let err = service.insert("ADT^A01", json!({})).expect_err("unsupported");
        assert!(matches!(err, RecordError::InvalidInput(_)));

        assert_eq!(store.count("mdm_documents").unwrap(), 1);
        assert_eq!(store.count("oru_patient_monitoring").unwrap(), 1);
    }

    #[test]
    fn list_projects_and_limits() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store, 2);
        for i in 0..3 {
            service.insert("MDM", mdm(&i.to_string(), "ZZZ")).unwrap();
        }

        let listed = service.list(VariantTag::Mdm, None).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "ROSSI, MARIO");
        assert_eq!(listed[0].summary.get("Document Type"), Some("ZZZ"));
        assert!(listed[0].record.get("_inserted_at").is_some());

        assert_eq!(service.list(VariantTag::Mdm, Some(10)).unwrap().len(), 3);
        assert!(service.list(VariantTag::Oul, None).unwrap().is_empty());
    }

    #[test]
    fn search_filters_highlights_and_pages() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store, 50);
        service.insert("MDM", mdm("1721260", "REFERTO")).unwrap();
        service.insert("MDM", mdm("1721999", "LETTERA")).unwrap();
        service.insert("MDM", mdm("9999999", "REFERTO")).unwrap();

        let criteria = SearchCriteria::from_pairs(VariantTag::Mdm, [("patient_id", "1721")]).unwrap();
        let outcome = service.search(&criteria).unwrap();
        assert_eq!(outcome.total_matches, 2);
        assert!(outcome.results.iter().all(|hit| hit.highlights[0].is_hit));

        let paged = service.search(&criteria.with_limit(Some(1))).unwrap();
        assert_eq!(paged.total_matches, 2);
        assert_eq!(paged.results.len(), 1);
    }

    #[test]
    fn delete_reports_missing_records() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store, 50);
        let doc = service.insert("OUL", json!({})).unwrap();

        service.delete(VariantTag::Oul, &doc.id).unwrap();
        let err = service.delete(VariantTag::Oul, &doc.id).expect_err("already gone");
        assert!(matches!(err, RecordError::DocumentNotFound { .. }));
    }

    #[test]
    fn stats_count_every_variant() {
        let store = Arc::new(InMemoryStore::new());
        let service = service_with(store, 50);
        for _ in 0..7 {
            service.insert("MDM", json!({})).unwrap();
        }
        for _ in 0..3 {
            service.insert("OUL", json!({})).unwrap();
        }

        let stats = service.stats();
        assert_eq!(stats.total_documents, 10);
        assert_eq!(stats.percentage(VariantTag::Mdm), Some(70.0));
        assert_eq!(stats.percentage(VariantTag::Oul), Some(30.0));
        assert_eq!(stats.percentage(VariantTag::Oru), Some(0.0));
    }
}
