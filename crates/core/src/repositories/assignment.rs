//! Assigning raw lab documents to patients.
//!
//! The workflow is a chain of type states so each step can only run once the previous one has
//! succeeded:
//!
//! ```text
//! AssignmentWorkflow<Pending>  --resolve()-->  <Resolved>  --classify()-->  <Classified>  --commit()
//! ```
//!
//! 1. `resolve` loads the raw document, then the patient. Either missing is a not-found error.
//! 2. `classify` rejects documents without results and classifies each result.
//! 3. `commit` writes a new [`LabAssignment`] set under the patient and links the raw document.
//!
//! Assigning a document again to the patient it already belongs to succeeds without writing.
//! Assigning it to a different patient moves the link; the earlier set stays with the earlier
//! patient. Nothing here is atomic: the store sees a read, a read and two writes.

use crate::constants::{PATIENTS_COLLECTION, PATIENT_LAB_RESULTS_COLLECTION, RAW_LAB_COLLECTION};
use crate::lab::{AssignedLabResult, AssignmentState, LabAssignment, RawLabDocument};
use crate::range::RangeClass;
use crate::store::{new_document_id, DocumentStore, StoredDocument};
use crate::{RecordError, RecordResult};
use chrono::{DateTime, Utc};
use fhir::{Patient, PatientData};
use serde::Serialize;

/// Result of a successful assignment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssignmentOutcome {
    pub message: String,
    pub document_id: String,
    pub patient_id: String,
    /// Id of the set written, `None` when the document already belonged to the patient.
    pub assignment_id: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub results: Vec<AssignedLabResult>,
}

impl AssignmentOutcome {
    pub fn result_count(&self) -> usize {
        self.results.len()
    }
}

// ============================================================================
// TYPE-STATE MARKERS
// ============================================================================

/// Nothing loaded yet.
#[derive(Clone, Copy, Debug)]
pub struct Pending;

/// Document and patient both exist.
#[derive(Clone, Debug)]
pub struct Resolved {
    stored: StoredDocument,
    document: RawLabDocument,
    patient: PatientData,
}

/// Results classified and ready to persist.
#[derive(Clone, Debug)]
pub struct Classified {
    resolved: Resolved,
    results: Vec<AssignedLabResult>,
}

pub struct AssignmentWorkflow<'s, S> {
    store: &'s dyn DocumentStore,
    state: S,
}

impl<'s> AssignmentWorkflow<'s, Pending> {
    pub fn new(store: &'s dyn DocumentStore) -> Self {
        Self {
            store,
            state: Pending,
        }
    }

    /// Load the raw document and the patient, in that order.
    ///
    /// # Errors
    ///
    /// - [`RecordError::DocumentNotFound`] if the document does not exist
    /// - [`RecordError::PatientNotFound`] if the patient does not exist
    /// - store and decoding errors unchanged
    pub fn resolve(
        self,
        document_id: &str,
        patient_id: &str,
    ) -> RecordResult<AssignmentWorkflow<'s, Resolved>> {
        let stored = self
            .store
            .get(RAW_LAB_COLLECTION, document_id)?
            .ok_or_else(|| RecordError::DocumentNotFound {
                collection: RAW_LAB_COLLECTION.to_string(),
                id: document_id.to_string(),
            })?;
        let document =
            RawLabDocument::from_value(stored.body.clone()).map_err(RecordError::Deserialization)?;

        let patient = self
            .store
            .get(PATIENTS_COLLECTION, patient_id)?
            .ok_or_else(|| RecordError::PatientNotFound(patient_id.to_string()))?;
        let patient = Patient::from_value(patient.body)?;

        Ok(AssignmentWorkflow {
            store: self.store,
            state: Resolved {
                stored,
                document,
                patient,
            },
        })
    }
}

impl<'s> AssignmentWorkflow<'s, Resolved> {
    /// Classify every result of the document.
    ///
    /// # Errors
    ///
    /// [`RecordError::InvalidInput`] if the document has no lab results.
    pub fn classify(self) -> RecordResult<AssignmentWorkflow<'s, Classified>> {
        let resolved = self.state;
        if resolved.document.lab_results.is_empty() {
            return Err(RecordError::InvalidInput(format!(
                "lab document {} has no lab results to assign",
                resolved.stored.id
            )));
        }

        let results = resolved.document.classified_results();
        for result in results
            .iter()
            .filter(|r| r.classification == RangeClass::Unknown)
        {
            tracing::debug!(
                document_id = %resolved.stored.id,
                test = result.test_name.as_deref().unwrap_or_default(),
                value = %result.value_text,
                range = result.reference_range.as_deref().unwrap_or_default(),
                "lab result could not be classified"
            );
        }

        Ok(AssignmentWorkflow {
            store: self.store,
            state: Classified { resolved, results },
        })
    }
}

impl<'s> AssignmentWorkflow<'s, Classified> {
    /// Persist the assignment.
    ///
    /// # Errors
    ///
    /// Store errors unchanged. If writing the raw document fails after the set was written, the
    /// set is left in place.
    pub fn commit(self) -> RecordResult<AssignmentOutcome> {
        let Classified { resolved, results } = self.state;
        let Resolved {
            stored,
            mut document,
            patient,
        } = resolved;
        let patient_id = patient.id.to_string();
        let patient_name = patient
            .display_name()
            .unwrap_or_else(|| patient_id.clone());

        if let AssignmentState::Assigned {
            patient_id: current,
            assigned_at,
        } = document.state()
        {
            if current == patient_id {
                tracing::info!(document_id = %stored.id, %patient_id, "lab document already assigned");
                return Ok(AssignmentOutcome {
                    message: format!(
                        "Lab document {} is already assigned to {patient_name}",
                        stored.id
                    ),
                    document_id: stored.id,
                    patient_id,
                    assignment_id: None,
                    assigned_at,
                    results,
                });
            }
            tracing::warn!(
                document_id = %stored.id,
                previous_patient_id = %current,
                %patient_id,
                "reassigning lab document to a different patient"
            );
        }

        let assigned_at = Utc::now();
        let assignment = LabAssignment {
            assignment_id: new_document_id(),
            document_id: stored.id.clone(),
            patient_id: patient_id.clone(),
            assigned_at,
            results,
        };
        let set = serde_json::to_value(&assignment).map_err(RecordError::Serialization)?;
        self.store.insert(
            PATIENT_LAB_RESULTS_COLLECTION,
            Some(assignment.assignment_id.as_str()),
            set,
        )?;

        document.assigned_patient_id = Some(patient_id.clone());
        document.assigned_at = Some(assigned_at);
        let body = document.to_value().map_err(RecordError::Serialization)?;
        self.store.replace(RAW_LAB_COLLECTION, &stored.id, body)?;

        let count = assignment.results.len();
        tracing::info!(
            document_id = %stored.id,
            %patient_id,
            assignment_id = %assignment.assignment_id,
            results = count,
            "assigned lab document"
        );

        Ok(AssignmentOutcome {
            message: format!("Assigned {count} lab result(s) to {patient_name}"),
            document_id: assignment.document_id,
            patient_id,
            assignment_id: Some(assignment.assignment_id),
            assigned_at: Some(assigned_at),
            results: assignment.results,
        })
    }
}

/// Run the whole workflow for one document and patient.
pub fn assign(
    store: &dyn DocumentStore,
    document_id: &str,
    patient_id: &str,
) -> RecordResult<AssignmentOutcome> {
    AssignmentWorkflow::new(store)
        .resolve(document_id, patient_id)?
        .classify()?
        .commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::InMemoryStore;
    use serde_json::{json, Value};

    fn patient(id: &str, family: &str, given: &str) -> Value {
        json!({
            "resourceType": "Patient",
            "id": id,
            "name": [{"family": family, "given": [given]}]
        })
    }

    fn seeded(lab_results: Value) -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert(PATIENTS_COLLECTION, Some("pat-001"), patient("pat-001", "Rossi", "Mario"))
            .unwrap();
        store
            .insert(PATIENTS_COLLECTION, Some("pat-002"), patient("pat-002", "Bianchi", "Anna"))
            .unwrap();
        store
            .insert(
                RAW_LAB_COLLECTION,
                Some("LAB-1"),
                json!({
                    "document_id": "LAB-1",
                    "message_type": "OUL^R22",
                    "patient_info": {"name": "ROSSI^MARIO"},
                    "lab_results": lab_results,
                    "source_file": "upload.hl7"
                }),
            )
            .unwrap();
        store
    }

    fn single_potassium() -> Value {
        json!([{"test_name": "POTASSIO", "value": "4.0", "reference_range": "3.5 - 5.3"}])
    }

    #[test]
    fn assigns_and_classifies() {
        let store = seeded(single_potassium());
        let outcome = assign(&store, "LAB-1", "pat-001").unwrap();

        assert_eq!(outcome.result_count(), 1);
        assert_eq!(outcome.results[0].classification, RangeClass::Normal);
        assert!(outcome.message.contains("Rossi Mario"));
        assert!(outcome.message.contains('1'));

        let raw = store.get(RAW_LAB_COLLECTION, "LAB-1").unwrap().unwrap();
        assert_eq!(raw.body["assigned_patient_id"], "pat-001");
        assert!(raw.body["assigned_at"].is_string());
        assert_eq!(raw.body["source_file"], "upload.hl7");

        let sets = store.list(PATIENT_LAB_RESULTS_COLLECTION).unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].body["patient_id"], "pat-001");
        assert_eq!(sets[0].body["results"][0]["classification"], "normal");
    }

    #[test]
    fn missing_document_is_not_found_and_writes_nothing() {
        let store = seeded(single_potassium());
        let before = store.writes();

        let err = assign(&store, "LAB-404", "pat-001").expect_err("no such document");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(matches!(err, RecordError::DocumentNotFound { .. }));
        assert_eq!(store.writes(), before);
    }

    #[test]
    fn missing_patient_is_checked_before_results() {
        let store = seeded(json!([]));
        let before = store.writes();

        let err = assign(&store, "LAB-1", "pat-404").expect_err("no such patient");
        assert!(matches!(err, RecordError::PatientNotFound(ref id) if id == "pat-404"));
        assert_eq!(store.writes(), before);
    }

    #[test]
    fn empty_results_are_a_validation_error() {
        let store = seeded(json!([]));
        let before = store.writes();

        let err = assign(&store, "LAB-1", "pat-001").expect_err("nothing to assign");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.writes(), before);
    }

    #[test]
    fn reassigning_to_the_same_patient_writes_nothing() {
        let store = seeded(single_potassium());
        let first = assign(&store, "LAB-1", "pat-001").unwrap();
        let before = store.writes();

        let again = assign(&store, "LAB-1", "pat-001").unwrap();
        assert_eq!(store.writes(), before);
        assert_eq!(again.assignment_id, None);
        assert_eq!(again.assigned_at, first.assigned_at);
        assert!(again.message.contains("already assigned"));
    }

    #[test]
    fn reassigning_to_another_patient_moves_the_link_and_keeps_history() {
        let store = seeded(single_potassium());
        assign(&store, "LAB-1", "pat-001").unwrap();
        let moved = assign(&store, "LAB-1", "pat-002").unwrap();
        assert!(moved.assignment_id.is_some());

        let raw = store.get(RAW_LAB_COLLECTION, "LAB-1").unwrap().unwrap();
        assert_eq!(raw.body["assigned_patient_id"], "pat-002");

        let owners: Vec<String> = store
            .list(PATIENT_LAB_RESULTS_COLLECTION)
            .unwrap()
            .iter()
            .filter_map(|d| d.body["patient_id"].as_str().map(str::to_string))
            .collect();
        assert_eq!(owners.len(), 2);
        assert!(owners.contains(&"pat-001".to_string()));
        assert!(owners.contains(&"pat-002".to_string()));
    }

    #[test]
    fn unclassifiable_results_are_still_assigned() {
        let store = seeded(json!([
            {"test_name": "COMMENTO", "value": "vedi referto", "reference_range": "3.5 - 5.3"},
            {"test_name": "SODIO", "value": 150, "reference_range": "136 - 145"}
        ]));
        let outcome = assign(&store, "LAB-1", "pat-001").unwrap();
        let classes: Vec<RangeClass> = outcome.results.iter().map(|r| r.classification).collect();
        assert_eq!(classes, vec![RangeClass::Unknown, RangeClass::Abnormal]);
    }

    #[test]
    fn malformed_result_fields_classify_as_unknown() {
        let store = seeded(json!([
            {"test_code": 1234, "value": "4.0", "reference_range": 5},
            {"test_name": "POTASSIO", "value": true, "reference_range": "3.5 - 5.3"}
        ]));
        let outcome = assign(&store, "LAB-1", "pat-001").unwrap();

        assert_eq!(outcome.result_count(), 2);
        assert!(outcome
            .results
            .iter()
            .all(|r| r.classification == RangeClass::Unknown));
        assert_eq!(outcome.results[0].test_code.as_deref(), Some("1234"));
        assert_eq!(outcome.results[0].reference_range.as_deref(), Some("5"));
        assert_eq!(outcome.results[1].value_text, "true");

        let raw = store.get(RAW_LAB_COLLECTION, "LAB-1").unwrap().unwrap();
        assert_eq!(raw.body["assigned_patient_id"], "pat-001");
    }

    #[test]
    fn ids_the_file_store_cannot_hold_are_not_found() {
        use crate::store::FileStore;
        use tempfile::TempDir;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::open(temp_dir.path()).expect("open store");
        store
            .insert(PATIENTS_COLLECTION, Some("p1"), patient("p1", "Rossi", "Mario"))
            .unwrap();
        store
            .insert(
                RAW_LAB_COLLECTION,
                Some("LAB-1"),
                json!({"document_id": "LAB-1", "lab_results": single_potassium()}),
            )
            .unwrap();

        for document_id in ["LAB 001", "MSG^001"] {
            let err = assign(&store, document_id, "p1").expect_err(document_id);
            assert_eq!(err.kind(), ErrorKind::NotFound, "{document_id}");
            assert!(matches!(err, RecordError::DocumentNotFound { .. }));
        }

        let err = assign(&store, "LAB-1", "p 1").expect_err("unstorable patient id");
        assert!(matches!(err, RecordError::PatientNotFound(ref id) if id == "p 1"));

        assert_eq!(store.count(PATIENT_LAB_RESULTS_COLLECTION).unwrap(), 0);
        let raw = store.get(RAW_LAB_COLLECTION, "LAB-1").unwrap().unwrap();
        assert!(raw.body.get("assigned_patient_id").is_none());
    }
}
