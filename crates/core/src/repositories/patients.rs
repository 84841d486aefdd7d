//! Patient directory.
//!
//! Patients are FHIR-aligned resources stored under their own `id`. The lab result sets
//! assigned to a patient live in a separate collection and are looked up by patient id.

use crate::constants::{PATIENTS_COLLECTION, PATIENT_LAB_RESULTS_COLLECTION};
use crate::lab::LabAssignment;
use crate::store::DocumentStore;
use crate::{RecordError, RecordResult};
use clinrec_types::NonEmptyText;
use fhir::{Patient, PatientData};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn DocumentStore>,
}

impl PatientService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All patients, or those matching `query` when it is not blank.
    ///
    /// A patient matches if the query occurs, ignoring case, in any identifier value, any
    /// family name, or the first given name of any name. Stored resources that no longer
    /// decode are skipped with a warning.
    pub fn list(&self, query: Option<&str>) -> RecordResult<Vec<PatientData>> {
        let query = NonEmptyText::from_optional(query);
        let mut patients = Vec::new();

        for stored in self.store.list(PATIENTS_COLLECTION)? {
            let patient = match Patient::from_value(stored.body) {
                Ok(patient) => patient,
                Err(e) => {
                    tracing::warn!(id = %stored.id, error = %e, "skipping undecodable patient");
                    continue;
                }
            };
            if query.as_ref().map_or(true, |q| matches_query(&patient, q)) {
                patients.push(patient);
            }
        }

        Ok(patients)
    }

    /// # Errors
    ///
    /// [`RecordError::PatientNotFound`] if there is no such patient.
    pub fn get(&self, id: &str) -> RecordResult<PatientData> {
        let stored = self
            .store
            .get(PATIENTS_COLLECTION, id)?
            .ok_or_else(|| RecordError::PatientNotFound(id.to_string()))?;
        Ok(Patient::from_value(stored.body)?)
    }

    /// Validate and store a patient resource under its `id`.
    ///
    /// The resource is stored as given, so fields outside the modelled subset survive.
    ///
    /// # Errors
    ///
    /// - [`RecordError::Fhir`] if the resource is not a valid patient
    /// - [`RecordError::InvalidInput`] if the id is not a valid key or is already taken
    pub fn create(&self, resource: Value) -> RecordResult<PatientData> {
        let patient = Patient::from_value(resource.clone())?;
        self.store
            .insert(PATIENTS_COLLECTION, Some(patient.id.as_str()), resource)?;
        tracing::info!(patient_id = %patient.id, "created patient");
        Ok(patient)
    }

    /// Remove a patient. Lab result sets already assigned to them are kept.
    ///
    /// # Errors
    ///
    /// [`RecordError::PatientNotFound`] if there is no such patient.
    pub fn delete(&self, id: &str) -> RecordResult<()> {
        if self.store.delete(PATIENTS_COLLECTION, id)? {
            tracing::info!(patient_id = %id, "deleted patient");
            Ok(())
        } else {
            Err(RecordError::PatientNotFound(id.to_string()))
        }
    }

    /// Every lab result set assigned to the patient, newest first.
    ///
    /// # Errors
    ///
    /// [`RecordError::PatientNotFound`] if there is no such patient.
    pub fn lab_results(&self, patient_id: &str) -> RecordResult<Vec<LabAssignment>> {
        if self.store.get(PATIENTS_COLLECTION, patient_id)?.is_none() {
            return Err(RecordError::PatientNotFound(patient_id.to_string()));
        }

        let mut sets = Vec::new();
        for stored in self.store.list(PATIENT_LAB_RESULTS_COLLECTION)? {
            if stored.body.get("patient_id").and_then(Value::as_str) != Some(patient_id) {
                continue;
            }
            match serde_json::from_value::<LabAssignment>(stored.body) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!(id = %stored.id, error = %e, "skipping undecodable lab result set");
                }
            }
        }

        Ok(sets)
    }
}

fn matches_query(patient: &PatientData, query: &NonEmptyText) -> bool {
    let identifiers = patient.identifiers.iter().map(|i| i.value.as_str());
    let families = patient.names.iter().filter_map(|n| n.family.as_deref());
    let first_givens = patient
        .names
        .iter()
        .filter_map(|n| n.given.first().map(String::as_str));

    identifiers
        .chain(families)
        .chain(first_givens)
        .any(|candidate| query.is_contained_in(candidate))
}
