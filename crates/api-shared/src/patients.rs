//! Bodies for the patient directory endpoints.

use crate::lab::LabResultRes;
use crate::timestamp;
use clinrec_core::LabAssignment;
use fhir::{FhirError, Patient, PatientData};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// A patient as a FHIR-aligned resource, with the display fields pulled out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientRes {
    pub id: String,
    pub display_name: Option<String>,
    pub primary_identifier: Option<String>,
    #[schema(value_type = Object)]
    pub resource: Value,
}

impl PatientRes {
    /// # Errors
    ///
    /// Returns [`FhirError`] if the patient cannot be rendered as a resource.
    pub fn from_patient(patient: &PatientData) -> Result<Self, FhirError> {
        Ok(Self {
            id: patient.id.to_string(),
            display_name: patient.display_name(),
            primary_identifier: patient.primary_identifier().map(str::to_string),
            resource: Patient::render(patient)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListPatientsRes {
    pub count: usize,
    pub patients: Vec<PatientRes>,
}

impl ListPatientsRes {
    /// # Errors
    ///
    /// Returns [`FhirError`] if any patient cannot be rendered.
    pub fn from_patients(patients: &[PatientData]) -> Result<Self, FhirError> {
        let patients = patients
            .iter()
            .map(PatientRes::from_patient)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            count: patients.len(),
            patients,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LabAssignmentRes {
    pub assignment_id: String,
    pub document_id: String,
    pub patient_id: String,
    pub assigned_at: String,
    pub results: Vec<LabResultRes>,
}

impl From<LabAssignment> for LabAssignmentRes {
    fn from(set: LabAssignment) -> Self {
        Self {
            assignment_id: set.assignment_id,
            document_id: set.document_id,
            patient_id: set.patient_id,
            assigned_at: timestamp(set.assigned_at),
            results: set.results.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientLabResultsRes {
    pub patient_id: String,
    pub count: usize,
    pub assignments: Vec<LabAssignmentRes>,
}

impl PatientLabResultsRes {
    pub fn new(patient_id: impl Into<String>, sets: Vec<LabAssignment>) -> Self {
        let assignments: Vec<LabAssignmentRes> = sets.into_iter().map(Into::into).collect();
        Self {
            patient_id: patient_id.into(),
            count: assignments.len(),
            assignments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patients_render_with_display_fields() {
        let patient = Patient::from_value(json!({
            "resourceType": "Patient",
            "id": "pat-001",
            "identifier": [{"value": "RSSMRA80E12H501X"}],
            "name": [{"family": "Rossi", "given": ["Mario"]}]
        }))
        .unwrap();

        let res = ListPatientsRes::from_patients(&[patient]).unwrap();
        assert_eq!(res.count, 1);
        let first = &res.patients[0];
        assert_eq!(first.display_name.as_deref(), Some("Rossi Mario"));
        assert_eq!(first.primary_identifier.as_deref(), Some("RSSMRA80E12H501X"));
        assert_eq!(first.resource["id"], "pat-001");
    }
}
