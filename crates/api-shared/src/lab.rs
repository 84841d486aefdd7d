//! Bodies for the raw lab document endpoints.

use crate::documents::FieldEntry;
use crate::timestamp;
use clinrec_core::lab::{LabDocumentDetail, PatientInfoView};
use clinrec_core::repositories::raw_lab::LabDocumentSummary;
use clinrec_core::{AssignedLabResult, AssignmentOutcome, StoredDocument};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LabDocumentSummaryRes {
    pub id: String,
    pub inserted_at: String,
    pub title: String,
    pub summary: Vec<FieldEntry>,
    pub assigned_patient_id: Option<String>,
}

impl From<LabDocumentSummary> for LabDocumentSummaryRes {
    fn from(doc: LabDocumentSummary) -> Self {
        Self {
            id: doc.id,
            inserted_at: timestamp(doc.inserted_at),
            title: doc.title,
            summary: FieldEntry::from_map(doc.summary),
            assigned_patient_id: doc.assigned_patient_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListLabDocumentsRes {
    pub count: usize,
    pub documents: Vec<LabDocumentSummaryRes>,
}

impl From<Vec<LabDocumentSummary>> for ListLabDocumentsRes {
    fn from(docs: Vec<LabDocumentSummary>) -> Self {
        let documents: Vec<LabDocumentSummaryRes> = docs.into_iter().map(Into::into).collect();
        Self {
            count: documents.len(),
            documents,
        }
    }
}

/// A lab result with its classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LabResultRes {
    pub test_code: Option<String>,
    pub test_name: Option<String>,
    pub value_text: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub status: Option<String>,
    /// `normal`, `abnormal` or `unknown`.
    pub classification: String,
    /// Whether default styling treats the result as normal; only `abnormal` is flagged.
    pub renders_as_normal: bool,
}

impl From<AssignedLabResult> for LabResultRes {
    fn from(result: AssignedLabResult) -> Self {
        Self {
            test_code: result.test_code,
            test_name: result.test_name,
            value_text: result.value_text,
            value: result.value,
            unit: result.unit,
            reference_range: result.reference_range,
            status: result.status,
            classification: result.classification.to_string(),
            renders_as_normal: result.classification.renders_as_normal(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LabPatientInfoRes {
    pub name: Option<String>,
    pub identifiers: Option<String>,
    /// `YYYY-MM-DD` when the message carried `YYYYMMDD`.
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl From<PatientInfoView> for LabPatientInfoRes {
    fn from(view: PatientInfoView) -> Self {
        Self {
            name: view.name,
            identifiers: view.identifiers,
            birth_date: view.birth_date,
            gender: view.gender,
            address: view.address,
            phone: view.phone,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LabDocumentDetailRes {
    pub document_id: Option<String>,
    pub title: String,
    pub summary: Vec<FieldEntry>,
    pub sending_application: Option<String>,
    pub receiving_application: Option<String>,
    pub patient: LabPatientInfoRes,
    pub results: Vec<LabResultRes>,
    pub assigned_patient_id: Option<String>,
    pub assigned_at: Option<String>,
}

impl From<LabDocumentDetail> for LabDocumentDetailRes {
    fn from(detail: LabDocumentDetail) -> Self {
        Self {
            document_id: detail.document_id,
            title: detail.title,
            summary: FieldEntry::from_map(detail.summary),
            sending_application: detail.sending_application,
            receiving_application: detail.receiving_application,
            patient: detail.patient.into(),
            results: detail.results.into_iter().map(Into::into).collect(),
            assigned_patient_id: detail.assigned_patient_id,
            assigned_at: detail.assigned_at.map(timestamp),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InsertLabDocumentRes {
    pub success: bool,
    pub id: String,
}

impl From<StoredDocument> for InsertLabDocumentRes {
    fn from(doc: StoredDocument) -> Self {
        Self {
            success: true,
            id: doc.id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AssignLabDocumentReq {
    pub document_id: String,
    pub patient_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssignLabDocumentRes {
    pub success: bool,
    pub message: String,
    pub document_id: String,
    pub patient_id: String,
    /// Absent when the document already belonged to the patient.
    pub assignment_id: Option<String>,
    pub assigned_at: Option<String>,
    pub result_count: usize,
    pub results: Vec<LabResultRes>,
}

impl From<AssignmentOutcome> for AssignLabDocumentRes {
    fn from(outcome: AssignmentOutcome) -> Self {
        Self {
            success: true,
            result_count: outcome.result_count(),
            message: outcome.message,
            document_id: outcome.document_id,
            patient_id: outcome.patient_id,
            assignment_id: outcome.assignment_id,
            assigned_at: outcome.assigned_at.map(timestamp),
            results: outcome.results.into_iter().map(Into::into).collect(),
        }
    }
}
