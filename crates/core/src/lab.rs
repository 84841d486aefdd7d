//! Raw lab documents, their display projections and assigned results.
//!
//! A raw lab document arrives from an upstream HL7 parser with patient details copied verbatim
//! from the message but no link to a known patient. Assignment links it to one and classifies
//! each result; see [`crate::repositories::assignment`].

use crate::constants::NOT_AVAILABLE;
use crate::projection::FieldMap;
use crate::range::{classify, LabValue, RangeClass};
use chrono::{DateTime, Utc};
use fhir::hl7::{hl7_date_to_fhir, hl7_name_to_display};
use fhir::AdministrativeGender;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const LABEL_MESSAGE_TYPE: &str = "Message Type";
pub const LABEL_TIMESTAMP: &str = "Timestamp";
pub const LABEL_PATIENT: &str = "Patient";
pub const LABEL_RESULT_COUNT: &str = "Result Count";
pub const LABEL_STATUS: &str = "Status";

/// Patient details as carried by the HL7 message, untranslated.
///
/// Numbers and booleans are read as text; values of any other shape read as absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    #[serde(default, deserialize_with = "lenient_text")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifiers: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", alias = "birthDate")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl PatientInfo {
    /// `"FAMILY GIVEN"` from the HL7 name, if it has one.
    pub fn display_name(&self) -> Option<String> {
        self.name.as_deref().and_then(hl7_name_to_display)
    }

    /// Birth date as `YYYY-MM-DD` when the message carries `YYYYMMDD`.
    pub fn display_birth_date(&self) -> Option<String> {
        non_blank(self.birth_date.as_deref()).map(hl7_date_to_fhir)
    }

    /// Gender code translated to its FHIR name.
    pub fn display_gender(&self) -> Option<&'static str> {
        non_blank(self.gender.as_deref()).map(|g| AdministrativeGender::from_hl7(g).to_wire())
    }
}

/// One result line of a raw lab document.
///
/// Decoding never fails on field shapes: a malformed field reads as absent or as an
/// unreadable value, and the result then classifies as unknown.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LabResultEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub test_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub test_name: Option<String>,
    #[serde(default)]
    pub value: Option<LabValue>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reference_range: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
}

/// A lab document awaiting, or past, assignment to a patient.
///
/// Fields this type does not know about are kept in `extra` and written back unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLabDocument {
    #[serde(default, deserialize_with = "lenient_text")]
    pub document_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub message_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub sending_application: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub receiving_application: Option<String>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub patient_info: PatientInfo,
    #[serde(default, deserialize_with = "lenient_results")]
    pub lab_results: Vec<LabResultEntry>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_patient_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Whether a raw lab document has been linked to a patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssignmentState {
    Unassigned,
    Assigned {
        patient_id: String,
        assigned_at: Option<DateTime<Utc>>,
    },
}

impl RawLabDocument {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn state(&self) -> AssignmentState {
        match non_blank(self.assigned_patient_id.as_deref()) {
            Some(patient_id) => AssignmentState::Assigned {
                patient_id: patient_id.to_string(),
                assigned_at: self.assigned_at,
            },
            None => AssignmentState::Unassigned,
        }
    }

    /// `"{patient name} ({document_id})"`.
    pub fn title(&self) -> String {
        format!(
            "{} ({})",
            self.patient_info
                .display_name()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            non_blank(self.document_id.as_deref()).unwrap_or(NOT_AVAILABLE)
        )
    }

    pub fn summary(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.push(LABEL_MESSAGE_TYPE, owned(self.message_type.as_deref()));
        fields.push(LABEL_TIMESTAMP, owned(self.timestamp.as_deref()));
        fields.push(LABEL_PATIENT, self.patient_info.display_name());
        fields.push(LABEL_RESULT_COUNT, Some(self.lab_results.len().to_string()));
        fields.push(LABEL_STATUS, Some(self.status_text()));
        fields
    }

    fn status_text(&self) -> String {
        match self.state() {
            AssignmentState::Unassigned => "unassigned".to_string(),
            AssignmentState::Assigned { patient_id, .. } => format!("assigned to {patient_id}"),
        }
    }

    /// Every result classified against its reference range.
    pub fn classified_results(&self) -> Vec<AssignedLabResult> {
        self.lab_results.iter().map(AssignedLabResult::from_entry).collect()
    }

    /// Full display view of the document.
    pub fn detail(&self) -> LabDocumentDetail {
        let (assigned_patient_id, assigned_at) = match self.state() {
            AssignmentState::Unassigned => (None, None),
            AssignmentState::Assigned {
                patient_id,
                assigned_at,
            } => (Some(patient_id), assigned_at),
        };

        LabDocumentDetail {
            document_id: self.document_id.clone(),
            title: self.title(),
            summary: self.summary(),
            sending_application: self.sending_application.clone(),
            receiving_application: self.receiving_application.clone(),
            patient: PatientInfoView {
                name: self.patient_info.display_name(),
                identifiers: owned(self.patient_info.identifiers.as_deref()),
                birth_date: self.patient_info.display_birth_date(),
                gender: self.patient_info.display_gender().map(str::to_string),
                address: owned(self.patient_info.address.as_deref()),
                phone: owned(self.patient_info.phone.as_deref()),
            },
            results: self.classified_results(),
            assigned_patient_id,
            assigned_at,
        }
    }
}

/// Patient details translated for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatientInfoView {
    pub name: Option<String>,
    pub identifiers: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabDocumentDetail {
    pub document_id: Option<String>,
    pub title: String,
    pub summary: FieldMap,
    pub sending_application: Option<String>,
    pub receiving_application: Option<String>,
    pub patient: PatientInfoView,
    /// Results classified as they would be on assignment.
    pub results: Vec<AssignedLabResult>,
    pub assigned_patient_id: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
}

/// A lab result with its classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssignedLabResult {
    pub test_code: Option<String>,
    pub test_name: Option<String>,
    /// The value exactly as received, rendered as text.
    pub value_text: String,
    /// Numeric reading of the value, if it has one.
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub status: Option<String>,
    pub classification: RangeClass,
}

impl AssignedLabResult {
    pub fn from_entry(entry: &LabResultEntry) -> Self {
        let classification = match &entry.value {
            Some(value) => classify(value, entry.reference_range.as_deref()),
            None => RangeClass::Unknown,
        };

        Self {
            test_code: entry.test_code.clone(),
            test_name: entry.test_name.clone(),
            value_text: entry.value.as_ref().map(LabValue::to_text).unwrap_or_default(),
            value: entry.value.as_ref().and_then(LabValue::as_number),
            unit: entry.unit.clone(),
            reference_range: entry.reference_range.clone(),
            status: entry.status.clone(),
            classification,
        }
    }
}

/// The results of one assignment, owned by the patient they were assigned to.
///
/// Sets are never modified; assigning again produces a new set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabAssignment {
    pub assignment_id: String,
    pub document_id: String,
    pub patient_id: String,
    pub assigned_at: DateTime<Utc>,
    pub results: Vec<AssignedLabResult>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// A non-sequence reads as no results; a non-object item as an empty result line.
fn lenient_results<'de, D>(deserializer: D) -> Result<Vec<LabResultEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.parse().ok(),
        _ => None,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn owned(value: Option<&str>) -> Option<String> {
    non_blank(value).map(str::to_string)
}
