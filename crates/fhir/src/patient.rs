//! FHIR-aligned patient wire models and translation helpers.
//!
//! Responsibilities:
//! - Define public domain-level types for external API use
//! - Define the wire model used for JSON (de)serialisation
//! - Translate between the two and enforce required fields
//!
//! Notes:
//! - Patients are referenced (by `id`) from assigned lab results, never embedded
//! - Keys outside the modelled subset are ignored on parse, since resources are written by
//!   the upstream converter and may carry `contact`/`extension` blocks we do not use

use crate::hl7::AdministrativeGender;
use crate::FhirError;
use chrono::{DateTime, Utc};
use clinrec_types::NonEmptyText;
use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// A business identifier (for example a national tax code).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientIdentifier {
    pub system: Option<String>,
    pub value: String,
}

/// A person name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HumanName {
    pub family: Option<String>,
    pub given: Vec<String>,
}

/// A phone number, email address or similar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactPoint {
    pub system: Option<String>,
    pub value: String,
}

/// A postal address.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Address {
    pub use_type: Option<String>,
    pub lines: Vec<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Domain-level carrier for patient data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientData {
    /// Unique identifier for this patient record; also the storage key.
    pub id: NonEmptyText,

    /// Business identifiers in resource order.
    pub identifiers: Vec<PatientIdentifier>,

    /// Names in resource order; the first is the one displayed.
    pub names: Vec<HumanName>,

    pub telecom: Vec<ContactPoint>,

    pub gender: Option<AdministrativeGender>,

    /// Patient's date of birth (ISO 8601 date format: YYYY-MM-DD).
    pub birth_date: Option<String>,

    pub addresses: Vec<Address>,

    /// Last updated timestamp.
    pub last_updated: Option<DateTime<Utc>>,
}

impl PatientData {
    /// First identifier value, if any.
    pub fn primary_identifier(&self) -> Option<&str> {
        self.identifiers.first().map(|i| i.value.as_str())
    }

    /// `"Family Given"` from the first name, if it has any parts.
    pub fn display_name(&self) -> Option<String> {
        let name = self.names.first()?;
        let parts: Vec<&str> = name
            .family
            .iter()
            .map(String::as_str)
            .chain(name.given.first().map(String::as_str))
            .filter(|p| !p.trim().is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// First telecom value, if any.
    pub fn phone(&self) -> Option<&str> {
        self.telecom.first().map(|t| t.value.as_str())
    }
}

// ============================================================================
// Public Patient operations
// ============================================================================

/// Patient resource operations.
///
/// This is a zero-sized type used for namespacing patient-related operations.
/// All methods are associated functions.
pub struct Patient;

impl Patient {
    /// Parse a patient resource from JSON text.
    ///
    /// # Errors
    ///
    /// See [`Patient::from_value`].
    pub fn parse(json_text: &str) -> Result<PatientData, FhirError> {
        let value: serde_json::Value = serde_json::from_str(json_text)?;
        Self::from_value(value)
    }

    /// Parse a patient resource from an already-decoded JSON value.
    ///
    /// This uses `serde_path_to_error` to surface the path (e.g. `name.0.given`) of the
    /// failing field when the JSON does not match the wire schema.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - any modelled field has an unexpected type,
    /// - `resourceType` is present and not `"Patient"`,
    /// - `id` is blank,
    /// - `gender` is not a FHIR administrative gender code.
    pub fn from_value(value: serde_json::Value) -> Result<PatientData, FhirError> {
        let wire = match serde_path_to_error::deserialize::<_, PatientWire>(value) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FhirError::Translation(format!(
                    "Patient schema mismatch at {path}: {source}"
                )));
            }
        };

        if let Some(resource_type) = wire.resource_type.as_deref() {
            if resource_type != "Patient" {
                return Err(FhirError::InvalidInput(format!(
                    "Expected resourceType 'Patient', got '{resource_type}'"
                )));
            }
        }

        wire_to_domain(wire)
    }

    /// Render a patient as a JSON resource value.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if serialisation fails.
    pub fn render(data: &PatientData) -> Result<serde_json::Value, FhirError> {
        let wire = domain_to_wire(data);
        serde_json::to_value(&wire)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise patient: {e}")))
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct PatientWire {
    #[serde(rename = "resourceType", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    pub id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<IdentifierWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanNameWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPointWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(rename = "birthDate", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<AddressWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PatientMetaWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct IdentifierWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default)]
    pub value: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct HumanNameWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct ContactPointWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default)]
    pub value: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct AddressWire {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(rename = "postalCode", default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
struct PatientMetaWire {
    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: PatientWire) -> Result<PatientData, FhirError> {
    let id = NonEmptyText::new(&wire.id)
        .map_err(|_| FhirError::InvalidInput("Patient id cannot be empty".into()))?;

    let gender = wire
        .gender
        .as_deref()
        .filter(|g| !g.is_empty())
        .map(AdministrativeGender::from_wire)
        .transpose()?;

    let last_updated = wire.meta.and_then(|m| {
        m.last_updated
            .as_ref()
            .and_then(|s| s.parse::<DateTime<Utc>>().ok())
    });

    Ok(PatientData {
        id,
        identifiers: wire
            .identifier
            .into_iter()
            .filter(|i| !i.value.is_empty())
            .map(|i| PatientIdentifier {
                system: i.system,
                value: i.value,
            })
            .collect(),
        names: wire
            .name
            .into_iter()
            .map(|n| HumanName {
                family: n.family,
                given: n.given,
            })
            .collect(),
        telecom: wire
            .telecom
            .into_iter()
            .filter(|t| !t.value.is_empty())
            .map(|t| ContactPoint {
                system: t.system,
                value: t.value,
            })
            .collect(),
        gender,
        birth_date: wire.birth_date.filter(|d| !d.is_empty()),
        addresses: wire
            .address
            .into_iter()
            .map(|a| Address {
                use_type: a.use_type,
                lines: a.line,
                city: a.city,
                postal_code: a.postal_code,
                country: a.country,
            })
            .collect(),
        last_updated,
    })
}

fn domain_to_wire(data: &PatientData) -> PatientWire {
    PatientWire {
        resource_type: Some("Patient".to_string()),
        id: data.id.to_string(),
        identifier: data
            .identifiers
            .iter()
            .map(|i| IdentifierWire {
                system: i.system.clone(),
                value: i.value.clone(),
            })
            .collect(),
        name: data
            .names
            .iter()
            .map(|n| HumanNameWire {
                family: n.family.clone(),
                given: n.given.clone(),
            })
            .collect(),
        telecom: data
            .telecom
            .iter()
            .map(|t| ContactPointWire {
                system: t.system.clone(),
                value: t.value.clone(),
            })
            .collect(),
        gender: data.gender.map(|g| g.to_wire().to_string()),
        birth_date: data.birth_date.clone(),
        address: data
            .addresses
            .iter()
            .map(|a| AddressWire {
                use_type: a.use_type.clone(),
                line: a.lines.clone(),
                city: a.city.clone(),
                postal_code: a.postal_code.clone(),
                country: a.country.clone(),
            })
            .collect(),
        meta: data.last_updated.map(|lu| PatientMetaWire {
            last_updated: Some(lu.to_rfc3339()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "resourceType": "Patient",
            "id": "pat-001",
            "identifier": [
                {"system": "http://hl7.it/sid/codiceFiscale", "value": "RSSMRA80E12H501X"}
            ],
            "name": [{"family": "Rossi", "given": ["Mario", "Luigi"]}],
            "telecom": [{"system": "phone", "value": "+39 06 1234567"}],
            "gender": "male",
            "birthDate": "1980-05-12",
            "address": [{"use": "home", "line": ["Via Roma 1"], "city": "Roma", "postalCode": "00100", "country": "IT"}],
            "contact": [],
            "meta": {"lastUpdated": "2025-06-11T10:30:00Z"}
        })
    }

    #[test]
    fn parses_full_resource() {
        let patient = Patient::from_value(sample()).expect("parse patient");
        assert_eq!(patient.id.as_str(), "pat-001");
        assert_eq!(patient.primary_identifier(), Some("RSSMRA80E12H501X"));
        assert_eq!(patient.display_name().as_deref(), Some("Rossi Mario"));
        assert_eq!(patient.gender, Some(AdministrativeGender::Male));
        assert_eq!(patient.birth_date.as_deref(), Some("1980-05-12"));
        assert_eq!(patient.phone(), Some("+39 06 1234567"));
        assert_eq!(patient.addresses[0].city.as_deref(), Some("Roma"));
        assert!(patient.last_updated.is_some());
    }

    #[test]
    fn render_then_parse_preserves_data() {
        let patient = Patient::from_value(sample()).expect("parse patient");
        let rendered = Patient::render(&patient).expect("render patient");
        assert_eq!(rendered["resourceType"], "Patient");
        assert_eq!(rendered["birthDate"], "1980-05-12");
        let reparsed = Patient::from_value(rendered).expect("reparse");
        assert_eq!(patient, reparsed);
    }

    #[test]
    fn rejects_wrong_types_with_path() {
        let err = Patient::from_value(json!({
            "id": "pat-001",
            "name": [{"family": "Rossi", "given": "Mario"}]
        }))
        .expect_err("given must be a list");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("given"), "{msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_resource_type() {
        let err = Patient::from_value(json!({"resourceType": "Observation", "id": "x"}))
            .expect_err("should reject resourceType");
        match err {
            FhirError::InvalidInput(msg) => {
                assert!(msg.contains("Patient"));
                assert!(msg.contains("Observation"));
            }
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_blank_id() {
        let err = Patient::from_value(json!({"id": "  "})).expect_err("blank id");
        assert!(matches!(err, FhirError::InvalidInput(_)));
    }

    #[test]
    fn rejects_unknown_gender() {
        let err = Patient::from_value(json!({"id": "p", "gender": "M"})).expect_err("gender");
        assert!(matches!(err, FhirError::InvalidInput(_)));
    }

    #[test]
    fn parses_minimal_patient() {
        let patient = Patient::parse(r#"{"id": "p-1"}"#).expect("minimal");
        assert!(patient.identifiers.is_empty());
        assert!(patient.names.is_empty());
        assert!(patient.display_name().is_none());
        assert!(patient.gender.is_none());

        let rendered = Patient::render(&patient).expect("render");
        assert!(rendered.get("name").is_none());
        assert!(rendered.get("birthDate").is_none());
    }
}
