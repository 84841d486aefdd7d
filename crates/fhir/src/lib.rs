//! FHIR boundary support for clinrec.
//!
//! Patients are persisted as FHIR-aligned JSON resources. This crate provides:
//! - the strict wire model for those resources and translation to a domain-level carrier
//! - translation helpers for the HL7 v2 codes that appear in raw lab documents
//!   (administrative sex, `YYYYMMDD` dates, `^`-separated person names)
//!
//! Observations, encounters and the rest of FHIR are deliberately absent; the only resource
//! the workspace owns is the patient that lab results are assigned to.

pub mod hl7;
pub mod patient;

// Re-export facades
pub use patient::Patient;

// Re-export public domain-level types
pub use hl7::AdministrativeGender;
pub use patient::{Address, ContactPoint, HumanName, PatientData, PatientIdentifier};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
