//! Translation of HL7 v2 field values into their FHIR equivalents.
//!
//! Raw lab documents carry patient details exactly as they appeared in the PID segment. These
//! helpers turn them into the representations used by FHIR patient resources so they can be
//! displayed next to (and compared with) stored patients.

use crate::{FhirError, FhirResult};

/// FHIR `AdministrativeGender` code set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl AdministrativeGender {
    /// FHIR wire code.
    pub fn to_wire(self) -> &'static str {
        match self {
            AdministrativeGender::Male => "male",
            AdministrativeGender::Female => "female",
            AdministrativeGender::Other => "other",
            AdministrativeGender::Unknown => "unknown",
        }
    }

    /// Parse a FHIR wire code.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if `code` is not one of the four FHIR codes.
    pub fn from_wire(code: &str) -> FhirResult<Self> {
        match code {
            "male" => Ok(AdministrativeGender::Male),
            "female" => Ok(AdministrativeGender::Female),
            "other" => Ok(AdministrativeGender::Other),
            "unknown" => Ok(AdministrativeGender::Unknown),
            other => Err(FhirError::InvalidInput(format!(
                "unsupported gender code '{other}'"
            ))),
        }
    }

    /// Map an HL7 v2 administrative sex (PID-8) to the FHIR code set.
    ///
    /// Anything outside `M`, `F`, `O`, `U` (case-insensitive) maps to `Unknown`.
    pub fn from_hl7(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "M" => AdministrativeGender::Male,
            "F" => AdministrativeGender::Female,
            "O" => AdministrativeGender::Other,
            _ => AdministrativeGender::Unknown,
        }
    }
}

/// Convert an HL7 `YYYYMMDD[HHMM...]` timestamp into a FHIR `YYYY-MM-DD` date.
///
/// Values shorter than eight characters, or whose first eight characters are not all digits,
/// are returned unchanged.
pub fn hl7_date_to_fhir(value: &str) -> String {
    let value = value.trim();
    match value.get(..8) {
        Some(date) if date.bytes().all(|b| b.is_ascii_digit()) => {
            format!("{}-{}-{}", &date[..4], &date[4..6], &date[6..8])
        }
        _ => value.to_string(),
    }
}

/// Render an HL7 XPN name (`FAMILY^GIVEN^MIDDLE...`) as `"FAMILY GIVEN"`.
///
/// Empty components are skipped. Returns `None` when nothing remains.
pub fn hl7_name_to_display(value: &str) -> Option<String> {
    let parts: Vec<&str> = value
        .split('^')
        .take(2)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}
