//! # API Shared
//!
//! Wire types shared by the clinrec front ends.
//!
//! Contains:
//! - Request and response bodies with OpenAPI schemas (`documents`, `lab`, `patients`)
//! - Conversions from `clinrec-core` results into those bodies
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and by the CLI's JSON output.

pub mod documents;
pub mod error;
pub mod health;
pub mod lab;
pub mod patients;

pub use documents::{
    FieldEntry, HighlightEntry, InsertRecordRes, ListRecordsRes, RecordSummaryRes, SearchHitRes,
    SearchRes, StatsRes, VariantShareRes,
};
pub use error::{DeleteRes, ErrorRes};
pub use health::{HealthRes, HealthService};
pub use lab::{
    AssignLabDocumentReq, AssignLabDocumentRes, InsertLabDocumentRes, LabDocumentDetailRes,
    LabDocumentSummaryRes, LabPatientInfoRes, LabResultRes, ListLabDocumentsRes,
};
pub use patients::{LabAssignmentRes, ListPatientsRes, PatientLabResultsRes, PatientRes};

/// RFC 3339 rendering used for every timestamp on the wire.
pub(crate) fn timestamp(value: chrono::DateTime<chrono::Utc>) -> String {
    value.to_rfc3339()
}
