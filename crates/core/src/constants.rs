//! Constants used throughout the clinrec core crate.
//!
//! Collection names match the ones the upstream converter writes to, so a store populated by
//! the converter can be read without any mapping.

/// Placeholder rendered for any projected value that is missing or blank.
pub const NOT_AVAILABLE: &str = "N/A";

/// Title rendered for a record whose variant tag is not recognised.
pub const UNKNOWN_VARIANT_TITLE: &str = "Document";

/// Default directory for the JSON document store when nothing is configured.
pub const DEFAULT_DATA_DIR: &str = "clinrec_data";

/// Default number of documents returned by listing and search operations.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Collection holding medical-document (MDM) records.
pub const MDM_COLLECTION: &str = "mdm_documents";

/// Collection holding laboratory-result (OUL) records.
pub const OUL_COLLECTION: &str = "oul_lab_results";

/// Collection holding patient-monitoring (ORU) records.
pub const ORU_COLLECTION: &str = "oru_patient_monitoring";

/// Collection holding raw lab documents awaiting (or past) assignment.
pub const RAW_LAB_COLLECTION: &str = "raw_lab_documents";

/// Collection holding FHIR-aligned patient resources, keyed by patient id.
pub const PATIENTS_COLLECTION: &str = "patients";

/// Collection holding assigned lab result sets.
pub const PATIENT_LAB_RESULTS_COLLECTION: &str = "patient_lab_results";

/// Key under which stores expose a document's id.
pub const ID_FIELD: &str = "_id";

/// Key under which stores expose a document's insertion timestamp.
pub const INSERTED_AT_FIELD: &str = "_inserted_at";
