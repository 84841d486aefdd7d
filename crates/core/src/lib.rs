//! # clinrec core
//!
//! Projection, search and classification of converted HL7 clinical records.
//!
//! The crate is split into pure components and services:
//! - [`range`]: classifies lab values against textual reference ranges
//! - [`projection`]: titles, summaries and highlight fields per record variant
//! - [`search`]: criteria validation, matching and highlighting
//! - [`stats`]: per-variant counts and shares
//! - [`lab`]: raw lab documents and assigned results
//! - [`store`]: the document store seam and its file and in-memory implementations
//! - [`repositories`]: services combining the above over a store
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and
//! `clinrec-cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod lab;
pub mod projection;
pub mod range;
pub mod repositories;
pub mod search;
pub mod stats;
pub mod store;
pub mod validation;
pub mod variant;

mod value;

pub use clinrec_types::NonEmptyText;
pub use config::CoreConfig;
pub use error::{ErrorKind, RecordError, RecordResult};
pub use lab::{AssignedLabResult, LabAssignment, RawLabDocument};
pub use projection::{ClinicalRecord, FieldMap};
pub use range::{classify, LabValue, RangeClass, ReferenceRange};
pub use repositories::assignment::AssignmentOutcome;
pub use repositories::documents::DocumentService;
pub use repositories::patients::PatientService;
pub use repositories::raw_lab::RawLabService;
pub use search::SearchCriteria;
pub use stats::StatsSummary;
pub use store::{DocumentStore, FileStore, InMemoryStore, StoredDocument};
pub use variant::VariantTag;
