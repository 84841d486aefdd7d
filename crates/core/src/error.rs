/// Broad class of a [`RecordError`], used by front ends to pick a status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced document or patient id does not resolve.
    NotFound,
    /// The input violates a precondition.
    Validation,
    /// The document store failed to respond or returned unreadable data.
    Upstream,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("document {id} not found in {collection}")]
    DocumentNotFound { collection: String, id: String },
    #[error("patient {0} not found")]
    PatientNotFound(String),
    #[error("invalid patient resource: {0}")]
    Fhir(#[from] fhir::FhirError),

    #[error("document store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("failed to create store directory: {0}")]
    StoreDirCreation(std::io::Error),
    #[error("failed to write document file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read document file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize document: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize document: {0}")]
    Deserialization(serde_json::Error),
}

impl RecordError {
    /// Taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordError::DocumentNotFound { .. } | RecordError::PatientNotFound(_) => {
                ErrorKind::NotFound
            }
            RecordError::InvalidInput(_) | RecordError::Fhir(_) => ErrorKind::Validation,
            RecordError::StoreUnavailable(_)
            | RecordError::StoreDirCreation(_)
            | RecordError::FileWrite(_)
            | RecordError::FileRead(_)
            | RecordError::Serialization(_)
            | RecordError::Deserialization(_) => ErrorKind::Upstream,
        }
    }
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;
