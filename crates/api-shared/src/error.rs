use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of every error response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    /// Always `false`.
    pub success: bool,
    pub error: String,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeleteRes {
    pub success: bool,
    pub message: String,
}

impl DeleteRes {
    pub fn deleted(what: impl std::fmt::Display) -> Self {
        Self {
            success: true,
            message: format!("{what} deleted"),
        }
    }
}
