use crate::models::ResourceKind;
use hms_types::{RecordId, TextError};

#[derive(Debug, thiserror::Error)]
pub enum HmsError {
    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: RecordId },
    #[error("invalid {kind} status transition: {from} -> {to}")]
    InvalidTransition {
        kind: ResourceKind,
        from: String,
        to: String,
    },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error(
        "insufficient stock for {name} (medicine {medicine}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        medicine: RecordId,
        name: String,
        requested: u32,
        available: u32,
    },
}

impl HmsError {
    /// Whether an operator retry could succeed without changing the request.
    ///
    /// Only collaborator failures qualify; every other variant is deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HmsError::Network(_))
    }
}

impl From<TextError> for HmsError {
    fn from(err: TextError) -> Self {
        HmsError::Validation(err.to_string())
    }
}

pub type HmsResult<T> = std::result::Result<T, HmsError>;
