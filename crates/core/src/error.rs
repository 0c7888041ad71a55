//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Missing record fields are not errors (they degrade to defaults). This enum
/// covers the few shapes that cannot be interpreted at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. an empty identifier).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The trigger event could not be read as a batch of records.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// A record could not be turned into its stored text form.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn malformed_event(msg: impl Into<String>) -> Self {
        Self::MalformedEvent(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}
