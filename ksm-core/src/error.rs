//! Notation core error types using thiserror 2.0.
//!
//! Grammar and validation failures are terminal. Extraction failures for a
//! single field are local and surface as [`KsmError::FieldNotFound`].

use ksm_common::CommonError;
use thiserror::Error;

use crate::provider::ClientError;
use crate::validation::RejectionReason;

/// Notation core errors.
#[derive(Error, Debug)]
pub enum KsmError {
    /// Empty notation or input string
    #[error("Empty input")]
    EmptyInput,

    /// Notation does not have the `ref/kind/payload` structure
    #[error("Malformed notation: {0}")]
    MalformedNotation(String),

    /// Second notation segment is not `field`, `custom_field` or `file`
    #[error("Unknown notation kind: {0}")]
    UnknownNotationKind(String),

    /// Field name or file name missing after the kind segment
    #[error("Missing payload after '{0}'")]
    MissingPayload(String),

    /// Bracketed index is not a plain non-negative integer
    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    /// Input rejected by the validator
    #[error("Validation rejected: {0}")]
    ValidationRejected(#[from] RejectionReason),

    /// No record matched the reference
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Record has no such field, index or property
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Several records share a title. Resolved internally, never returned.
    #[error("Ambiguous record reference: {0}")]
    AmbiguousRecord(String),

    /// Field value does not have the structure its type declares
    #[error("Unsupported field shape for '{0}'")]
    UnsupportedFieldShape(String),

    /// Vault client failure
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Shared error
    #[error(transparent)]
    Common(#[from] CommonError),
}

/// Result type for notation core operations.
pub type KsmResult<T> = Result<T, KsmError>;

impl KsmError {
    /// Check if error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Client(ClientError::Unavailable(_)))
    }

    /// Whether the error means "nothing at that location" rather than bad input.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RecordNotFound(_) | Self::FieldNotFound(_) | Self::UnsupportedFieldShape(_)
        )
    }

    /// Create a malformed notation error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedNotation(msg.into())
    }

    /// Create a record not found error.
    #[must_use]
    pub fn record_not_found(reference: impl Into<String>) -> Self {
        Self::RecordNotFound(reference.into())
    }

    /// Create a field not found error.
    #[must_use]
    pub fn field_not_found(field: impl Into<String>) -> Self {
        Self::FieldNotFound(field.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KsmError::UnknownNotationKind("fields".to_string());
        assert_eq!(err.to_string(), "Unknown notation kind: fields");

        let err = KsmError::MissingPayload("field".to_string());
        assert_eq!(err.to_string(), "Missing payload after 'field'");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(KsmError::Client(ClientError::Unavailable("timeout".into())).is_retryable());
        assert!(!KsmError::Client(ClientError::Ambiguous("t".into())).is_retryable());
        assert!(!KsmError::field_not_found("password").is_retryable());
        assert!(!KsmError::EmptyInput.is_retryable());
    }

    #[test]
    fn test_not_found_classification() {
        assert!(KsmError::record_not_found("abc").is_not_found());
        assert!(KsmError::UnsupportedFieldShape("phone".into()).is_not_found());
        assert!(!KsmError::malformed("x").is_not_found());
    }

    #[test]
    fn test_from_rejection() {
        let err: KsmError = RejectionReason::Empty { field: "uid" }.into();
        assert!(matches!(err, KsmError::ValidationRejected(_)));
        assert_eq!(err.to_string(), "Validation rejected: uid must not be empty");
    }

    #[test]
    fn test_from_common_error() {
        let err: KsmError = CommonError::invalid_config("bad").into();
        assert!(matches!(err, KsmError::Common(_)));
    }
}
