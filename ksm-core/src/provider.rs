//! Vault client abstraction.
//!
//! The core never talks to a vault directly. Whatever transport sits behind
//! a [`VaultClient`] (SDK, HTTP, fixture) only has to hand back raw
//! [`Record`]s and raw field values.

use serde_json::Value;
use thiserror::Error;

use crate::record::Record;

/// Errors reported by a vault client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Notation matched more than one record
    #[error("Ambiguous reference: {0}")]
    Ambiguous(String),

    /// No record behind the reference
    #[error("No such record: {0}")]
    RecordNotFound(String),

    /// Record exists but has nothing at that location
    #[error("Not found: {0}")]
    NotFound(String),

    /// Vault unreachable or timed out
    #[error("Vault unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl ClientError {
    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a missing record error.
    #[must_use]
    pub fn record_not_found(reference: impl Into<String>) -> Self {
        Self::RecordNotFound(reference.into())
    }
}

/// Result of a native notation lookup.
///
/// Values alone are not enough to mask correctly: a label-addressed custom
/// field can hold any type, and a sensitive label masks an otherwise plain
/// field. The client reports what it actually found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeField {
    /// Declared type of the field the client found
    pub field_type: String,
    /// Its label, if any
    pub label: Option<String>,
    /// Raw values after the client applied index and property
    pub values: Vec<Value>,
}

impl NativeField {
    /// Unlabelled field of `field_type`.
    #[must_use]
    pub fn new(field_type: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field_type: field_type.into(),
            label: None,
            values,
        }
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Source of records.
pub trait VaultClient: Send + Sync {
    /// Fetch the records with the given uids. Unknown uids are skipped.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn fetch_records_by_uid(&self, uids: &[String]) -> Result<Vec<Record>, ClientError>;

    /// Fetch every record visible to the client, in the client's order.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn fetch_all_records(&self) -> Result<Vec<Record>, ClientError>;

    /// Native notation lookup.
    ///
    /// Returns the field found at the location with its raw values,
    /// [`ClientError::Ambiguous`] when the record reference matches several
    /// records and [`ClientError::RecordNotFound`] when it matches none.
    ///
    /// # Errors
    ///
    /// Ambiguity, missing records or locations and backend failures.
    fn resolve_notation(&self, notation: &str) -> Result<NativeField, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        assert_eq!(
            ClientError::unavailable("timeout").to_string(),
            "Vault unavailable: timeout"
        );
        assert_eq!(
            ClientError::Ambiguous("Shared Login".into()).to_string(),
            "Ambiguous reference: Shared Login"
        );
        assert_eq!(ClientError::not_found("x"), ClientError::NotFound("x".into()));
        assert_eq!(
            ClientError::record_not_found("Nobody").to_string(),
            "No such record: Nobody"
        );
    }

    #[test]
    fn test_native_field_builder() {
        let field = NativeField::new("password", vec![Value::from("pw")]).with_label("DB Creds");
        assert_eq!(field.field_type, "password");
        assert_eq!(field.label.as_deref(), Some("DB Creds"));
        assert_eq!(field.values.len(), 1);
    }
}
