//! Shared error type for the KSM notation libraries.
//!
//! Crate-specific error enums wrap [`CommonError`] so configuration and
//! serialization failures surface the same way everywhere.

use thiserror::Error;

/// Common error type for cross-cutting operations.
#[derive(Error, Debug)]
pub enum CommonError {
    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration value could not be interpreted
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CommonError {
    /// Create an invalid configuration error with the given message.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid input error with the given message.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an internal error with the given message.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Parse a boolean environment-style flag.
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off` in any case.
///
/// # Errors
///
/// Returns [`CommonError::InvalidConfig`] naming `key` for anything else.
///
/// # Examples
///
/// ```
/// use ksm_common::error::parse_flag;
///
/// assert!(parse_flag("KSM_STRICT_INDEX", "Yes").unwrap());
/// assert!(!parse_flag("KSM_STRICT_INDEX", "0").unwrap());
/// assert!(parse_flag("KSM_STRICT_INDEX", "maybe").is_err());
/// ```
pub fn parse_flag(key: &str, raw: &str) -> Result<bool, CommonError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(CommonError::invalid_config(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}
