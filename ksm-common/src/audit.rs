//! Audit events for notation access.
//!
//! The notation core reports access attempts, failures and system notices to
//! an [`AuditSink`]. Sinks never influence outcomes: the default
//! [`NullAuditSink`] drops everything, and [`TracingAuditSink`] forwards
//! events to the local `tracing` subscriber.
//!
//! Events carry locators, uids and field names, never field values.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::CommonError;

/// Audit severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditLevel {
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warning level
    Warn,
    /// Error level
    Error,
}

impl AuditLevel {
    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

/// Kind of audited event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A caller asked for a value
    AccessAttempt,
    /// A value was returned
    AccessGranted,
    /// Input was rejected or the target could not be resolved
    AccessDenied,
    /// Unexpected failure from a collaborator
    Error,
    /// Informational notice (fallback paths, configuration)
    System,
}

impl AuditEventType {
    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AccessAttempt => "access_attempt",
            Self::AccessGranted => "access_granted",
            Self::AccessDenied => "access_denied",
            Self::Error => "error",
            Self::System => "system",
        }
    }
}

/// A single audit event.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Unique event id
    pub id: Uuid,
    /// Event kind
    pub event_type: AuditEventType,
    /// Severity
    pub level: AuditLevel,
    /// Human-readable message
    pub message: String,
    /// Emitting service identifier
    pub service_id: String,
    /// Additional metadata
    pub metadata: BTreeMap<String, String>,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Create a new audit event.
    #[must_use]
    pub fn new(
        event_type: AuditEventType,
        level: AuditLevel,
        message: impl Into<String>,
        service_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            level,
            message: message.into(),
            service_id: service_id.into(),
            metadata: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Access attempt for the given target.
    #[must_use]
    pub fn access_attempt(service_id: &str, target: &str) -> Self {
        Self::new(
            AuditEventType::AccessAttempt,
            AuditLevel::Info,
            "Secret access requested",
            service_id,
        )
        .with_metadata("target", target)
    }

    /// Access granted for the given target.
    #[must_use]
    pub fn access_granted(service_id: &str, target: &str, unmasked: bool) -> Self {
        Self::new(
            AuditEventType::AccessGranted,
            AuditLevel::Info,
            "Secret access granted",
            service_id,
        )
        .with_metadata("target", target)
        .with_metadata("unmasked", unmasked.to_string())
    }

    /// Access denied for the given target.
    #[must_use]
    pub fn access_denied(service_id: &str, target: &str, reason: impl Into<String>) -> Self {
        Self::new(
            AuditEventType::AccessDenied,
            AuditLevel::Warn,
            "Secret access denied",
            service_id,
        )
        .with_metadata("target", target)
        .with_metadata("reason", reason)
    }

    /// Collaborator failure.
    #[must_use]
    pub fn error(service_id: &str, message: impl Into<String>) -> Self {
        Self::new(AuditEventType::Error, AuditLevel::Error, message, service_id)
    }

    /// System notice.
    #[must_use]
    pub fn system(service_id: &str, message: impl Into<String>) -> Self {
        Self::new(AuditEventType::System, AuditLevel::Info, message, service_id)
    }

    /// Add metadata.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Serialize the event as a single JSON line.
    ///
    /// # Errors
    ///
    /// Returns [`CommonError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String, CommonError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Receiver of audit events.
pub trait AuditSink: Send + Sync {
    /// Record an event. Must not block the caller on I/O failures.
    fn record(&self, event: &AuditEvent);
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: &AuditEvent) {}
}

/// Sink that writes events to the local tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        let event_type = event.event_type.as_str();
        let locator = event.metadata.get("target").map_or("-", String::as_str);

        match event.level {
            AuditLevel::Debug => debug!(
                event_id = %event.id,
                event_type,
                locator,
                service = %event.service_id,
                "{}",
                event.message
            ),
            AuditLevel::Info => info!(
                event_id = %event.id,
                event_type,
                locator,
                service = %event.service_id,
                "{}",
                event.message
            ),
            AuditLevel::Warn => warn!(
                event_id = %event.id,
                event_type,
                locator,
                service = %event.service_id,
                reason = event.metadata.get("reason").map_or("-", String::as_str),
                "{}",
                event.message
            ),
            AuditLevel::Error => error!(
                event_id = %event.id,
                event_type,
                locator,
                service = %event.service_id,
                "{}",
                event.message
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = AuditEvent::access_granted("ksm", "UID/field/password", false)
            .with_metadata("record_uid", "abc");

        assert_eq!(event.event_type, AuditEventType::AccessGranted);
        assert_eq!(event.level, AuditLevel::Info);
        assert_eq!(event.service_id, "ksm");
        assert_eq!(event.metadata.get("target"), Some(&"UID/field/password".to_string()));
        assert_eq!(event.metadata.get("unmasked"), Some(&"false".to_string()));
        assert_eq!(event.metadata.get("record_uid"), Some(&"abc".to_string()));
    }

    #[test]
    fn test_denied_is_warn() {
        let event = AuditEvent::access_denied("ksm", "x", "field not found");
        assert_eq!(event.level, AuditLevel::Warn);
        assert_eq!(event.metadata.get("reason"), Some(&"field not found".to_string()));
    }

    #[test]
    fn test_event_ids_unique() {
        let a = AuditEvent::system("ksm", "one");
        let b = AuditEvent::system("ksm", "one");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_to_json() {
        let json = AuditEvent::error("ksm", "vault unavailable").to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["event_type"], "error");
        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["message"], "vault unavailable");
    }

    #[test]
    fn test_sinks_accept_events() {
        let event = AuditEvent::access_attempt("ksm", "x");
        NullAuditSink.record(&event);
        TracingAuditSink.record(&event);
    }

    #[test]
    fn test_level_as_str() {
        assert_eq!(AuditLevel::Debug.as_str(), "DEBUG");
        assert_eq!(AuditLevel::Info.as_str(), "INFO");
        assert_eq!(AuditLevel::Warn.as_str(), "WARN");
        assert_eq!(AuditLevel::Error.as_str(), "ERROR");
    }
}
