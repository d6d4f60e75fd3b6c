//! Shared plumbing for the KSM notation libraries.
//!
//! This crate provides:
//! - The common error type and flag parsing used by configuration loaders
//! - Tracing subscriber initialization
//! - Audit event model and sinks

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod error;
pub mod tracing_config;

pub use audit::{AuditEvent, AuditEventType, AuditLevel, AuditSink, NullAuditSink, TracingAuditSink};
pub use error::CommonError;
pub use tracing_config::{init_tracing, TracingConfig};
