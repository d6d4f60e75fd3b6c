//! Shared test utilities for the KSM notation libraries.
//!
//! This crate provides:
//! - Proptest generators for locators, attack strings and secret values
//! - An in-memory vault client and a recording audit sink
//! - Fixture records covering the common record types

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
pub use mocks::{MockVaultClient, RecordingAuditSink};
