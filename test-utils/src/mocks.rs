//! Mock implementations for testing.
//!
//! [`MockVaultClient`] serves records from memory and answers native
//! notation lookups the way a vault SDK does: it refuses references that
//! match several records. [`RecordingAuditSink`] keeps every audit event.

use ksm_common::{AuditEvent, AuditEventType, AuditSink};
use ksm_core::notation::{parse, Target};
use ksm_core::provider::{ClientError, NativeField, VaultClient};
use ksm_core::record::{Record, RecordField};
use std::sync::{Mutex, PoisonError};

/// In-memory vault client.
#[derive(Debug, Default)]
pub struct MockVaultClient {
    records: Vec<Record>,
    failure: Option<ClientError>,
    native_calls: Mutex<Vec<String>>,
}

impl MockVaultClient {
    /// Create a client serving `records` in the given order.
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Add a record.
    #[must_use]
    pub fn with_record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    /// Make every call fail with `error`.
    #[must_use]
    pub fn failing(mut self, error: ClientError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Notations passed to [`VaultClient::resolve_notation`] so far.
    pub fn native_calls(&self) -> Vec<String> {
        self.native_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check_failure(&self) -> Result<(), ClientError> {
        self.failure.clone().map_or(Ok(()), Err)
    }
}

fn find_field<'a>(record: &'a Record, target: &Target) -> Option<&'a RecordField> {
    match target {
        Target::Field(selector) => record.standard_field(&selector.name),
        Target::CustomField(selector) => record
            .custom_field_by_label(&selector.name)
            .or_else(|| record.custom_field_by_type(&selector.name)),
        Target::File(_) => None,
    }
}

impl VaultClient for MockVaultClient {
    fn fetch_records_by_uid(&self, uids: &[String]) -> Result<Vec<Record>, ClientError> {
        self.check_failure()?;
        Ok(self
            .records
            .iter()
            .filter(|r| uids.contains(&r.uid))
            .cloned()
            .collect())
    }

    fn fetch_all_records(&self) -> Result<Vec<Record>, ClientError> {
        self.check_failure()?;
        Ok(self.records.clone())
    }

    fn resolve_notation(&self, notation: &str) -> Result<NativeField, ClientError> {
        self.native_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notation.to_string());
        self.check_failure()?;

        let locator = parse(notation).map_err(|e| ClientError::Backend(e.to_string()))?;
        let matching: Vec<&Record> = self
            .records
            .iter()
            .filter(|r| locator.record.matches(r))
            .collect();
        let record = match matching.as_slice() {
            [] => return Err(ClientError::record_not_found(locator.record.as_str())),
            [record] => *record,
            _ => return Err(ClientError::Ambiguous(locator.record.as_str().to_string())),
        };

        let field = find_field(record, &locator.target)
            .ok_or_else(|| ClientError::not_found(notation))?;
        let mut values = match locator.index() {
            Some(index) => field.value.get(index).cloned().into_iter().collect(),
            None => field.value.clone(),
        };
        if let Some(property) = locator.property() {
            values = values
                .first()
                .and_then(|v| v.get(property))
                .cloned()
                .into_iter()
                .collect();
        }
        if values.is_empty() {
            return Err(ClientError::not_found(notation));
        }
        Ok(NativeField {
            field_type: field.field_type.clone(),
            label: field.label().map(str::to_string),
            values,
        })
    }
}

/// Audit sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Event types in recording order.
    pub fn event_types(&self) -> Vec<AuditEventType> {
        self.events().iter().map(|e| e.event_type).collect()
    }

    /// Number of recorded events.
    pub fn count(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Forget all events.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
