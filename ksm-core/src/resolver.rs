//! Notation resolution against a vault client, with audit events.

use ksm_common::{AuditEvent, AuditSink, NullAuditSink};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::ResolverConfig;
use crate::error::{KsmError, KsmResult};
use crate::extractor::{ExtractedRecord, FieldExtractor};
use crate::notation::{Locator, LocatorKind};
use crate::provider::{ClientError, VaultClient};
use crate::record::Record;
use crate::shapes::FieldValue;
use crate::validation::{truncate, InputValidator};

/// Longest notation or query echoed into an audit event.
const AUDIT_TARGET_MAX_CHARS: usize = 256;

/// Search hit. Carries no field values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    /// Record uid
    pub uid: String,
    /// Record title
    pub title: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: String,
}

impl From<&Record> for RecordSummary {
    fn from(record: &Record) -> Self {
        Self {
            uid: record.uid.clone(),
            title: record.title.clone(),
            record_type: record.record_type.clone(),
        }
    }
}

/// Validates, parses and resolves notations through a [`VaultClient`].
pub struct NotationResolver<C: VaultClient> {
    client: C,
    extractor: FieldExtractor,
    config: ResolverConfig,
    audit: Arc<dyn AuditSink>,
}

impl<C: VaultClient> NotationResolver<C> {
    /// Create a resolver with a no-op audit sink.
    #[must_use]
    pub fn new(client: C, config: ResolverConfig) -> Self {
        Self {
            client,
            extractor: FieldExtractor::from_config(&config),
            config,
            audit: Arc::new(NullAuditSink),
        }
    }

    /// Send audit events to `sink`.
    #[must_use]
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Underlying client.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Active configuration.
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a notation to a decoded, masked value.
    ///
    /// The client's own lookup is tried first. When it reports several
    /// records behind the reference, every record is fetched and the first
    /// match in enumeration order wins.
    ///
    /// # Errors
    ///
    /// Validation and grammar failures, [`KsmError::RecordNotFound`],
    /// [`KsmError::FieldNotFound`] and client failures.
    #[instrument(skip(self), fields(service = %self.config.service_id))]
    pub fn resolve(&self, notation: &str, unmask: bool) -> KsmResult<FieldValue> {
        let target = truncate(notation, AUDIT_TARGET_MAX_CHARS);
        self.emit(AuditEvent::access_attempt(&self.config.service_id, &target));
        let result = self.resolve_inner(notation, unmask);
        self.emit_outcome(&target, unmask, &result);
        result
    }

    fn resolve_inner(&self, notation: &str, unmask: bool) -> KsmResult<FieldValue> {
        InputValidator::validate_ksm_notation(notation)?;
        let locator: Locator = notation.parse()?;

        if locator.kind() == LocatorKind::File {
            // File content never leaves the core, only metadata from the record.
            return self.resolve_from_records(&locator, unmask);
        }

        match self.client.resolve_notation(notation).map_err(native_error) {
            Ok(native) => {
                debug!(
                    field_type = %native.field_type,
                    values = native.values.len(),
                    "native lookup succeeded"
                );
                self.extractor.decode_native(&locator, &native, unmask)
            }
            Err(KsmError::AmbiguousRecord(reason)) => {
                info!(%reason, "ambiguous record reference, resolving manually");
                self.resolve_from_records(&locator, unmask)
            }
            Err(e) => Err(e),
        }
    }

    fn resolve_from_records(&self, locator: &Locator, unmask: bool) -> KsmResult<FieldValue> {
        let records = self.client.fetch_all_records()?;
        let record = records
            .iter()
            .find(|r| locator.record.uid() == Some(r.uid.as_str()))
            .or_else(|| records.iter().find(|r| locator.record.matches(r)))
            .ok_or_else(|| KsmError::record_not_found(locator.record.as_str()))?;
        debug!(uid = %record.uid, candidates = records.len(), "selected record");
        self.extractor.extract_locator(record, locator, unmask)
    }

    /// Extract every field of one record.
    ///
    /// # Errors
    ///
    /// Invalid uid, [`KsmError::RecordNotFound`] and client failures.
    #[instrument(skip(self), fields(service = %self.config.service_id))]
    pub fn extract_record(&self, uid: &str, unmask: bool) -> KsmResult<ExtractedRecord> {
        let target = truncate(uid, AUDIT_TARGET_MAX_CHARS);
        self.emit(AuditEvent::access_attempt(&self.config.service_id, &target));
        let result = self
            .fetch_record(uid)
            .map(|record| self.extractor.extract_all(&record, unmask));
        self.emit_outcome(&target, unmask, &result);
        result
    }

    /// Extract named fields of one record. Names that resolve to nothing
    /// are absent from the result.
    ///
    /// # Errors
    ///
    /// Invalid uid or field name, [`KsmError::RecordNotFound`] and client
    /// failures.
    #[instrument(skip(self), fields(service = %self.config.service_id))]
    pub fn extract_fields(
        &self,
        uid: &str,
        names: &[&str],
        unmask: bool,
    ) -> KsmResult<BTreeMap<String, FieldValue>> {
        let target = truncate(uid, AUDIT_TARGET_MAX_CHARS);
        self.emit(
            AuditEvent::access_attempt(&self.config.service_id, &target)
                .with_metadata("fields", names.len().to_string()),
        );
        let result = names
            .iter()
            .try_for_each(|name| InputValidator::validate_title(name))
            .map_err(KsmError::from)
            .and_then(|()| self.fetch_record(uid))
            .map(|record| self.extractor.extract_fields(&record, names, unmask));
        self.emit_outcome(&target, unmask, &result);
        result
    }

    fn fetch_record(&self, uid: &str) -> KsmResult<Record> {
        InputValidator::validate_uid(uid)?;
        self.client
            .fetch_records_by_uid(&[uid.to_string()])?
            .into_iter()
            .find(|r| r.uid == uid)
            .ok_or_else(|| KsmError::record_not_found(uid))
    }

    /// Records whose title contains `query`, case-insensitively.
    ///
    /// # Errors
    ///
    /// Rejected queries and client failures.
    #[instrument(skip(self), fields(service = %self.config.service_id))]
    pub fn search(&self, query: &str) -> KsmResult<Vec<RecordSummary>> {
        let target = truncate(query, AUDIT_TARGET_MAX_CHARS);
        if let Err(reason) = InputValidator::validate_search_query(query) {
            warn!(%reason, "search query rejected");
            self.emit(AuditEvent::access_denied(
                &self.config.service_id,
                &target,
                reason.to_string(),
            ));
            return Err(reason.into());
        }

        let needle = query.to_lowercase();
        let hits: Vec<RecordSummary> = self
            .client
            .fetch_all_records()?
            .iter()
            .filter(|r| r.title.to_lowercase().contains(&needle))
            .map(RecordSummary::from)
            .collect();
        debug!(hits = hits.len(), "search complete");
        self.emit(
            AuditEvent::system(&self.config.service_id, "record search")
                .with_metadata("hits", hits.len().to_string()),
        );
        Ok(hits)
    }

    fn emit(&self, event: AuditEvent) {
        if self.config.audit_enabled {
            self.audit.record(&event);
        }
    }

    fn emit_outcome<T>(&self, target: &str, unmask: bool, result: &KsmResult<T>) {
        let service = &self.config.service_id;
        match result {
            Ok(_) => self.emit(AuditEvent::access_granted(service, target, unmask)),
            Err(e) if e.is_not_found() || matches!(e, KsmError::ValidationRejected(_)) => {
                warn!(error = %e, "access denied");
                self.emit(AuditEvent::access_denied(service, target, e.to_string()));
            }
            Err(e) => {
                warn!(error = %e, "resolution failed");
                self.emit(AuditEvent::error(service, e.to_string()));
            }
        }
    }
}

/// Native lookup failures in resolver terms. Ambiguity stays internal.
fn native_error(error: ClientError) -> KsmError {
    match error {
        ClientError::Ambiguous(reason) => KsmError::AmbiguousRecord(reason),
        ClientError::RecordNotFound(reference) => KsmError::RecordNotFound(reference),
        ClientError::NotFound(what) => KsmError::FieldNotFound(what),
        other => KsmError::Client(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::NativeField;
    use crate::record::RecordField;
    use serde_json::json;

    struct FixedClient {
        records: Vec<Record>,
        native: Result<NativeField, ClientError>,
    }

    impl VaultClient for FixedClient {
        fn fetch_records_by_uid(&self, uids: &[String]) -> Result<Vec<Record>, ClientError> {
            Ok(self
                .records
                .iter()
                .filter(|r| uids.contains(&r.uid))
                .cloned()
                .collect())
        }

        fn fetch_all_records(&self) -> Result<Vec<Record>, ClientError> {
            Ok(self.records.clone())
        }

        fn resolve_notation(&self, _notation: &str) -> Result<NativeField, ClientError> {
            self.native.clone()
        }
    }

    fn record(uid: &str, title: &str, password: &str) -> Record {
        Record::new(uid, title, "login")
            .with_field(RecordField::new("password", vec![json!(password)]))
    }

    fn resolver(native: Result<NativeField, ClientError>) -> NotationResolver<FixedClient> {
        NotationResolver::new(
            FixedClient {
                records: vec![
                    record("AAAAAAAAAAAAAAAAAAAA01", "Shared", "first-password"),
                    record("AAAAAAAAAAAAAAAAAAAA02", "Shared", "second-password"),
                ],
                native,
            },
            ResolverConfig::default(),
        )
    }

    #[test]
    fn test_native_fast_path() {
        let value = resolver(Ok(NativeField::new("password", vec![json!("native-password")])))
            .resolve("AAAAAAAAAAAAAAAAAAAA01/field/password", true)
            .unwrap();
        assert_eq!(value, FieldValue::Text("native-password".into()));
    }

    #[test]
    fn test_ambiguous_picks_first_record() {
        let value = resolver(Err(ClientError::Ambiguous("Shared".into())))
            .resolve("Shared/field/password", true)
            .unwrap();
        assert_eq!(value, FieldValue::Text("first-password".into()));
    }

    #[test]
    fn test_ambiguous_without_match() {
        let err = resolver(Err(ClientError::Ambiguous("Other".into())))
            .resolve("Other/field/password", false)
            .unwrap_err();
        assert!(matches!(err, KsmError::RecordNotFound(_)));
    }

    #[test]
    fn test_client_errors_propagate() {
        let err = resolver(Err(ClientError::unavailable("timeout")))
            .resolve("Shared/field/password", false)
            .unwrap_err();
        assert!(err.is_retryable());

        let err = resolver(Err(ClientError::not_found("password")))
            .resolve("Shared/field/password", false)
            .unwrap_err();
        assert!(matches!(err, KsmError::FieldNotFound(_)));

        let err = resolver(Err(ClientError::record_not_found("Nobody")))
            .resolve("Nobody/field/password", false)
            .unwrap_err();
        assert!(matches!(err, KsmError::RecordNotFound(_)));
    }

    #[test]
    fn test_native_error_mapping() {
        assert!(matches!(
            native_error(ClientError::Ambiguous("Shared".into())),
            KsmError::AmbiguousRecord(_)
        ));
        assert!(matches!(
            native_error(ClientError::record_not_found("Nobody")),
            KsmError::RecordNotFound(_)
        ));
        assert!(matches!(
            native_error(ClientError::not_found("Shared/field/url")),
            KsmError::FieldNotFound(_)
        ));
        assert!(native_error(ClientError::unavailable("timeout")).is_retryable());
    }

    #[test]
    fn test_invalid_notation_rejected() {
        let err = resolver(Ok(NativeField::new("password", vec![])))
            .resolve("Shared/field/password; rm -rf /", false)
            .unwrap_err();
        assert!(matches!(err, KsmError::ValidationRejected(_)));
    }

    #[test]
    fn test_extract_record_and_fields() {
        let r = resolver(Ok(NativeField::new("password", vec![])));
        let extracted = r.extract_record("AAAAAAAAAAAAAAAAAAAA02", false).unwrap();
        assert_eq!(extracted.fields["password"], FieldValue::Text("sec***ord".into()));

        let fields = r
            .extract_fields("AAAAAAAAAAAAAAAAAAAA02", &["password", "url"], true)
            .unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["password"], FieldValue::Text("second-password".into()));

        assert!(matches!(
            r.extract_record("ZZZZZZZZZZZZZZZZZZZZ99", false),
            Err(KsmError::RecordNotFound(_))
        ));
        assert!(matches!(
            r.extract_fields("AAAAAAAAAAAAAAAAAAAA02", &["<script>"], false),
            Err(KsmError::ValidationRejected(_))
        ));
    }

    #[test]
    fn test_search() {
        let r = resolver(Ok(NativeField::new("password", vec![])));
        let hits = r.search("shar").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].uid, "AAAAAAAAAAAAAAAAAAAA01");
        assert!(r.search("nothing").unwrap().is_empty());
        assert!(matches!(
            r.search("' OR '1'='1"),
            Err(KsmError::ValidationRejected(_))
        ));
    }
}
