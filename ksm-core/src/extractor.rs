//! Field extraction from records.
//!
//! [`FieldExtractor`] walks a [`Record`], finds the addressed field, decodes
//! it through [`crate::shapes`] and masks it. Extraction never fails because
//! of one bad field: bulk operations skip it, single lookups report
//! [`KsmError::FieldNotFound`].

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::catalog;
use crate::config::ResolverConfig;
use crate::error::{KsmError, KsmResult};
use crate::masking::{is_sensitive, mask_unless};
use crate::notation::{FieldSelector, Locator, Target};
use crate::provider::NativeField;
use crate::record::{Record, RecordField};
use crate::shapes::{self, FieldValue, FileMetadata, ShapeKind};

/// Everything extractable from one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedRecord {
    /// Record uid
    pub uid: String,
    /// Record title
    pub title: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: String,
    /// Standard fields keyed by type
    pub fields: BTreeMap<String, FieldValue>,
    /// Custom fields keyed by label (type when unlabeled)
    pub custom: BTreeMap<String, FieldValue>,
    /// Notes, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Attachment metadata
    pub files: Vec<FileMetadata>,
}

/// Locates, decodes and masks field values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldExtractor {
    strict_index: bool,
}

impl FieldExtractor {
    /// Extractor with index fallback to element 0.
    #[must_use]
    pub const fn new() -> Self {
        Self { strict_index: false }
    }

    /// Extractor matching a resolver configuration.
    #[must_use]
    pub const fn from_config(config: &ResolverConfig) -> Self {
        Self {
            strict_index: config.strict_index,
        }
    }

    /// Treat out-of-range indices as "not found".
    #[must_use]
    pub const fn with_strict_index(mut self, strict: bool) -> Self {
        self.strict_index = strict;
        self
    }

    /// Extract every catalogued field, custom field, the notes and the file
    /// metadata. Missing or malformed fields are left out.
    #[must_use]
    pub fn extract_all(&self, record: &Record, unmask: bool) -> ExtractedRecord {
        let mut fields = BTreeMap::new();
        for field_type in catalog::field_types_for(&record.record_type) {
            if fields.contains_key(*field_type) {
                continue;
            }
            let Some(field) = record.standard_field(field_type) else {
                continue;
            };
            if let Some(value) = decode_or_skip(field, &field.value, unmask) {
                fields.insert((*field_type).to_string(), value);
            }
        }

        let mut custom = BTreeMap::new();
        for field in &record.custom {
            let key = field.display_name();
            if custom.contains_key(key) {
                continue;
            }
            if let Some(value) = decode_or_skip(field, &field.value, unmask) {
                custom.insert(key.to_string(), value);
            }
        }

        debug!(
            record_type = %record.record_type,
            fields = fields.len(),
            custom = custom.len(),
            "extracted record"
        );

        ExtractedRecord {
            uid: record.uid.clone(),
            title: record.title.clone(),
            record_type: record.record_type.clone(),
            fields,
            custom,
            notes: (!record.notes.is_empty()).then(|| record.notes.clone()),
            files: record.files.iter().map(FileMetadata::from).collect(),
        }
    }

    /// Extract one field by name.
    ///
    /// `notes` and `password` are answered from the record directly; then
    /// standard fields by type, custom fields by type, and finally any field
    /// whose label equals `name`. Every field goes through the same decoder,
    /// so its declared type and its label both decide masking.
    #[must_use]
    pub fn extract_field(&self, record: &Record, name: &str, unmask: bool) -> Option<FieldValue> {
        match name {
            "notes" => {
                return (!record.notes.is_empty()).then(|| FieldValue::Text(record.notes.clone()));
            }
            "password" => {
                if let Some(password) = record.password() {
                    return Some(FieldValue::Text(mask_unless(password, unmask)));
                }
            }
            _ => {}
        }

        let typed = record
            .standard_field(name)
            .or_else(|| record.custom_field_by_type(name))
            .and_then(|field| decode_or_skip(field, &field.value, unmask));
        if typed.is_some() {
            return typed;
        }

        record
            .field_by_label(name)
            .and_then(|field| decode_or_skip(field, &field.value, unmask))
    }

    /// Extract several fields by name. Names that resolve to nothing are
    /// absent from the result.
    #[must_use]
    pub fn extract_fields(
        &self,
        record: &Record,
        names: &[&str],
        unmask: bool,
    ) -> BTreeMap<String, FieldValue> {
        names
            .iter()
            .filter_map(|name| {
                self.extract_field(record, name, unmask)
                    .map(|value| ((*name).to_string(), value))
            })
            .collect()
    }

    /// Resolve a parsed locator against a record.
    ///
    /// # Errors
    ///
    /// [`KsmError::FieldNotFound`] when the field, element, property or file
    /// does not exist or its value cannot be decoded.
    pub fn extract_locator(
        &self,
        record: &Record,
        locator: &Locator,
        unmask: bool,
    ) -> KsmResult<FieldValue> {
        match &locator.target {
            Target::File(name) => record
                .file(name)
                .map(|file| FieldValue::File(file.into()))
                .ok_or_else(|| KsmError::field_not_found(name)),
            Target::Field(selector) => {
                let field = record
                    .standard_field(&selector.name)
                    .or_else(|| record.standard_field_by_label(&selector.name))
                    .or_else(|| record.custom_field_by_type(&selector.name))
                    .or_else(|| record.custom_field_by_label(&selector.name));
                self.select(field, selector, unmask)
            }
            Target::CustomField(selector) => {
                let field = record
                    .custom_field_by_label(&selector.name)
                    .or_else(|| record.custom_field_by_type(&selector.name))
                    .or_else(|| record.standard_field(&selector.name))
                    .or_else(|| record.standard_field_by_label(&selector.name));
                self.select(field, selector, unmask)
            }
        }
    }

    /// Decode a field returned by a vault client's own notation lookup.
    ///
    /// The client has already applied index and property, so the values
    /// are the addressed element (or sub-property) itself. They are decoded
    /// under the type and label the client reports, never the notation's
    /// field name, so masking matches the record path. A sub-property of a
    /// structured field is wrapped back into its shape before decoding.
    ///
    /// # Errors
    ///
    /// [`KsmError::FieldNotFound`] for an empty or undecodable result, or a
    /// property the field's shape does not carry.
    pub fn decode_native(
        &self,
        locator: &Locator,
        native: &NativeField,
        unmask: bool,
    ) -> KsmResult<FieldValue> {
        let Some(selector) = locator.selector() else {
            return Err(KsmError::field_not_found(locator.file_name().unwrap_or_default()));
        };
        let field_type = native.field_type.as_str();
        let label = native.label.as_deref();

        let Some(property) = selector.property.as_deref() else {
            return shapes::decode(field_type, label, &native.values, unmask)
                .map_err(|e| not_found(selector, &e));
        };
        let first = native
            .values
            .first()
            .ok_or_else(|| KsmError::field_not_found(&selector.name))?;

        if shapes::shape_of(field_type) != ShapeKind::Scalar {
            let mut object = Map::new();
            object.insert(property.to_string(), first.clone());
            let decoded = shapes::decode(field_type, label, &[Value::Object(object)], unmask)
                .map_err(|e| not_found(selector, &e))?;
            return decoded.property(property).ok_or_else(|| {
                KsmError::field_not_found(format!("{}[{property}]", selector.name))
            });
        }

        match first {
            Value::Null => Err(KsmError::field_not_found(&selector.name)),
            Value::Bool(b) => Ok(FieldValue::Bool(*b)),
            other => {
                let text = shapes::coerce_to_string(other).unwrap_or_default();
                let sensitive = is_sensitive(property)
                    || is_sensitive(field_type)
                    || label.is_some_and(is_sensitive);
                Ok(FieldValue::Text(if sensitive {
                    mask_unless(&text, unmask)
                } else {
                    text
                }))
            }
        }
    }

    fn select(
        &self,
        field: Option<&RecordField>,
        selector: &FieldSelector,
        unmask: bool,
    ) -> KsmResult<FieldValue> {
        let field = field.ok_or_else(|| KsmError::field_not_found(&selector.name))?;

        let values = match selector.index {
            None => field.value.as_slice(),
            Some(index) if index < field.value.len() => &field.value[index..=index],
            Some(index) if self.strict_index => {
                return Err(KsmError::field_not_found(format!("{}[{index}]", selector.name)));
            }
            Some(index) => {
                debug!(field = %selector.name, index, "index out of range, using first element");
                &field.value[..field.value.len().min(1)]
            }
        };

        let value = shapes::decode(&field.field_type, field.label(), values, unmask)
            .map_err(|e| not_found(selector, &e))?;

        match selector.property.as_deref() {
            None => Ok(value),
            Some(property) => value.property(property).ok_or_else(|| {
                KsmError::field_not_found(format!("{}[{property}]", selector.name))
            }),
        }
    }
}

fn decode_or_skip(field: &RecordField, values: &[Value], unmask: bool) -> Option<FieldValue> {
    match shapes::decode(&field.field_type, field.label(), values, unmask) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(field_type = %field.field_type, error = %e, "skipping field");
            None
        }
    }
}

fn not_found(selector: &FieldSelector, error: &KsmError) -> KsmError {
    debug!(field = %selector.name, %error, "field value not usable");
    KsmError::field_not_found(&selector.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::parse;
    use crate::record::FileAttachment;
    use serde_json::json;

    const UID: &str = "UID1234567890123456";

    fn login() -> Record {
        Record::new(UID, "Prod Login", "login")
            .with_field(RecordField::new("login", vec![json!("admin")]))
            .with_field(RecordField::new("password", vec![json!("hunter2hunter2")]))
            .with_field(RecordField::new(
                "url",
                vec![json!("https://a.example"), json!("https://b.example")],
            ))
            .with_custom(RecordField::new("text", vec![json!("eu-west-1")]).with_label("Region"))
            .with_custom(RecordField::new("text", vec![json!("tok_abcdef123")]).with_label("API Token"))
            .with_custom(
                RecordField::new("phone", vec![json!({"region": "US", "number": "555-0100"})])
                    .with_label("Support"),
            )
            .with_custom(RecordField::new("password", vec![json!("db-pass-0042")]).with_label("DB Creds"))
            .with_notes("rotate monthly")
            .with_file(FileAttachment {
                uid: "F1".into(),
                name: "id_rsa.pub".into(),
                title: "Public key".into(),
                size: 400,
                mime_type: "text/plain".into(),
            })
    }

    fn locate(notation: &str, unmask: bool) -> KsmResult<FieldValue> {
        FieldExtractor::new().extract_locator(&login(), &parse(notation).unwrap(), unmask)
    }

    #[test]
    fn test_extract_all() {
        let extracted = FieldExtractor::new().extract_all(&login(), false);
        assert_eq!(extracted.fields["login"], FieldValue::Text("admin".into()));
        assert_eq!(extracted.fields["password"], FieldValue::Text("hun***er2".into()));
        assert_eq!(extracted.fields["url"], FieldValue::Text("https://a.example".into()));
        assert_eq!(extracted.custom["Region"], FieldValue::Text("eu-west-1".into()));
        assert_eq!(extracted.custom["API Token"], FieldValue::Text("tok***123".into()));
        assert!(matches!(extracted.custom["Support"], FieldValue::Phone(_)));
        assert_eq!(extracted.notes.as_deref(), Some("rotate monthly"));
        assert_eq!(extracted.files[0].name, "id_rsa.pub");
    }

    #[test]
    fn test_extract_all_skips_malformed() {
        let record = Record::new(UID, "Broken", "contact")
            .with_field(RecordField::new("phone", vec![json!("not an object")]))
            .with_field(RecordField::new("email", vec![]))
            .with_field(RecordField::new("name", vec![json!({"first": "Ada"})]));
        let extracted = FieldExtractor::new().extract_all(&record, false);
        assert_eq!(extracted.fields.len(), 1);
        assert!(extracted.fields.contains_key("name"));
        assert!(extracted.notes.is_none());
    }

    #[test]
    fn test_extract_all_unknown_type_uses_fallback() {
        let record = Record::new(UID, "Odd", "quantumVault")
            .with_field(RecordField::new("login", vec![json!("svc")]))
            .with_field(RecordField::new("schedule", vec![json!({"type": "DAILY"})]))
            .with_field(RecordField::new("mysteryType", vec![json!("ignored")]));
        let extracted = FieldExtractor::new().extract_all(&record, false);
        assert!(extracted.fields.contains_key("login"));
        assert!(extracted.fields.contains_key("schedule"));
        assert!(!extracted.fields.contains_key("mysteryType"));
    }

    #[test]
    fn test_extract_field_shortcuts() {
        let extractor = FieldExtractor::new();
        let record = login();
        assert_eq!(
            extractor.extract_field(&record, "notes", false),
            Some(FieldValue::Text("rotate monthly".into()))
        );
        assert_eq!(
            extractor.extract_field(&record, "password", false),
            Some(FieldValue::Text("hun***er2".into()))
        );
        assert_eq!(
            extractor.extract_field(&record, "password", true),
            Some(FieldValue::Text("hunter2hunter2".into()))
        );
        assert_eq!(
            extractor.extract_field(&record, "API Token", false),
            Some(FieldValue::Text("tok***123".into()))
        );
        assert_eq!(extractor.extract_field(&record, "missing", false), None);
        assert!(matches!(
            extractor.extract_field(&record, "Support", false),
            Some(FieldValue::Phone(_))
        ));
        assert_eq!(
            extractor.extract_field(&Record::new(UID, "t", "login"), "notes", false),
            None
        );
    }

    #[test]
    fn test_extract_field_by_label_masks_by_type() {
        let extractor = FieldExtractor::new();
        let record = login();
        assert_eq!(
            extractor.extract_field(&record, "DB Creds", false),
            Some(FieldValue::Text("db-***042".into()))
        );
        assert_eq!(
            extractor.extract_field(&record, "DB Creds", true),
            Some(FieldValue::Text("db-pass-0042".into()))
        );
        assert_eq!(
            extractor.extract_all(&record, false).custom["DB Creds"],
            FieldValue::Text("db-***042".into())
        );
    }

    #[test]
    fn test_extract_fields_drops_missing() {
        let found = FieldExtractor::new().extract_fields(&login(), &["login", "Region", "nope"], false);
        assert_eq!(found.len(), 2);
        assert_eq!(found["Region"], FieldValue::Text("eu-west-1".into()));
    }

    #[test]
    fn test_locator_field_and_index() {
        assert_eq!(locate("UID1234567890123456/field/login", false).unwrap(), FieldValue::Text("admin".into()));
        assert_eq!(
            locate("UID1234567890123456/field/url[1]", false).unwrap(),
            FieldValue::Text("https://b.example".into())
        );
        assert_eq!(
            locate("UID1234567890123456/field/url[9]", false).unwrap(),
            FieldValue::Text("https://a.example".into())
        );
    }

    #[test]
    fn test_strict_index() {
        let extractor = FieldExtractor::new().with_strict_index(true);
        let err = extractor
            .extract_locator(&login(), &parse("UID1234567890123456/field/url[9]").unwrap(), false)
            .unwrap_err();
        assert!(matches!(err, KsmError::FieldNotFound(_)));
    }

    #[test]
    fn test_locator_custom_field_and_property() {
        assert_eq!(
            locate("UID1234567890123456/custom_field/Support[number]", false).unwrap(),
            FieldValue::Text("555-0100".into())
        );
        assert_eq!(
            locate("UID1234567890123456/custom_field/Support[0][region]", false).unwrap(),
            FieldValue::Text("US".into())
        );
        assert!(matches!(
            locate("UID1234567890123456/custom_field/Support[ext]", false),
            Err(KsmError::FieldNotFound(_))
        ));
        assert_eq!(
            locate("UID1234567890123456/custom_field/API Token", true).unwrap(),
            FieldValue::Text("tok_abcdef123".into())
        );
    }

    #[test]
    fn test_field_kind_falls_back_to_custom() {
        assert_eq!(
            locate("UID1234567890123456/field/Region", false).unwrap(),
            FieldValue::Text("eu-west-1".into())
        );
        assert_eq!(
            locate("UID1234567890123456/custom_field/login", false).unwrap(),
            FieldValue::Text("admin".into())
        );
    }

    #[test]
    fn test_locator_file() {
        let FieldValue::File(meta) = locate("UID1234567890123456/file/Public key", false).unwrap() else {
            panic!("expected file metadata");
        };
        assert_eq!(meta.size, 400);
        assert!(matches!(
            locate("UID1234567890123456/file/missing.txt", false),
            Err(KsmError::FieldNotFound(_))
        ));
    }

    #[test]
    fn test_missing_field() {
        assert!(matches!(
            locate("UID1234567890123456/field/oneTimeCode", false),
            Err(KsmError::FieldNotFound(_))
        ));
    }

    #[test]
    fn test_decode_native_scalar_and_property() {
        let extractor = FieldExtractor::new();
        let locator = parse("UID1234567890123456/field/password").unwrap();
        assert_eq!(
            extractor
                .decode_native(&locator, &NativeField::new("password", vec![json!("hunter2hunter2")]), false)
                .unwrap(),
            FieldValue::Text("hun***er2".into())
        );

        let locator = parse("Card/field/paymentCard[cardSecurityCode]").unwrap();
        assert_eq!(
            extractor
                .decode_native(&locator, &NativeField::new("paymentCard", vec![json!("123")]), false)
                .unwrap(),
            FieldValue::Text("******".into())
        );
        let locator = parse("Card/field/paymentCard[cardExpirationDate]").unwrap();
        assert_eq!(
            extractor
                .decode_native(&locator, &NativeField::new("paymentCard", vec![json!("12/25")]), false)
                .unwrap(),
            FieldValue::Text("12/25".into())
        );

        let locator = parse("Box/field/securityQuestion[answer]").unwrap();
        assert_eq!(
            extractor
                .decode_native(&locator, &NativeField::new("securityQuestion", vec![json!("blue-whale")]), false)
                .unwrap(),
            FieldValue::Text("blu***ale".into())
        );

        let locator = parse("Box/field/url").unwrap();
        assert!(matches!(
            extractor.decode_native(&locator, &NativeField::new("url", vec![]), false),
            Err(KsmError::FieldNotFound(_))
        ));
    }

    #[test]
    fn test_decode_native_uses_reported_type_and_label() {
        let extractor = FieldExtractor::new();
        let card = json!({
            "cardNumber": "4111111111111111",
            "cardExpirationDate": "12/25",
            "cardSecurityCode": "987"
        });

        let locator = parse("Ops/custom_field/Corporate Card").unwrap();
        let native = NativeField::new("paymentCard", vec![card]).with_label("Corporate Card");
        let FieldValue::PaymentCard(decoded) = extractor.decode_native(&locator, &native, false).unwrap() else {
            panic!("expected a payment card");
        };
        assert_eq!(decoded.card_number.as_deref(), Some("411***111"));
        assert_eq!(decoded.card_security_code.as_deref(), Some("******"));

        let locator = parse("Ops/custom_field/Corporate Card[cardSecurityCode]").unwrap();
        let native = NativeField::new("paymentCard", vec![json!("987")]).with_label("Corporate Card");
        assert_eq!(
            extractor.decode_native(&locator, &native, false).unwrap(),
            FieldValue::Text("******".into())
        );

        let locator = parse("Ops/custom_field/DB Creds").unwrap();
        let native = NativeField::new("password", vec![json!("hunter2hunter2")]).with_label("DB Creds");
        assert_eq!(
            extractor.decode_native(&locator, &native, false).unwrap(),
            FieldValue::Text("hun***er2".into())
        );

        let locator = parse("Ops/field/text").unwrap();
        let native = NativeField::new("text", vec![json!("ghp_0123456789abcdef")]).with_label("API Token");
        assert_eq!(
            extractor.decode_native(&locator, &native, false).unwrap(),
            FieldValue::Text("ghp***def".into())
        );
    }

    #[test]
    fn test_decode_native_unknown_property_of_shape() {
        let locator = parse("Ops/custom_field/Corporate Card[pin]").unwrap();
        let native = NativeField::new("paymentCard", vec![json!("4242")]).with_label("Corporate Card");
        assert!(matches!(
            FieldExtractor::new().decode_native(&locator, &native, false),
            Err(KsmError::FieldNotFound(_))
        ));
    }
}
