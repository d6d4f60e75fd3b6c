//! Typed decoding of raw field values.
//!
//! Each structured field type has one struct here. [`decode`] looks the
//! declared type up in a static dispatch table and deserializes the raw
//! JSON into the matching [`FieldValue`] variant, applying masking on the
//! way out. Schemas drift between vault versions, so decoding is lenient:
//! unknown keys are ignored, scalar sub-values are coerced to strings and
//! a value that does not fit its shape is reported as
//! [`KsmError::UnsupportedFieldShape`] rather than a hard failure.

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{KsmError, KsmResult};
use crate::masking::{is_sensitive, mask_unless, REDACTED_MARKER};
use crate::record::FileAttachment;

/// Decoded (and possibly masked) field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Scalar coerced to text
    Text(String),
    /// Boolean field (`checkbox`, `isSSIDHidden`)
    Bool(bool),
    /// `paymentCard` / `bankCard`
    PaymentCard(PaymentCard),
    /// `address`
    Address(Address),
    /// `phone`
    Phone(Phone),
    /// `bankAccount`
    BankAccount(BankAccount),
    /// `keyPair`
    KeyPair(KeyPair),
    /// `host` / `pamHostname`
    Host(Host),
    /// `name`
    Name(Name),
    /// `securityQuestion`
    SecurityQuestion(SecurityQuestion),
    /// `pamResources`, every element
    PamResources(Vec<PamResource>),
    /// `pamSettings`
    PamSettings(PamSettings),
    /// `pamRemoteBrowserSettings`
    PamRemoteBrowserSettings(PamRemoteBrowserSettings),
    /// `script`, every element
    Script(Vec<ScriptEntry>),
    /// `passkey`, every element
    Passkey(Vec<Passkey>),
    /// `appFiller`, every element
    AppFiller(Vec<AppFillerEntry>),
    /// `schedule`, every element
    Schedule(Vec<ScheduleEntry>),
    /// File attachment metadata
    File(FileMetadata),
    /// Sub-property that is neither text nor boolean
    Raw(Value),
}

impl FieldValue {
    /// Text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Project onto a named sub-property. List shapes project their first
    /// element. Returns `None` when the property is absent or null.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<Self> {
        let value = serde_json::to_value(self).ok()?;
        let object = match &value {
            Value::Array(items) => items.first()?,
            other => other,
        };
        match object.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Bool(b) => Some(Self::Bool(*b)),
            other => Some(Self::Raw(other.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient scalar handling
// ---------------------------------------------------------------------------

/// Coerce a raw scalar to text: integers without decimals, floats truncated,
/// booleans as `true`/`false`, structures as compact JSON. Null has no text.
#[must_use]
pub fn coerce_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.as_i64().map_or_else(
            || {
                n.as_u64().map_or_else(
                    || format!("{:.0}", n.as_f64().unwrap_or_default().trunc()),
                    |u| u.to_string(),
                )
            },
            |i| i.to_string(),
        )),
        other => Some(other.to_string()),
    }
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.and_then(|v| super::coerce_to_string(&v)))
    }

    pub fn vec_or_single<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
        })
    }

    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(vec_or_single(d)?
            .iter()
            .filter_map(super::coerce_to_string)
            .collect())
    }
}

fn mask_field(field: &mut Option<String>, unmask: bool) {
    if let Some(value) = field.as_mut() {
        *value = mask_unless(value, unmask);
    }
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// Payment card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCard {
    /// Card number (masked)
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    /// Expiration date
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub card_expiration_date: Option<String>,
    /// CVV (masked)
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub card_security_code: Option<String>,
}

/// Postal address. Absent parts stay absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Street line 1
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub street1: Option<String>,
    /// Street line 2
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    /// City
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State or province
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Country
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Postal code
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

/// Phone number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phone {
    /// Region code
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Number
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// Extension
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    /// Mobile, Work, Home...
    #[serde(rename = "type", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub phone_type: Option<String>,
}

/// Bank account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    /// Checking, Savings, Other
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    /// Routing number (masked)
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub routing_number: Option<String>,
    /// Account number (masked)
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// Free-form type when `accountType` is Other
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub other_type: Option<String>,
}

/// SSH or other asymmetric key pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    /// Public key
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Private key (masked)
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

/// Host and port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    /// Host name or address
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    /// Port, as text
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

/// Person name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    /// Given name
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    /// Middle name
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub middle: Option<String>,
    /// Family name
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

/// Security question and answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityQuestion {
    /// Question
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Answer (masked)
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// PAM resource binding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PamResource {
    /// Gateway controller uid
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub controller_uid: Option<String>,
    /// Shared folder uid
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub folder_uid: Option<String>,
    /// Linked record uids
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub resource_ref: Vec<String>,
    /// Allowed connection/rotation settings, passed through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_settings: Option<Value>,
}

/// PAM connection settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PamSettings {
    /// Port-forward definitions
    #[serde(default, deserialize_with = "lenient::vec_or_single")]
    pub port_forward: Vec<Value>,
    /// Connection definitions
    #[serde(default, deserialize_with = "lenient::vec_or_single")]
    pub connection: Vec<Value>,
}

/// Remote browser isolation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PamRemoteBrowserSettings {
    /// Connection definition, passed through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<Value>,
}

/// Rotation or post-action script reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptEntry {
    /// Attached script file uid
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub file_ref: Option<String>,
    /// Command line (masked)
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Records whose credentials the script receives
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub record_ref: Vec<String>,
}

/// WebAuthn passkey.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passkey {
    /// Credential id
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    /// User handle
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Relying party id
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub relying_party: Option<String>,
    /// Account name at the relying party
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Creation timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<Value>,
    /// Signature counter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_count: Option<Value>,
    /// Private key (JWK object); replaced whole by a marker when masked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<Value>,
}

/// Desktop application auto-fill entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppFillerEntry {
    /// Window title to match
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub application_title: Option<String>,
    /// Content filter
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub content_filter: Option<String>,
    /// Keystroke macro (masked)
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub macro_sequence: Option<String>,
}

/// Rotation schedule entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    /// ON_DEMAND, DAILY, CRON...
    #[serde(rename = "type", default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub schedule_type: Option<String>,
    /// Cron expression
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    /// Time of day
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Time zone
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    /// Day of week
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub weekday: Option<String>,
    /// Repeat interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_count: Option<Value>,
}

/// File attachment metadata. Content is never exposed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    /// File name
    pub name: String,
    /// Display title
    pub title: String,
    /// Size in bytes
    pub size: u64,
    /// MIME type
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl From<&FileAttachment> for FileMetadata {
    fn from(file: &FileAttachment) -> Self {
        Self {
            name: file.name.clone(),
            title: file.title.clone(),
            size: file.size,
            mime_type: file.mime_type.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Masking per shape
// ---------------------------------------------------------------------------

trait Masked {
    fn masked(self, unmask: bool) -> Self;
}

impl Masked for PaymentCard {
    fn masked(mut self, unmask: bool) -> Self {
        mask_field(&mut self.card_number, unmask);
        mask_field(&mut self.card_security_code, unmask);
        self
    }
}

impl Masked for BankAccount {
    fn masked(mut self, unmask: bool) -> Self {
        mask_field(&mut self.routing_number, unmask);
        mask_field(&mut self.account_number, unmask);
        self
    }
}

impl Masked for KeyPair {
    fn masked(mut self, unmask: bool) -> Self {
        mask_field(&mut self.private_key, unmask);
        self
    }
}

impl Masked for SecurityQuestion {
    fn masked(mut self, unmask: bool) -> Self {
        mask_field(&mut self.answer, unmask);
        self
    }
}

impl Masked for ScriptEntry {
    fn masked(mut self, unmask: bool) -> Self {
        mask_field(&mut self.command, unmask);
        self
    }
}

impl Masked for AppFillerEntry {
    fn masked(mut self, unmask: bool) -> Self {
        mask_field(&mut self.macro_sequence, unmask);
        self
    }
}

impl Masked for Passkey {
    fn masked(mut self, unmask: bool) -> Self {
        if !unmask && self.private_key.is_some() {
            self.private_key = Some(Value::String(REDACTED_MARKER.to_string()));
        }
        self
    }
}

macro_rules! unmasked_shape {
    ($($shape:ty),* $(,)?) => {
        $(impl Masked for $shape {
            fn masked(self, _unmask: bool) -> Self {
                self
            }
        })*
    };
}

unmasked_shape!(
    Address,
    Phone,
    Host,
    Name,
    PamResource,
    PamSettings,
    PamRemoteBrowserSettings,
    ScheduleEntry,
);

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Decoder selected for a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// `paymentCard`, `bankCard`
    PaymentCard,
    /// `address`
    Address,
    /// `phone`
    Phone,
    /// `bankAccount`
    BankAccount,
    /// `keyPair`
    KeyPair,
    /// `host`, `pamHostname`
    Host,
    /// `name`
    Name,
    /// `securityQuestion`
    SecurityQuestion,
    /// `pamResources`
    PamResources,
    /// `pamSettings`
    PamSettings,
    /// `pamRemoteBrowserSettings`
    PamRemoteBrowserSettings,
    /// `script`
    Script,
    /// `passkey`
    Passkey,
    /// `appFiller`
    AppFiller,
    /// `schedule`
    Schedule,
    /// `checkbox`, `isSSIDHidden`
    Boolean,
    /// Everything else: first element as text
    Scalar,
}

static SHAPES: Lazy<HashMap<&'static str, ShapeKind>> = Lazy::new(|| {
    HashMap::from([
        ("paymentCard", ShapeKind::PaymentCard),
        ("bankCard", ShapeKind::PaymentCard),
        ("address", ShapeKind::Address),
        ("phone", ShapeKind::Phone),
        ("bankAccount", ShapeKind::BankAccount),
        ("keyPair", ShapeKind::KeyPair),
        ("host", ShapeKind::Host),
        ("pamHostname", ShapeKind::Host),
        ("name", ShapeKind::Name),
        ("securityQuestion", ShapeKind::SecurityQuestion),
        ("pamResources", ShapeKind::PamResources),
        ("pamSettings", ShapeKind::PamSettings),
        ("pamRemoteBrowserSettings", ShapeKind::PamRemoteBrowserSettings),
        ("script", ShapeKind::Script),
        ("passkey", ShapeKind::Passkey),
        ("appFiller", ShapeKind::AppFiller),
        ("schedule", ShapeKind::Schedule),
        ("isSSIDHidden", ShapeKind::Boolean),
        ("checkbox", ShapeKind::Boolean),
    ])
});

/// Decoder for a declared field type.
#[must_use]
pub fn shape_of(field_type: &str) -> ShapeKind {
    SHAPES.get(field_type).copied().unwrap_or(ShapeKind::Scalar)
}

/// Decode the raw values of one field.
///
/// `label` only matters for scalar fields: they are masked when either the
/// type or the label is sensitive.
///
/// # Errors
///
/// [`KsmError::FieldNotFound`] when `values` is empty,
/// [`KsmError::UnsupportedFieldShape`] when the first element (or, for list
/// shapes, every element) does not fit the declared type.
pub fn decode(
    field_type: &str,
    label: Option<&str>,
    values: &[Value],
    unmask: bool,
) -> KsmResult<FieldValue> {
    let first = values
        .first()
        .ok_or_else(|| KsmError::field_not_found(field_type))?;

    let value = match shape_of(field_type) {
        ShapeKind::PaymentCard => FieldValue::PaymentCard(single(field_type, first, unmask)?),
        ShapeKind::Address => FieldValue::Address(single(field_type, first, unmask)?),
        ShapeKind::Phone => FieldValue::Phone(single(field_type, first, unmask)?),
        ShapeKind::BankAccount => FieldValue::BankAccount(single(field_type, first, unmask)?),
        ShapeKind::KeyPair => FieldValue::KeyPair(single(field_type, first, unmask)?),
        ShapeKind::Host => FieldValue::Host(single(field_type, first, unmask)?),
        ShapeKind::Name => FieldValue::Name(single(field_type, first, unmask)?),
        ShapeKind::SecurityQuestion => {
            FieldValue::SecurityQuestion(single(field_type, first, unmask)?)
        }
        ShapeKind::PamSettings => FieldValue::PamSettings(single(field_type, first, unmask)?),
        ShapeKind::PamRemoteBrowserSettings => {
            FieldValue::PamRemoteBrowserSettings(single(field_type, first, unmask)?)
        }
        ShapeKind::PamResources => FieldValue::PamResources(every(field_type, values, unmask)?),
        ShapeKind::Script => FieldValue::Script(every(field_type, values, unmask)?),
        ShapeKind::Passkey => FieldValue::Passkey(every(field_type, values, unmask)?),
        ShapeKind::AppFiller => FieldValue::AppFiller(every(field_type, values, unmask)?),
        ShapeKind::Schedule => FieldValue::Schedule(every(field_type, values, unmask)?),
        ShapeKind::Boolean => match first {
            Value::Bool(b) => FieldValue::Bool(*b),
            _ => return Err(KsmError::UnsupportedFieldShape(field_type.to_string())),
        },
        ShapeKind::Scalar => {
            let text = coerce_to_string(first)
                .ok_or_else(|| KsmError::UnsupportedFieldShape(field_type.to_string()))?;
            let sensitive = is_sensitive(field_type) || label.is_some_and(is_sensitive);
            FieldValue::Text(if sensitive { mask_unless(&text, unmask) } else { text })
        }
    };
    Ok(value)
}

fn single<T: DeserializeOwned + Masked>(field_type: &str, raw: &Value, unmask: bool) -> KsmResult<T> {
    if !raw.is_object() {
        return Err(KsmError::UnsupportedFieldShape(field_type.to_string()));
    }
    T::deserialize(raw)
        .map(|shape| shape.masked(unmask))
        .map_err(|_| KsmError::UnsupportedFieldShape(field_type.to_string()))
}

/// Decode every element; malformed elements are skipped.
fn every<T: DeserializeOwned + Masked>(
    field_type: &str,
    values: &[Value],
    unmask: bool,
) -> KsmResult<Vec<T>> {
    let decoded: Vec<T> = values
        .iter()
        .filter_map(|raw| single(field_type, raw, unmask).ok())
        .collect();
    if decoded.is_empty() {
        return Err(KsmError::UnsupportedFieldShape(field_type.to_string()));
    }
    Ok(decoded)
}
