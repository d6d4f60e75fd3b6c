//! Record type catalog: which field types a record type is expected to carry.
//!
//! The catalog is advisory. It drives "extract everything" requests and is
//! never used to reject a record; unknown types get [`FALLBACK_FIELD_TYPES`].

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Every field type the extractor knows how to decode, in extraction order.
pub const FALLBACK_FIELD_TYPES: &[&str] = &[
    "login",
    "password",
    "url",
    "email",
    "oneTimeCode",
    "text",
    "multiline",
    "secret",
    "note",
    "name",
    "phone",
    "address",
    "birthDate",
    "expirationDate",
    "date",
    "paymentCard",
    "bankCard",
    "bankAccount",
    "accountNumber",
    "licenseNumber",
    "pinCode",
    "keyPair",
    "host",
    "pamHostname",
    "securityQuestion",
    "databaseType",
    "directoryType",
    "wifiEncryption",
    "isSSIDHidden",
    "checkbox",
    "pamResources",
    "pamSettings",
    "pamRemoteBrowserSettings",
    "script",
    "passkey",
    "appFiller",
    "schedule",
];

/// Record type to expected field types, in extraction order.
const RECORD_TYPE_FIELDS: &[(&str, &[&str])] = &[
    ("login", &["login", "password", "url", "oneTimeCode", "passkey", "appFiller"]),
    ("bankAccount", &["bankAccount", "name", "login", "password", "url", "oneTimeCode"]),
    ("bankCard", &["paymentCard", "text", "pinCode", "address"]),
    ("birthCertificate", &["name", "birthDate"]),
    ("contact", &["name", "text", "email", "phone", "address"]),
    ("databaseCredentials", &["databaseType", "host", "login", "password"]),
    ("driverLicense", &["accountNumber", "name", "birthDate", "address", "expirationDate"]),
    ("encryptedNotes", &["note", "date"]),
    ("file", &[]),
    ("healthInsurance", &["accountNumber", "name", "login", "password", "url"]),
    ("membership", &["accountNumber", "name", "password"]),
    ("passport", &["accountNumber", "name", "birthDate", "expirationDate", "date", "password"]),
    ("photo", &[]),
    ("serverCredentials", &["host", "login", "password"]),
    ("softwareLicense", &["licenseNumber", "expirationDate", "date"]),
    ("sshKeys", &["login", "keyPair", "password", "host"]),
    ("ssnCard", &["accountNumber", "name"]),
    ("address", &["address"]),
    ("general", &["login", "password", "url", "email", "oneTimeCode", "securityQuestion"]),
    ("wifiCredentials", &["text", "password", "isSSIDHidden", "wifiEncryption"]),
    (
        "pamMachine",
        &["pamHostname", "pamSettings", "login", "password", "secret", "text", "checkbox"],
    ),
    (
        "pamDatabase",
        &["pamHostname", "pamSettings", "databaseType", "login", "password", "checkbox", "text"],
    ),
    (
        "pamDirectory",
        &["pamHostname", "pamSettings", "directoryType", "login", "password", "checkbox", "text"],
    ),
    (
        "pamUser",
        &["login", "password", "secret", "text", "checkbox", "oneTimeCode", "script", "schedule"],
    ),
    ("pamRemoteBrowser", &["url", "pamRemoteBrowserSettings"]),
    ("pamNetworkConfiguration", &["text", "pamResources", "schedule"]),
    ("pamAwsConfiguration", &["text", "secret", "pamResources", "schedule"]),
    ("pamAzureConfiguration", &["text", "secret", "pamResources", "schedule"]),
    ("pamGcpConfiguration", &["text", "secret", "pamResources", "schedule"]),
    ("pamDomainConfiguration", &["pamHostname", "login", "password", "pamResources", "schedule"]),
];

static RECORD_TYPES: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| RECORD_TYPE_FIELDS.iter().copied().collect());

/// Expected field types for `record_type`, or `None` if the type is unknown.
#[must_use]
pub fn expected_field_types(record_type: &str) -> Option<&'static [&'static str]> {
    RECORD_TYPES.get(record_type).copied()
}

/// Expected field types for `record_type`, falling back to every known type.
#[must_use]
pub fn field_types_for(record_type: &str) -> &'static [&'static str] {
    expected_field_types(record_type).unwrap_or(FALLBACK_FIELD_TYPES)
}

/// Names of all catalogued record types.
pub fn record_types() -> impl Iterator<Item = &'static str> {
    RECORD_TYPES.keys().copied()
}
