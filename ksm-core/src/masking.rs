//! Sensitivity classification and masking.
//!
//! A name is sensitive when any keyword is a case-insensitive substring of
//! it. The rule is a heuristic applied uniformly to field types, custom
//! labels and sub-property names.
//!
//! Masking counts Unicode scalar values, so multi-byte secrets are never cut
//! inside a character: values of up to six characters become `******`,
//! longer ones keep their first and last three characters around `***`.

/// Lowercased sensitivity keywords.
pub const SENSITIVE_KEYWORDS: &[&str] = &[
    "password",
    "secret",
    "privatekey",
    "cardnumber",
    "accountnumber",
    "pin",
    "passphrase",
    "otp",
    "answer",
    "keypair",
    "bankaccount",
    "paymentcard",
    "routingnumber",
    "licensenumber",
    "token",
];

/// Replacement for short values.
pub const FULL_MASK: &str = "******";

/// Replacement for structured private keys (passkeys), which are never sliced.
pub const REDACTED_MARKER: &str = "[REDACTED]";

const KEEP: usize = 3;
const SHORT_LIMIT: usize = 6;

/// Whether a field type, label or property name denotes a secret.
///
/// # Examples
///
/// ```
/// use ksm_core::masking::is_sensitive;
///
/// assert!(is_sensitive("PrivateKey"));
/// assert!(is_sensitive("API Token"));
/// assert!(!is_sensitive("username"));
/// ```
#[must_use]
pub fn is_sensitive(name: &str) -> bool {
    let folded = name.to_lowercase();
    SENSITIVE_KEYWORDS.iter().any(|kw| folded.contains(kw))
}

/// Partially redact a value.
///
/// # Examples
///
/// ```
/// use ksm_core::masking::mask;
///
/// assert_eq!(mask("123"), "******");
/// assert_eq!(mask("password123"), "pas***123");
/// ```
#[must_use]
pub fn mask(value: &str) -> String {
    let len = value.chars().count();
    if len <= SHORT_LIMIT {
        return FULL_MASK.to_string();
    }
    let head: String = value.chars().take(KEEP).collect();
    let tail: String = value.chars().skip(len - KEEP).collect();
    format!("{head}***{tail}")
}

/// Mask `value` unless the caller asked for clear text.
#[must_use]
pub fn mask_unless(value: &str, unmask: bool) -> String {
    if unmask {
        value.to_string()
    } else {
        mask(value)
    }
}

/// Mask `value` when `name` is sensitive and the caller did not ask for
/// clear text.
#[must_use]
pub fn mask_if_sensitive(name: &str, value: &str, unmask: bool) -> String {
    if is_sensitive(name) {
        mask_unless(value, unmask)
    } else {
        value.to_string()
    }
}
