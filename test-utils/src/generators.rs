//! Shared proptest generators for the KSM notation libraries.

use ksm_core::notation::{FieldSelector, Locator, RecordRef, Target};
use ksm_core::masking::SENSITIVE_KEYWORDS;
use proptest::prelude::*;

/// Generate uid-shaped record references (16-32 chars of `[A-Za-z0-9_-]`).
pub fn uid_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{16,32}"
}

/// Generate record titles that are never uid-shaped.
pub fn title_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9 ]{0,14}"
}

/// Generate field names (types or labels) free of grammar punctuation.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 _]{0,20}"
}

/// Generate sub-property identifiers. Never purely numeric.
pub fn property_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9]{0,15}"
}

/// Generate attachment names, optionally below a directory.
pub fn file_name_strategy() -> impl Strategy<Value = String> {
    "([a-z]{1,8}/)?[a-zA-Z0-9_-]{1,20}(\\.[a-z]{2,4})?"
}

/// Generate a record reference of either form.
pub fn record_ref_strategy() -> impl Strategy<Value = RecordRef> {
    prop_oneof![
        uid_strategy().prop_map(RecordRef::Uid),
        title_strategy().prop_map(RecordRef::Title),
    ]
}

/// Generate a field selector with optional index and property.
pub fn selector_strategy() -> impl Strategy<Value = FieldSelector> {
    (
        field_name_strategy(),
        proptest::option::of(0usize..100),
        proptest::option::of(property_strategy()),
    )
        .prop_map(|(name, index, property)| FieldSelector {
            name,
            index,
            property,
        })
}

/// Generate any representable locator.
pub fn locator_strategy() -> impl Strategy<Value = Locator> {
    let target = prop_oneof![
        selector_strategy().prop_map(Target::Field),
        selector_strategy().prop_map(Target::CustomField),
        file_name_strategy().prop_map(Target::File),
    ];
    (record_ref_strategy(), target).prop_map(|(record, target)| Locator::new(record, target))
}

/// Generate strings carrying a shell command-injection construct.
pub fn command_injection_strategy() -> impl Strategy<Value = String> {
    let payload = prop_oneof![
        Just("; rm -rf /"),
        Just("| cat /etc/passwd"),
        Just("$(whoami)"),
        Just("`id`"),
        Just("&& reboot"),
        Just("${IFS}"),
        Just("> /tmp/out"),
        Just("<< EOF"),
        Just("\nshutdown"),
        Just("\r\nshutdown"),
        Just("\0"),
    ];
    ("[a-zA-Z0-9]{0,8}", payload).prop_map(|(prefix, payload)| format!("{prefix}{payload}"))
}

/// Generate escape-upward paths in plain and encoded forms.
pub fn path_traversal_strategy() -> impl Strategy<Value = String> {
    let step = prop_oneof![
        Just("../"),
        Just("..\\"),
        Just("%2e%2e/"),
        Just("%252e%252e/"),
        Just("..%2f"),
        Just("..%5c"),
    ];
    ("[a-z]{0,6}/?", step, "[a-z]{1,8}")
        .prop_map(|(prefix, step, suffix)| format!("{prefix}{step}{suffix}"))
}

/// Generate search queries carrying SQL, LDAP or NoSQL attack syntax.
pub fn query_injection_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("' OR '1'='1".to_string()),
        Just("admin'--".to_string()),
        Just("1 UNION SELECT password FROM users".to_string()),
        Just("x /* comment */".to_string()),
        Just("drop table records".to_string()),
        Just("*)(uid=*".to_string()),
        Just("admin)(|(password=*)".to_string()),
        Just("{\"$ne\": null}".to_string()),
        Just("{\"$where\": \"sleep(100)\"}".to_string()),
        Just("$regex".to_string()),
    ]
}

/// Generate secret values long enough to be partially shown when masked.
pub fn long_secret_strategy() -> impl Strategy<Value = String> {
    "\\PC{7,40}"
}

/// Generate secret values short enough to be fully masked.
pub fn short_secret_strategy() -> impl Strategy<Value = String> {
    "\\PC{0,6}"
}

/// Generate names that contain a sensitivity keyword in arbitrary case.
pub fn sensitive_name_strategy() -> impl Strategy<Value = String> {
    (
        "[a-zA-Z ]{0,6}",
        proptest::sample::select(SENSITIVE_KEYWORDS),
        any::<bool>(),
        "[a-zA-Z ]{0,6}",
    )
        .prop_map(|(prefix, keyword, upper, suffix)| {
            let keyword = if upper {
                keyword.to_uppercase()
            } else {
                keyword.to_string()
            };
            format!("{prefix}{keyword}{suffix}")
        })
}
