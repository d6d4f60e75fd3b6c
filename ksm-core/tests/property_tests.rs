//! Property-based tests for the notation core.
//!
//! Tests validate:
//! - Property 1: Notation round trip
//! - Property 2: Mask shape
//! - Property 3: Sensitivity is case-insensitive substring matching
//! - Property 4: Attack strings are rejected
//! - Property 5: Well-formed input is accepted
//! - Property 6: Masked extraction never returns a sensitive value verbatim

use ksm_core::extractor::FieldExtractor;
use ksm_core::masking::{is_sensitive, mask, FULL_MASK};
use ksm_core::notation::{build, parse};
use ksm_core::record::{Record, RecordField};
use ksm_core::shapes::FieldValue;
use ksm_core::validation::InputValidator;
use proptest::prelude::*;
use serde_json::json;
use test_utils::generators::{
    command_injection_strategy, field_name_strategy, locator_strategy, long_secret_strategy,
    path_traversal_strategy, query_injection_strategy, sensitive_name_strategy,
    short_secret_strategy, uid_strategy,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 1: Notation round trip**
    /// *For any* representable locator, building it and parsing the result
    /// SHALL give back the same locator, and building again the same string.
    #[test]
    fn prop_notation_round_trip(locator in locator_strategy()) {
        let rendered = build(&locator);
        let parsed = parse(&rendered);
        prop_assert!(parsed.is_ok(), "failed to parse {rendered:?}: {parsed:?}");
        let parsed = parsed.unwrap();
        prop_assert_eq!(&parsed, &locator);
        prop_assert_eq!(build(&parsed), rendered);
    }

    /// **Property 2: Mask shape**
    /// Values of at most six characters are fully masked; longer ones keep
    /// exactly three characters at each end.
    #[test]
    fn prop_mask_shape(long in long_secret_strategy(), short in short_secret_strategy()) {
        prop_assert_eq!(mask(&short), FULL_MASK);

        let chars: Vec<char> = long.chars().collect();
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 3..].iter().collect();
        prop_assert_eq!(mask(&long), format!("{head}***{tail}"));
    }

    /// **Property 3: Sensitivity matching**
    #[test]
    fn prop_sensitive_names_detected(name in sensitive_name_strategy()) {
        prop_assert!(is_sensitive(&name), "{name:?} not flagged");
    }

    /// **Property 4a: Command injection is rejected everywhere it matters**
    #[test]
    fn prop_command_injection_rejected(attack in command_injection_strategy()) {
        prop_assert!(InputValidator::validate_uid(&attack).is_err());
        prop_assert!(InputValidator::validate_title(&attack).is_err());
        prop_assert!(InputValidator::validate_notes(&attack).is_err());
        prop_assert!(InputValidator::validate_url(&attack).is_err());
        prop_assert!(InputValidator::validate_username(&attack).is_err());
        prop_assert!(InputValidator::validate_search_query(&attack).is_err());
        let notation = format!("My Record/field/{attack}");
        prop_assert!(InputValidator::validate_ksm_notation(&notation).is_err());
    }

    /// **Property 4b: Path traversal is rejected**
    #[test]
    fn prop_path_traversal_rejected(path in path_traversal_strategy()) {
        prop_assert!(InputValidator::validate_file_path(&path).is_err(), "{path:?} accepted");
    }

    /// **Property 4c: Query injection is rejected**
    #[test]
    fn prop_query_injection_rejected(query in query_injection_strategy()) {
        prop_assert!(InputValidator::validate_search_query(&query).is_err(), "{query:?} accepted");
    }

    /// **Property 5: Well-formed input is accepted**
    #[test]
    fn prop_valid_input_accepted(
        uid in uid_strategy(),
        locator in locator_strategy(),
        name in field_name_strategy(),
    ) {
        prop_assert!(InputValidator::validate_uid(&uid).is_ok());
        prop_assert!(InputValidator::validate_ksm_notation(&build(&locator)).is_ok());
        prop_assert!(InputValidator::validate_title(&name).is_ok());
    }

    /// **Property 6: Masked extraction hides sensitive custom fields**
    /// *For any* custom field whose label is sensitive, extraction without
    /// `unmask` SHALL return the masked form, and with `unmask` the value.
    #[test]
    fn prop_sensitive_custom_field_masked(
        label in sensitive_name_strategy(),
        secret in "[A-Za-z0-9]{10,40}",
    ) {
        let record = Record::new("UID1234567890123456", "Generated", "login")
            .with_custom(RecordField::new("text", vec![json!(secret.clone())]).with_label(label.clone()));
        let extractor = FieldExtractor::new();

        let masked = extractor.extract_all(&record, false);
        prop_assert_eq!(masked.custom.get(&label), Some(&FieldValue::Text(mask(&secret))));
        prop_assert_ne!(masked.custom.get(&label), Some(&FieldValue::Text(secret.clone())));

        let clear = extractor.extract_all(&record, true);
        prop_assert_eq!(clear.custom.get(&label), Some(&FieldValue::Text(secret)));
    }
}

#[test]
fn test_round_trip_literals() {
    for notation in [
        "UID1234567890123456/field/password",
        "UID1234567890123456/field/url[0]",
        "UID1234567890123456/custom_field/name[first]",
        "UID1234567890123456/custom_field/phone[0][number]",
        "UID1234567890123456/file/document.pdf",
        "My Secret/field/password",
    ] {
        assert_eq!(build(&parse(notation).unwrap()), notation);
    }
}

#[test]
fn test_mask_literals() {
    assert_eq!(mask("123"), "******");
    assert_eq!(mask("123456"), "******");
    assert_eq!(mask("password123"), "pas***123");
    assert!(is_sensitive("PrivateKey"));
    assert!(!is_sensitive("username"));
}
