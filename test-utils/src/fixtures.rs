//! Test fixtures with sample records.

use ksm_core::record::{FileAttachment, Record, RecordField};
use serde_json::json;

/// Uid of [`login_record`].
pub const LOGIN_UID: &str = "NJ_xXSkk3xYI1h9ql5lAiQ";
/// Uid of [`payment_card_record`].
pub const PAYMENT_CARD_UID: &str = "Pc8mRk2vXq0LwZ4nHs7TyA";
/// Uid of [`pam_machine_record`].
pub const PAM_MACHINE_UID: &str = "PmQ3zWv9Lk1Rt5Yx8Nc2Bg";
/// Uid of [`unknown_type_record`].
pub const UNKNOWN_TYPE_UID: &str = "Uk7Hd4Sf1Gj8Kl2Zx5Cv9B";
/// Uid of [`labelled_custom_record`].
pub const LABELLED_UID: &str = "Lb4cUsT0mFi3ldsRec0rdQ";
/// Title shared by [`duplicate_title_records`].
pub const SHARED_TITLE: &str = "Shared Login";
/// Uids of [`duplicate_title_records`], in enumeration order.
pub const DUPLICATE_UIDS: [&str; 2] = ["Dp1aaaaaaaaaaaaaaaaaaA", "Dp2bbbbbbbbbbbbbbbbbbB"];

/// Login record with a custom API token and an attachment.
#[must_use]
pub fn login_record() -> Record {
    Record::new(LOGIN_UID, "Production Admin", "login")
        .with_field(RecordField::new("login", vec![json!("admin@example.com")]))
        .with_field(RecordField::new("password", vec![json!("Tr0ub4dor&3-horse")]))
        .with_field(RecordField::new(
            "url",
            vec![json!("https://console.example.com"), json!("https://backup.example.com")],
        ))
        .with_field(RecordField::new("oneTimeCode", vec![]))
        .with_custom(RecordField::new("text", vec![json!("ghp_0123456789abcdef")]).with_label("API Token"))
        .with_custom(RecordField::new("text", vec![json!("eu-central-1")]).with_label("Region"))
        .with_custom(
            RecordField::new(
                "phone",
                vec![
                    json!({"region": "US", "number": "555-0100", "type": "Work"}),
                    json!({"region": "US", "number": "555-0199", "ext": "12", "type": "Mobile"}),
                ],
            )
            .with_label("On Call"),
        )
        .with_notes("Rotated quarterly")
        .with_file(FileAttachment {
            uid: "FiLe0000000000000000Aa".to_string(),
            name: "runbook.pdf".to_string(),
            title: "Runbook".to_string(),
            size: 48_213,
            mime_type: "application/pdf".to_string(),
        })
}

/// Bank card record with card number `4111111111111111`, expiry `12/25`
/// and security code `123`.
#[must_use]
pub fn payment_card_record() -> Record {
    Record::new(PAYMENT_CARD_UID, "Corporate Visa", "bankCard")
        .with_field(RecordField::new(
            "paymentCard",
            vec![json!({
                "cardNumber": "4111111111111111",
                "cardExpirationDate": "12/25",
                "cardSecurityCode": "123"
            })],
        ))
        .with_field(RecordField::new("text", vec![json!("Ada Lovelace")]).with_label("Cardholder Name"))
        .with_field(RecordField::new("pinCode", vec![json!("9876")]))
        .with_field(RecordField::new(
            "address",
            vec![json!({"street1": "1 Infinite Loop", "city": "Cupertino", "state": "CA", "zip": "95014"})],
        ))
}

/// Two login records sharing [`SHARED_TITLE`]. The first one wins
/// duplicate resolution.
#[must_use]
pub fn duplicate_title_records() -> Vec<Record> {
    DUPLICATE_UIDS
        .iter()
        .zip(["first-shared-password", "second-shared-password"])
        .map(|(uid, password)| {
            Record::new(*uid, SHARED_TITLE, "login")
                .with_field(RecordField::new("login", vec![json!("shared@example.com")]))
                .with_field(RecordField::new("password", vec![json!(password)]))
        })
        .collect()
}

/// PAM machine with host, connection settings and rotation schedule.
#[must_use]
pub fn pam_machine_record() -> Record {
    Record::new(PAM_MACHINE_UID, "Bastion", "pamMachine")
        .with_field(RecordField::new("pamHostname", vec![json!({"hostName": "10.0.0.5", "port": 22})]))
        .with_field(RecordField::new(
            "pamSettings",
            vec![json!({
                "portForward": [{"port": "2222", "reusePort": true}],
                "connection": [{"protocol": "ssh", "recordingIncludeKeys": false}]
            })],
        ))
        .with_field(RecordField::new("login", vec![json!("root")]))
        .with_field(RecordField::new("password", vec![json!("n0t-the-real-one")]))
        .with_field(RecordField::new("checkbox", vec![json!(true)]).with_label("Rotate on use"))
        .with_custom(RecordField::new(
            "schedule",
            vec![json!({"type": "CRON", "cron": "0 3 * * 0", "tz": "UTC"})],
        ))
        .with_custom(RecordField::new(
            "script",
            vec![json!({"fileRef": "ScRiPt00000000000000Aa", "command": "/opt/rotate.sh --host bastion", "recordRef": []})],
        ))
}

/// Record of a type no catalog knows.
#[must_use]
pub fn unknown_type_record() -> Record {
    Record::new(UNKNOWN_TYPE_UID, "Experimental", "quantumKeyEscrow")
        .with_field(RecordField::new("login", vec![json!("escrow-agent")]))
        .with_field(RecordField::new("secret", vec![json!("qk-0000-1111-2222")]))
        .with_field(RecordField::new("entanglementId", vec![json!("ignored")]))
        .with_custom(RecordField::new("text", vec![json!(42)]).with_label("Qubits"))
}

/// Record whose custom fields carry non-sensitive labels over sensitive
/// types: card number `4111111111111111` with security code `987`, and a
/// password `hunter2hunter2`.
#[must_use]
pub fn labelled_custom_record() -> Record {
    Record::new(LABELLED_UID, "Ops Vault", "general")
        .with_field(RecordField::new("login", vec![json!("ops@example.com")]))
        .with_custom(
            RecordField::new(
                "paymentCard",
                vec![json!({
                    "cardNumber": "4111111111111111",
                    "cardExpirationDate": "12/25",
                    "cardSecurityCode": "987"
                })],
            )
            .with_label("Corporate Card"),
        )
        .with_custom(RecordField::new("password", vec![json!("hunter2hunter2")]).with_label("DB Creds"))
}

/// Every fixture record, duplicates included.
#[must_use]
pub fn all_records() -> Vec<Record> {
    let mut records = vec![
        login_record(),
        payment_card_record(),
        pam_machine_record(),
        unknown_type_record(),
        labelled_custom_record(),
    ];
    records.extend(duplicate_title_records());
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use ksm_core::validation::InputValidator;

    #[test]
    fn test_fixture_uids_are_valid() {
        for record in all_records() {
            assert!(
                InputValidator::validate_uid(&record.uid).is_ok(),
                "{} is not a valid uid",
                record.uid
            );
        }
    }

    #[test]
    fn test_duplicates_share_title() {
        let records = duplicate_title_records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.title == SHARED_TITLE));
        assert_ne!(records[0].uid, records[1].uid);
    }
}
