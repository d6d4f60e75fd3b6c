//! Record data as delivered by the vault client.
//!
//! Field values stay as raw JSON ([`serde_json::Value`]) here; typed
//! decoding happens in [`crate::shapes`]. Nothing in the core mutates a
//! record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A secret record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record uid
    #[serde(rename = "recordUid", alias = "uid")]
    pub uid: String,
    /// Record title
    #[serde(default)]
    pub title: String,
    /// Record type name (`login`, `bankCard`, ...)
    #[serde(rename = "type", default)]
    pub record_type: String,
    /// Free-form notes
    #[serde(default)]
    pub notes: String,
    /// Standard (typed) fields in schema order
    #[serde(default)]
    pub fields: Vec<RecordField>,
    /// Custom fields in display order
    #[serde(default)]
    pub custom: Vec<RecordField>,
    /// File attachments
    #[serde(default)]
    pub files: Vec<FileAttachment>,
}

/// A standard or custom field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordField {
    /// Field type name
    #[serde(rename = "type")]
    pub field_type: String,
    /// Optional label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Values; multi-value fields hold more than one element
    #[serde(default)]
    pub value: Vec<Value>,
}

/// File attachment metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    /// File uid
    #[serde(rename = "fileUid", alias = "uid")]
    pub uid: String,
    /// File name
    #[serde(default)]
    pub name: String,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
    /// MIME type
    #[serde(rename = "type", default)]
    pub mime_type: String,
}

impl RecordField {
    /// Create a field.
    #[must_use]
    pub fn new(field_type: impl Into<String>, value: Vec<Value>) -> Self {
        Self {
            field_type: field_type.into(),
            label: None,
            value,
        }
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label if set and non-empty.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref().filter(|l| !l.is_empty())
    }

    /// Label, falling back to the type name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.label().unwrap_or(&self.field_type)
    }
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new(
        uid: impl Into<String>,
        title: impl Into<String>,
        record_type: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            title: title.into(),
            record_type: record_type.into(),
            ..Default::default()
        }
    }

    /// Add a standard field.
    #[must_use]
    pub fn with_field(mut self, field: RecordField) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a custom field.
    #[must_use]
    pub fn with_custom(mut self, field: RecordField) -> Self {
        self.custom.push(field);
        self
    }

    /// Add a file attachment.
    #[must_use]
    pub fn with_file(mut self, file: FileAttachment) -> Self {
        self.files.push(file);
        self
    }

    /// Set notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// First standard field of the given type.
    #[must_use]
    pub fn standard_field(&self, field_type: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.field_type == field_type)
    }

    /// First custom field of the given type.
    #[must_use]
    pub fn custom_field_by_type(&self, field_type: &str) -> Option<&RecordField> {
        self.custom.iter().find(|f| f.field_type == field_type)
    }

    /// First custom field with the given label.
    #[must_use]
    pub fn custom_field_by_label(&self, label: &str) -> Option<&RecordField> {
        self.custom.iter().find(|f| f.label() == Some(label))
    }

    /// First standard field with the given label.
    #[must_use]
    pub fn standard_field_by_label(&self, label: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.label() == Some(label))
    }

    /// Native password accessor: first value of the `password` field.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.standard_field("password")
            .and_then(|f| f.value.first())
            .and_then(Value::as_str)
    }

    /// First field, standard before custom, whose label matches.
    #[must_use]
    pub fn field_by_label(&self, label: &str) -> Option<&RecordField> {
        self.standard_field_by_label(label)
            .or_else(|| self.custom_field_by_label(label))
    }

    /// Attachment whose name or title equals `name`.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&FileAttachment> {
        self.files
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.files.iter().find(|f| f.title == name))
    }
}
