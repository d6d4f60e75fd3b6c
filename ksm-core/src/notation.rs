//! Keeper notation grammar.
//!
//! ```text
//! notation       := ref "/" kind "/" payload
//! ref            := uid | title
//! kind           := "field" | "custom_field" | "file"
//! payload(file)  := filename                  (verbatim, may contain "/")
//! payload(field) := name ("[" index "]")? ("[" property "]")?
//! ```
//!
//! [`parse`] and [`build`] are exact inverses: `build(&parse(s)?) == s` for
//! every string `parse` accepts. To keep that law, zero-padded indices such
//! as `[01]` are rejected rather than normalized.
//!
//! The parser does not run the input validator; callers that accept
//! untrusted notations go through
//! [`InputValidator::validate_ksm_notation`](crate::validation::InputValidator::validate_ksm_notation)
//! first.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::error::{KsmError, KsmResult};
use crate::record::Record;
use crate::validation::{UID_MAX_LEN, UID_MIN_LEN};

static NESTED_RE: Lazy<Regex> = Lazy::new(|| compile(r"^(.+?)\[([^\[\]]*)\]\[([^\[\]]*)\]$"));
static BRACKET_RE: Lazy<Regex> = Lazy::new(|| compile(r"^(.+?)\[([^\[\]]*)\]$"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("built-in pattern {pattern:?} is invalid: {e}"))
}

/// How a notation names its record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordRef {
    /// Record uid (16-32 chars of `[A-Za-z0-9_-]`)
    Uid(String),
    /// Record title
    Title(String),
}

impl RecordRef {
    /// Classify a raw reference segment: uid-shaped strings are uids,
    /// everything else is a title.
    #[must_use]
    pub fn from_reference(reference: &str) -> Self {
        let len = reference.chars().count();
        let uid_shaped = (UID_MIN_LEN..=UID_MAX_LEN).contains(&len)
            && reference
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if uid_shaped {
            Self::Uid(reference.to_string())
        } else {
            Self::Title(reference.to_string())
        }
    }

    /// The reference as written in the notation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Uid(s) | Self::Title(s) => s,
        }
    }

    /// The uid, if this is a uid reference.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        match self {
            Self::Uid(uid) => Some(uid),
            Self::Title(_) => None,
        }
    }

    /// The title, if this is a title reference.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Title(title) => Some(title),
            Self::Uid(_) => None,
        }
    }

    /// Whether `record` is the one referenced.
    ///
    /// Uid-shaped references also match on title, since a title can look
    /// like a uid.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Uid(uid) => record.uid == *uid || record.title == *uid,
            Self::Title(title) => record.title == *title,
        }
    }
}

/// Second notation segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocatorKind {
    /// Standard (typed) field
    Field,
    /// Custom field, addressed by label
    CustomField,
    /// File attachment
    File,
}

impl LocatorKind {
    /// Notation spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::CustomField => "custom_field",
            Self::File => "file",
        }
    }

    /// Parse the notation spelling.
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "field" => Some(Self::Field),
            "custom_field" => Some(Self::CustomField),
            "file" => Some(Self::File),
            _ => None,
        }
    }
}

/// Field name with optional element index and sub-property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSelector {
    /// Field type or label
    pub name: String,
    /// Element of a multi-valued field
    pub index: Option<usize>,
    /// Named sub-property of the (indexed) value
    pub property: Option<String>,
}

impl FieldSelector {
    /// Select a whole field.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
            property: None,
        }
    }

    /// Select one element.
    #[must_use]
    pub const fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Select a sub-property.
    #[must_use]
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }
}

/// What a notation points at inside the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Standard field
    Field(FieldSelector),
    /// Custom field
    CustomField(FieldSelector),
    /// File attachment by name or title
    File(String),
}

/// Parsed notation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    /// Record reference
    pub record: RecordRef,
    /// Addressed field or file
    pub target: Target,
}

impl Locator {
    /// Create a locator.
    #[must_use]
    pub const fn new(record: RecordRef, target: Target) -> Self {
        Self { record, target }
    }

    /// Kind segment.
    #[must_use]
    pub const fn kind(&self) -> LocatorKind {
        match self.target {
            Target::Field(_) => LocatorKind::Field,
            Target::CustomField(_) => LocatorKind::CustomField,
            Target::File(_) => LocatorKind::File,
        }
    }

    /// Field selector for field and custom field locators.
    #[must_use]
    pub const fn selector(&self) -> Option<&FieldSelector> {
        match &self.target {
            Target::Field(selector) | Target::CustomField(selector) => Some(selector),
            Target::File(_) => None,
        }
    }

    /// Field name, absent for file locators.
    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        self.selector().map(|s| s.name.as_str())
    }

    /// Element index, if any.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.selector().and_then(|s| s.index)
    }

    /// Sub-property, if any.
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        self.selector().and_then(|s| s.property.as_deref())
    }

    /// File name for file locators.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        match &self.target {
            Target::File(name) => Some(name),
            _ => None,
        }
    }
}

impl FromStr for Locator {
    type Err = KsmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/", self.record.as_str(), self.kind().as_str())?;
        match &self.target {
            Target::File(name) => f.write_str(name),
            Target::Field(selector) | Target::CustomField(selector) => {
                f.write_str(&selector.name)?;
                if let Some(index) = selector.index {
                    write!(f, "[{index}]")?;
                }
                if let Some(property) = &selector.property {
                    write!(f, "[{property}]")?;
                }
                Ok(())
            }
        }
    }
}

/// Split a notation into `(ref, kind, remainder)` without interpreting the
/// pieces. The remainder is empty when the notation has only two parts.
///
/// # Errors
///
/// [`KsmError::EmptyInput`] for an empty string, [`KsmError::MalformedNotation`]
/// when there is no `/` at all.
pub fn split_notation_parts(notation: &str) -> KsmResult<(&str, &str, &str)> {
    if notation.is_empty() {
        return Err(KsmError::EmptyInput);
    }
    let mut parts = notation.splitn(3, '/');
    let reference = parts.next().unwrap_or_default();
    let kind = parts
        .next()
        .ok_or_else(|| KsmError::malformed("expected <record>/<kind>/<payload>"))?;
    let remainder = parts.next().unwrap_or_default();
    Ok((reference, kind, remainder))
}

/// Whether the notation addresses a file attachment.
#[must_use]
pub fn is_file_notation(notation: &str) -> bool {
    matches!(split_notation_parts(notation), Ok((_, "file", _)))
}

/// Whether the notation addresses a custom field.
#[must_use]
pub fn is_custom_field_notation(notation: &str) -> bool {
    matches!(split_notation_parts(notation), Ok((_, "custom_field", _)))
}

/// Parse a notation string.
///
/// # Errors
///
/// `EmptyInput`, `MalformedNotation`, `UnknownNotationKind`, `MissingPayload`
/// or `InvalidIndex` as described in the module docs.
///
/// # Examples
///
/// ```
/// use ksm_core::notation::{parse, LocatorKind};
///
/// let locator = parse("My Server/custom_field/phone[0][number]").unwrap();
/// assert_eq!(locator.kind(), LocatorKind::CustomField);
/// assert_eq!(locator.index(), Some(0));
/// assert_eq!(locator.property(), Some("number"));
/// assert_eq!(locator.to_string(), "My Server/custom_field/phone[0][number]");
/// ```
pub fn parse(notation: &str) -> KsmResult<Locator> {
    let (reference, kind, payload) = split_notation_parts(notation)?;
    if reference.is_empty() {
        return Err(KsmError::malformed("missing record reference"));
    }
    let kind = LocatorKind::from_segment(kind)
        .ok_or_else(|| KsmError::UnknownNotationKind(kind.to_string()))?;
    if payload.is_empty() {
        return Err(KsmError::MissingPayload(kind.as_str().to_string()));
    }

    let record = RecordRef::from_reference(reference);
    let target = match kind {
        LocatorKind::File => Target::File(payload.to_string()),
        LocatorKind::Field => Target::Field(parse_selector(kind, payload)?),
        LocatorKind::CustomField => Target::CustomField(parse_selector(kind, payload)?),
    };
    Ok(Locator::new(record, target))
}

/// Render a locator as a notation string.
#[must_use]
pub fn build(locator: &Locator) -> String {
    locator.to_string()
}

fn parse_selector(kind: LocatorKind, payload: &str) -> KsmResult<FieldSelector> {
    if payload.starts_with('[') {
        return Err(KsmError::MissingPayload(kind.as_str().to_string()));
    }

    if let Some(caps) = NESTED_RE.captures(payload) {
        let index = parse_index(&caps[2])?;
        let property = &caps[3];
        if property.is_empty() {
            return Err(KsmError::malformed(format!("empty property in '{payload}'")));
        }
        return Ok(FieldSelector::new(&caps[1])
            .with_index(index)
            .with_property(property));
    }

    if let Some(caps) = BRACKET_RE.captures(payload) {
        let inner = &caps[2];
        let selector = FieldSelector::new(&caps[1]);
        return if looks_numeric(inner) {
            Ok(selector.with_index(parse_index(inner)?))
        } else {
            Ok(selector.with_property(inner))
        };
    }

    Ok(FieldSelector::new(payload))
}

/// Empty brackets and signed numbers are index attempts, not property names.
fn looks_numeric(inner: &str) -> bool {
    let digits = inner.strip_prefix(['-', '+']).unwrap_or(inner);
    digits.is_empty() || digits.chars().all(|c| c.is_ascii_digit())
}

fn parse_index(raw: &str) -> KsmResult<usize> {
    let well_formed = !raw.is_empty()
        && raw.chars().all(|c| c.is_ascii_digit())
        && (raw == "0" || !raw.starts_with('0'));
    if !well_formed {
        return Err(KsmError::InvalidIndex(raw.to_string()));
    }
    raw.parse::<usize>()
        .map_err(|_| KsmError::InvalidIndex(raw.to_string()))
}
