//! Input validation for every caller-supplied string.
//!
//! Record uids, notations, titles, notes, URLs, usernames, search queries,
//! profile names, one-time tokens and file paths all pass through
//! [`InputValidator`] before they reach the grammar, the extractor or the
//! vault client. Validators only accept or reject; they never trim, truncate
//! or rewrite input. [`truncate`] and [`shell_escape`] are separate, explicit
//! utilities.
//!
//! Lengths are counted in Unicode scalar values.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::notation::Locator;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Minimum record uid length.
pub const UID_MIN_LEN: usize = 16;
/// Maximum record uid length.
pub const UID_MAX_LEN: usize = 32;
/// Minimum one-time token payload length.
pub const TOKEN_PAYLOAD_MIN_LEN: usize = 20;
/// Maximum profile name length.
pub const PROFILE_NAME_MAX_LEN: usize = 64;
/// Maximum search query length.
pub const SEARCH_QUERY_MAX_LEN: usize = 256;
/// Maximum record title length.
pub const TITLE_MAX_LEN: usize = 255;
/// Maximum notes length.
pub const NOTES_MAX_LEN: usize = 10_000;
/// Maximum URL length.
pub const URL_MAX_LEN: usize = 2048;
/// Maximum username length.
pub const USERNAME_MAX_LEN: usize = 255;

/// Regions accepted as one-time token prefixes.
pub const TOKEN_REGIONS: &[&str] = &["US", "EU", "AU", "JP", "CA", "GOV"];

/// Profile names that may not be used (case-insensitive).
pub const RESERVED_PROFILE_NAMES: &[&str] = &["default", "system", "root", "admin", "config", "test"];

/// URL schemes that are never accepted.
pub const DANGEROUS_URL_SCHEMES: &[&str] = &["javascript:", "data:", "vbscript:", "file:"];

// ---------------------------------------------------------------------------
// Rejection reasons
// ---------------------------------------------------------------------------

/// Why an input was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// Input is empty
    #[error("{field} must not be empty")]
    Empty {
        /// Validated field
        field: &'static str,
    },

    /// Input is shorter than allowed
    #[error("{field} too short: {actual} chars (min {min})")]
    TooShort {
        /// Validated field
        field: &'static str,
        /// Minimum length
        min: usize,
        /// Actual length
        actual: usize,
    },

    /// Input is longer than allowed
    #[error("{field} too long: {actual} chars (max {max})")]
    TooLong {
        /// Validated field
        field: &'static str,
        /// Maximum length
        max: usize,
        /// Actual length
        actual: usize,
    },

    /// Input contains characters outside the allowed set
    #[error("{field} contains invalid characters")]
    InvalidCharset {
        /// Validated field
        field: &'static str,
    },

    /// Input does not have the expected layout
    #[error("{field} has invalid format: {detail}")]
    InvalidFormat {
        /// Validated field
        field: &'static str,
        /// What is wrong
        detail: &'static str,
    },

    /// Shell command-injection characters
    #[error("{field} contains command injection characters")]
    CommandInjection {
        /// Validated field
        field: &'static str,
    },

    /// Parent-directory traversal segment
    #[error("{field} contains path traversal")]
    PathTraversal {
        /// Validated field
        field: &'static str,
    },

    /// Embedded NUL byte
    #[error("{field} contains a null byte")]
    NullByte {
        /// Validated field
        field: &'static str,
    },

    /// Shell metacharacters in a path
    #[error("{field} contains shell metacharacters")]
    ShellMetacharacters {
        /// Validated field
        field: &'static str,
    },

    /// Reserved profile name
    #[error("profile name '{name}' is reserved")]
    ReservedName {
        /// Rejected name
        name: String,
    },

    /// Unknown token region
    #[error("unknown token region '{region}'")]
    InvalidRegion {
        /// Rejected region
        region: String,
    },

    /// Dangerous URL scheme
    #[error("URL scheme '{scheme}' is not allowed")]
    DangerousScheme {
        /// Rejected scheme
        scheme: &'static str,
    },

    /// HTML-looking content
    #[error("{field} contains markup")]
    Markup {
        /// Validated field
        field: &'static str,
    },

    /// Unicode format or control characters (bidi overrides, zero-width)
    #[error("{field} contains unicode control characters")]
    UnicodeControl {
        /// Validated field
        field: &'static str,
    },

    /// SQL injection pattern
    #[error("{field} contains SQL injection patterns")]
    SqlInjection {
        /// Validated field
        field: &'static str,
    },

    /// LDAP filter injection pattern
    #[error("{field} contains LDAP injection patterns")]
    LdapInjection {
        /// Validated field
        field: &'static str,
    },

    /// NoSQL operator injection pattern
    #[error("{field} contains NoSQL injection patterns")]
    NoSqlInjection {
        /// Validated field
        field: &'static str,
    },

    /// Notation failed structural parsing
    #[error("invalid notation: {0}")]
    Notation(String),
}

// ---------------------------------------------------------------------------
// Compiled pattern tables
// ---------------------------------------------------------------------------

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("built-in pattern {pattern:?} is invalid: {e}"))
}

static UID_RE: Lazy<Regex> = Lazy::new(|| compile(r"^[A-Za-z0-9_-]+$"));
static TOKEN_PAYLOAD_RE: Lazy<Regex> = Lazy::new(|| compile(r"^[A-Za-z0-9_-]+={0,2}$"));
static PROFILE_NAME_RE: Lazy<Regex> = Lazy::new(|| compile(r"^[A-Za-z0-9._-]+$"));

static COMMAND_INJECTION_RE: Lazy<Regex> =
    Lazy::new(|| compile(r"[;|&`<>\n\r\x00]|\$\(|\$\{"));
static PATH_TRAVERSAL_RE: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)\.\.[/\\]|%2e%2e|%252e%252e|\.\.%2f|\.\.%5c|\x00"));
static PATH_SHELL_META_RE: Lazy<Regex> = Lazy::new(|| compile(r"[;|&$`(){}<>]"));

static SQL_INJECTION_RE: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i)--|/\*|\*/|'\s*or\s*'|union|select|drop|insert|delete|update|exec|truncate|alter")
});
static LDAP_INJECTION_RE: Lazy<Regex> = Lazy::new(|| compile(r"\*\)\(|\)\(\||\)\(&"));
static NOSQL_INJECTION_RE: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)\$(ne|regex|gt|gte|lt|lte|where|or|and|in|nin|exists)\b"));

static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| compile(r"<[^<>]*>"));
static HTML_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i)<\s*/?\s*(script|iframe|img|svg|object|embed|style|link|meta)\b|javascript:|vbscript:|data:text/html|\bon(error|load|click|mouseover|focus|blur|submit|change)\s*=|&lt;|&#")
});

/// Unicode general category Cf (format) ranges. Includes the bidi overrides
/// and isolates (U+202A-U+202E, U+2066-U+2069) and zero-width characters.
const FORMAT_RANGES: &[(u32, u32)] = &[
    (0x00AD, 0x00AD),
    (0x0600, 0x0605),
    (0x061C, 0x061C),
    (0x06DD, 0x06DD),
    (0x070F, 0x070F),
    (0x0890, 0x0891),
    (0x08E2, 0x08E2),
    (0x180E, 0x180E),
    (0x200B, 0x200F),
    (0x202A, 0x202E),
    (0x2060, 0x2064),
    (0x2066, 0x206F),
    (0xFEFF, 0xFEFF),
    (0xFFF9, 0xFFFB),
    (0x110BD, 0x110BD),
    (0x110CD, 0x110CD),
    (0x13430, 0x1343F),
    (0x1BCA0, 0x1BCA3),
    (0x1D173, 0x1D17A),
    (0xE0001, 0xE0001),
    (0xE0020, 0xE007F),
];

fn is_format_char(ch: char) -> bool {
    let cp = u32::from(ch);
    FORMAT_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

// ---------------------------------------------------------------------------
// Shared primitives
// ---------------------------------------------------------------------------

/// True if `input` contains any shell command-injection construct:
/// `;`, `|`, `&`, backtick, `$(`, `${`, `<`, `>`, newline, CR or NUL.
#[must_use]
pub fn contains_command_injection(input: &str) -> bool {
    COMMAND_INJECTION_RE.is_match(input)
}

/// True if `input` contains an escape-upward path segment, in plain,
/// percent-encoded or double-encoded form, or a NUL byte.
#[must_use]
pub fn contains_path_traversal(input: &str) -> bool {
    PATH_TRAVERSAL_RE.is_match(input)
        || input.split(['/', '\\']).any(|segment| segment == "..")
}

/// True if `input` contains Unicode format characters or control characters
/// other than tab.
#[must_use]
pub fn contains_unicode_control(input: &str) -> bool {
    input
        .chars()
        .any(|ch| is_format_char(ch) || (ch.is_control() && ch != '\t'))
}

/// Quote `input` for use as a single POSIX shell argument.
///
/// # Examples
///
/// ```
/// use ksm_core::validation::shell_escape;
///
/// assert_eq!(shell_escape("it's"), r"'it'\''s'");
/// ```
#[must_use]
pub fn shell_escape(input: &str) -> String {
    format!("'{}'", input.replace('\'', r"'\''"))
}

/// Cut `input` to at most `max_chars` Unicode scalar values.
#[must_use]
pub fn truncate(input: &str, max_chars: usize) -> String {
    input.chars().take(max_chars).collect()
}

fn check_length(
    field: &'static str,
    input: &str,
    min: usize,
    max: usize,
) -> Result<(), RejectionReason> {
    let actual = input.chars().count();
    if actual == 0 && min > 0 {
        return Err(RejectionReason::Empty { field });
    }
    if actual < min {
        return Err(RejectionReason::TooShort { field, min, actual });
    }
    if actual > max {
        return Err(RejectionReason::TooLong { field, max, actual });
    }
    Ok(())
}

fn check_command_injection(field: &'static str, input: &str) -> Result<(), RejectionReason> {
    if contains_command_injection(input) {
        return Err(RejectionReason::CommandInjection { field });
    }
    Ok(())
}

fn check_free_text(field: &'static str, input: &str, max: usize) -> Result<(), RejectionReason> {
    check_length(field, input, 0, max)?;
    if HTML_TAG_RE.is_match(input) || HTML_MARKER_RE.is_match(input) {
        return Err(RejectionReason::Markup { field });
    }
    check_command_injection(field, input)?;
    if contains_unicode_control(input) {
        return Err(RejectionReason::UnicodeControl { field });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// InputValidator
// ---------------------------------------------------------------------------

/// Validates caller-supplied strings by purpose.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputValidator;

impl InputValidator {
    /// Record uid: 16-32 chars of `[A-Za-z0-9_-]`.
    ///
    /// # Errors
    ///
    /// Returns the first rule the uid breaks.
    pub fn validate_uid(uid: &str) -> Result<(), RejectionReason> {
        const FIELD: &str = "uid";
        check_command_injection(FIELD, uid)?;
        check_length(FIELD, uid, UID_MIN_LEN, UID_MAX_LEN)?;
        if !UID_RE.is_match(uid) {
            return Err(RejectionReason::InvalidCharset { field: FIELD });
        }
        Ok(())
    }

    /// One-time access token: `REGION:payload`.
    ///
    /// # Errors
    ///
    /// Rejects missing separators, unknown or lowercase regions and payloads
    /// that are too short or not base64url.
    pub fn validate_token(token: &str) -> Result<(), RejectionReason> {
        const FIELD: &str = "token";
        if token.is_empty() {
            return Err(RejectionReason::Empty { field: FIELD });
        }
        let (region, payload) = token.split_once(':').ok_or(RejectionReason::InvalidFormat {
            field: FIELD,
            detail: "expected REGION:payload",
        })?;
        if !TOKEN_REGIONS.contains(&region) {
            return Err(RejectionReason::InvalidRegion {
                region: region.to_string(),
            });
        }
        check_length(FIELD, payload, TOKEN_PAYLOAD_MIN_LEN, usize::MAX)?;
        if !TOKEN_PAYLOAD_RE.is_match(payload) {
            return Err(RejectionReason::InvalidCharset { field: FIELD });
        }
        Ok(())
    }

    /// Configuration profile name.
    ///
    /// # Errors
    ///
    /// Rejects empty, overlong, non-`[A-Za-z0-9._-]` and reserved names.
    pub fn validate_profile_name(name: &str) -> Result<(), RejectionReason> {
        const FIELD: &str = "profile name";
        check_length(FIELD, name, 1, PROFILE_NAME_MAX_LEN)?;
        if !PROFILE_NAME_RE.is_match(name) {
            return Err(RejectionReason::InvalidCharset { field: FIELD });
        }
        if RESERVED_PROFILE_NAMES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(name))
        {
            return Err(RejectionReason::ReservedName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Filesystem path. Absolute paths are fine; escaping upward is not.
    ///
    /// # Errors
    ///
    /// Rejects empty paths, traversal, NUL bytes, shell metacharacters and
    /// control characters.
    pub fn validate_file_path(path: &str) -> Result<(), RejectionReason> {
        const FIELD: &str = "file path";
        if path.is_empty() {
            return Err(RejectionReason::Empty { field: FIELD });
        }
        if path.contains('\0') {
            return Err(RejectionReason::NullByte { field: FIELD });
        }
        if contains_path_traversal(path) {
            return Err(RejectionReason::PathTraversal { field: FIELD });
        }
        if PATH_SHELL_META_RE.is_match(path) || path.chars().any(char::is_control) {
            return Err(RejectionReason::ShellMetacharacters { field: FIELD });
        }
        Ok(())
    }

    /// Keeper notation string, checked structurally by the grammar.
    ///
    /// # Errors
    ///
    /// Rejects command-injection characters, `..` anywhere in a segment,
    /// encoded escape-upward sequences and anything the grammar refuses.
    pub fn validate_ksm_notation(notation: &str) -> Result<(), RejectionReason> {
        const FIELD: &str = "notation";
        if notation.is_empty() {
            return Err(RejectionReason::Empty { field: FIELD });
        }
        check_command_injection(FIELD, notation)?;
        if notation.split('/').any(|segment| segment.contains(".."))
            || contains_path_traversal(notation)
        {
            return Err(RejectionReason::PathTraversal { field: FIELD });
        }
        notation
            .parse::<Locator>()
            .map_err(|e| RejectionReason::Notation(e.to_string()))?;
        Ok(())
    }

    /// Record search query.
    ///
    /// # Errors
    ///
    /// Rejects overlong queries, command injection and SQL, LDAP or NoSQL
    /// attack patterns.
    pub fn validate_search_query(query: &str) -> Result<(), RejectionReason> {
        const FIELD: &str = "search query";
        check_length(FIELD, query, 0, SEARCH_QUERY_MAX_LEN)?;
        check_command_injection(FIELD, query)?;
        if SQL_INJECTION_RE.is_match(query) {
            return Err(RejectionReason::SqlInjection { field: FIELD });
        }
        if LDAP_INJECTION_RE.is_match(query) {
            return Err(RejectionReason::LdapInjection { field: FIELD });
        }
        if NOSQL_INJECTION_RE.is_match(query) {
            return Err(RejectionReason::NoSqlInjection { field: FIELD });
        }
        Ok(())
    }

    /// Record title (also used for field names and labels).
    ///
    /// # Errors
    ///
    /// Rejects overlong titles, markup, command injection and Unicode
    /// format/control characters.
    pub fn validate_title(title: &str) -> Result<(), RejectionReason> {
        check_free_text("title", title, TITLE_MAX_LEN)
    }

    /// Record notes.
    ///
    /// # Errors
    ///
    /// Same rules as [`InputValidator::validate_title`] with a larger cap.
    pub fn validate_notes(notes: &str) -> Result<(), RejectionReason> {
        check_free_text("notes", notes, NOTES_MAX_LEN)
    }

    /// URL value.
    ///
    /// # Errors
    ///
    /// Rejects overlong URLs, dangerous schemes and command injection.
    pub fn validate_url(url: &str) -> Result<(), RejectionReason> {
        const FIELD: &str = "url";
        check_length(FIELD, url, 0, URL_MAX_LEN)?;
        let lowered = url.trim_start().to_ascii_lowercase();
        if let Some(scheme) = DANGEROUS_URL_SCHEMES
            .iter()
            .find(|scheme| lowered.starts_with(**scheme))
        {
            return Err(RejectionReason::DangerousScheme { scheme: *scheme });
        }
        check_command_injection(FIELD, url)
    }

    /// Login name.
    ///
    /// # Errors
    ///
    /// Rejects overlong names, command injection and LDAP filter
    /// metacharacters.
    pub fn validate_username(username: &str) -> Result<(), RejectionReason> {
        const FIELD: &str = "username";
        check_length(FIELD, username, 0, USERNAME_MAX_LEN)?;
        check_command_injection(FIELD, username)?;
        if username.contains(['*', '(', ')', '\\', '/', '\0']) {
            return Err(RejectionReason::LdapInjection { field: FIELD });
        }
        Ok(())
    }
}
