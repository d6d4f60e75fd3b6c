//! Keeper notation core.
//!
//! This crate provides:
//! - Input validation for every caller-supplied string
//! - The `ref/kind/payload` notation grammar (parse and build)
//! - A record type catalog and typed field decoders
//! - Sensitivity classification and masking of secret values
//! - Field extraction, and a resolver that ties it to a vault client
//!
//! # Example
//!
//! ```
//! use ksm_core::notation::{parse, build};
//!
//! let locator = parse("UID1234567890123456/custom_field/phone[0][number]").unwrap();
//! assert_eq!(locator.field_name(), Some("phone"));
//! assert_eq!(locator.index(), Some(0));
//! assert_eq!(build(&locator), "UID1234567890123456/custom_field/phone[0][number]");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod extractor;
pub mod masking;
pub mod notation;
pub mod provider;
pub mod record;
pub mod resolver;
pub mod shapes;
pub mod validation;

pub use config::ResolverConfig;
pub use error::{KsmError, KsmResult};
pub use extractor::{ExtractedRecord, FieldExtractor};
pub use notation::{Locator, LocatorKind, RecordRef, Target};
pub use provider::{ClientError, NativeField, VaultClient};
pub use record::{FileAttachment, Record, RecordField};
pub use resolver::{NotationResolver, RecordSummary};
pub use shapes::FieldValue;
pub use validation::{InputValidator, RejectionReason};
