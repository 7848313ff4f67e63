//! Redaction record types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Category of a sensitive span.
///
/// Serialized as the upper-case tag used by detection backends
/// (`EMAIL_ADDRESS`, `US_SSN`, ...). Tags this crate does not know are kept
/// verbatim in [`PiiType::Other`] and redact to the generic placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PiiType {
    EmailAddress,
    PhoneNumber,
    Person,
    NationalId,
    PaymentCard,
    IpAddress,
    Passport,
    DriverLicense,
    DateTime,
    Location,
    Other(String),
}

impl PiiType {
    /// Backend tag for this category.
    pub fn tag(&self) -> &str {
        match self {
            PiiType::EmailAddress => "EMAIL_ADDRESS",
            PiiType::PhoneNumber => "PHONE_NUMBER",
            PiiType::Person => "PERSON",
            PiiType::NationalId => "US_SSN",
            PiiType::PaymentCard => "CREDIT_CARD",
            PiiType::IpAddress => "IP_ADDRESS",
            PiiType::Passport => "US_PASSPORT",
            PiiType::DriverLicense => "US_DRIVER_LICENSE",
            PiiType::DateTime => "DATE_TIME",
            PiiType::Location => "LOCATION",
            PiiType::Other(tag) => tag,
        }
    }

    /// Bracketed placeholder substituted for spans of this category.
    pub fn placeholder(&self) -> &'static str {
        match self {
            PiiType::EmailAddress => "[EMAIL_REDACTED]",
            PiiType::PhoneNumber => "[PHONE_REDACTED]",
            PiiType::Person => "[NAME_REDACTED]",
            PiiType::NationalId => "[SSN_REDACTED]",
            PiiType::PaymentCard => "[CARD_REDACTED]",
            PiiType::IpAddress => "[IP_REDACTED]",
            PiiType::Passport => "[PASSPORT_REDACTED]",
            PiiType::DriverLicense => "[LICENSE_REDACTED]",
            PiiType::DateTime => "[DATE_REDACTED]",
            PiiType::Location => "[LOCATION_REDACTED]",
            PiiType::Other(_) => "[REDACTED]",
        }
    }
}

impl From<String> for PiiType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "EMAIL_ADDRESS" | "EMAIL" => PiiType::EmailAddress,
            "PHONE_NUMBER" | "PHONE" => PiiType::PhoneNumber,
            "PERSON" => PiiType::Person,
            "US_SSN" => PiiType::NationalId,
            "CREDIT_CARD" => PiiType::PaymentCard,
            "IP_ADDRESS" => PiiType::IpAddress,
            "US_PASSPORT" => PiiType::Passport,
            "US_DRIVER_LICENSE" => PiiType::DriverLicense,
            "DATE_TIME" => PiiType::DateTime,
            "LOCATION" => PiiType::Location,
            _ => PiiType::Other(tag),
        }
    }
}

impl From<&str> for PiiType {
    fn from(tag: &str) -> Self {
        PiiType::from(tag.to_string())
    }
}

impl From<PiiType> for String {
    fn from(t: PiiType) -> Self {
        t.tag().to_string()
    }
}

impl fmt::Display for PiiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Review state of a redaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Applied, not yet reviewed
    #[default]
    Pending,
    /// Reviewed and kept
    Approved,
    /// Undone; the original text was restored
    Reverted,
}

/// One reversible replacement of a sensitive span.
///
/// `start` and `end` are character offsets into the block's text as it was
/// before redaction, so `original` always equals that slice of the
/// pre-redaction text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionRecord {
    /// Record identifier
    pub id: String,

    /// Block the span was found in
    pub block_id: String,

    /// Category tag
    pub pii_type: PiiType,

    /// Source substring
    pub original: String,

    /// Text currently standing in for `original`
    pub replacement: String,

    /// Start offset (chars, inclusive)
    pub start: usize,

    /// End offset (chars, exclusive)
    pub end: usize,

    /// Detection confidence
    pub confidence: f32,

    /// Review state
    #[serde(default)]
    pub status: RecordStatus,
}

impl RedactionRecord {
    /// Create a pending record with a fresh id and the category placeholder.
    pub fn new(
        block_id: impl Into<String>,
        pii_type: PiiType,
        original: impl Into<String>,
        start: usize,
        end: usize,
        confidence: f32,
    ) -> Self {
        let replacement = pii_type.placeholder().to_string();
        Self {
            id: Uuid::new_v4().to_string(),
            block_id: block_id.into(),
            pii_type,
            original: original.into(),
            replacement,
            start,
            end,
            confidence,
            status: RecordStatus::Pending,
        }
    }

    /// Length of the span in characters.
    pub fn span_len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the replacement is still in effect.
    pub fn is_active(&self) -> bool {
        self.status != RecordStatus::Reverted
    }
}
