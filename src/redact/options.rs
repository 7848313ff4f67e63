//! PII detection configuration.

use crate::error::{Error, Result};
use crate::model::PiiType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Default minimum confidence for a candidate to be redacted.
pub const DEFAULT_THRESHOLD: f32 = 0.7;

/// A detectable category of sensitive text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PiiCategory {
    /// Email addresses (toggleable)
    Email,
    /// Phone numbers (toggleable)
    Phone,
    /// Personal names (toggleable)
    PersonName,
    /// Social security and similar national ids (toggleable)
    NationalId,
    /// Credit and debit card numbers (toggleable)
    PaymentCard,
    /// IP addresses (always on)
    IpAddress,
    /// Passport numbers (always on)
    Passport,
    /// Driver-license numbers (always on)
    DriverLicense,
}

impl PiiCategory {
    /// Categories a caller may switch on and off.
    pub const TOGGLEABLE: [PiiCategory; 5] = [
        PiiCategory::Email,
        PiiCategory::Phone,
        PiiCategory::PersonName,
        PiiCategory::NationalId,
        PiiCategory::PaymentCard,
    ];

    /// Categories that are scanned regardless of configuration.
    pub const ALWAYS_ON: [PiiCategory; 3] = [
        PiiCategory::IpAddress,
        PiiCategory::Passport,
        PiiCategory::DriverLicense,
    ];

    /// Kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PiiCategory::Email => "email",
            PiiCategory::Phone => "phone",
            PiiCategory::PersonName => "person-name",
            PiiCategory::NationalId => "national-id",
            PiiCategory::PaymentCard => "payment-card",
            PiiCategory::IpAddress => "ip-address",
            PiiCategory::Passport => "passport",
            PiiCategory::DriverLicense => "driver-license",
        }
    }

    /// Record type produced for spans of this category.
    pub fn pii_type(&self) -> PiiType {
        match self {
            PiiCategory::Email => PiiType::EmailAddress,
            PiiCategory::Phone => PiiType::PhoneNumber,
            PiiCategory::PersonName => PiiType::Person,
            PiiCategory::NationalId => PiiType::NationalId,
            PiiCategory::PaymentCard => PiiType::PaymentCard,
            PiiCategory::IpAddress => PiiType::IpAddress,
            PiiCategory::Passport => PiiType::Passport,
            PiiCategory::DriverLicense => PiiType::DriverLicense,
        }
    }

    /// Whether callers may disable this category.
    pub fn is_toggleable(&self) -> bool {
        PiiCategory::TOGGLEABLE.contains(self)
    }
}

impl FromStr for PiiCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "email" | "email-address" => Ok(PiiCategory::Email),
            "phone" | "phone-number" => Ok(PiiCategory::Phone),
            "person-name" | "person" | "name" => Ok(PiiCategory::PersonName),
            "national-id" | "ssn" | "us-ssn" => Ok(PiiCategory::NationalId),
            "payment-card" | "credit-card" => Ok(PiiCategory::PaymentCard),
            "ip-address" | "ip" => Ok(PiiCategory::IpAddress),
            "passport" | "us-passport" => Ok(PiiCategory::Passport),
            "driver-license" | "us-driver-license" => Ok(PiiCategory::DriverLicense),
            _ => Err(Error::UnknownPiiCategory(s.to_string())),
        }
    }
}

/// Which categories to scan for and how confident a detection must be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiConfig {
    /// Enabled toggleable categories
    enabled: BTreeSet<PiiCategory>,

    /// Minimum candidate confidence
    pub threshold: f32,
}

impl Default for PiiConfig {
    fn default() -> Self {
        Self {
            enabled: PiiCategory::TOGGLEABLE.into_iter().collect(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl PiiConfig {
    /// All toggleable categories enabled, threshold 0.7.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the always-on categories.
    pub fn none() -> Self {
        Self {
            enabled: BTreeSet::new(),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Enable exactly the named toggleable categories.
    ///
    /// Names of always-on categories are accepted and ignored; unknown names
    /// are a configuration error.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut config = Self::none();
        for name in names {
            let category: PiiCategory = name.as_ref().parse()?;
            config = config.with_category(category, true);
        }
        Ok(config)
    }

    /// Toggle a category. Always-on categories cannot be disabled.
    pub fn with_category(mut self, category: PiiCategory, enabled: bool) -> Self {
        if category.is_toggleable() {
            if enabled {
                self.enabled.insert(category);
            } else {
                self.enabled.remove(&category);
            }
        }
        self
    }

    /// Set the detection threshold, clamped to [0, 1].
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Whether a category will be scanned.
    pub fn is_enabled(&self, category: PiiCategory) -> bool {
        !category.is_toggleable() || self.enabled.contains(&category)
    }

    /// Every category that will be scanned, toggleable first.
    pub fn categories(&self) -> Vec<PiiCategory> {
        self.enabled
            .iter()
            .copied()
            .chain(PiiCategory::ALWAYS_ON)
            .collect()
    }
}
