//! PII detection backends.

use super::options::PiiCategory;
use crate::error::Result;
use crate::model::PiiType;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A detected sensitive span, in character offsets of the analyzed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Start offset (chars, inclusive)
    pub start: usize,
    /// End offset (chars, exclusive)
    pub end: usize,
    /// Category tag
    #[serde(rename = "type")]
    pub pii_type: PiiType,
    /// Detection confidence
    pub confidence: f32,
}

impl Candidate {
    /// Create a candidate.
    pub fn new(start: usize, end: usize, pii_type: impl Into<PiiType>, confidence: f32) -> Self {
        Self {
            start,
            end,
            pii_type: pii_type.into(),
            confidence,
        }
    }

    /// Whether two candidates cover at least one common character.
    pub fn overlaps(&self, other: &Candidate) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Source of PII candidates for a piece of text.
///
/// A backend that cannot be reached reports
/// [`Error::DetectorUnavailable`](crate::Error::DetectorUnavailable); the
/// redactor then leaves the document untouched.
#[async_trait]
pub trait RedactionBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether calls leave the process and should be bounded by a retry policy.
    fn is_remote(&self) -> bool {
        false
    }

    /// Find sensitive spans of the given categories in `text`.
    async fn analyze(&self, text: &str, categories: &[PiiCategory]) -> Result<Vec<Candidate>>;
}

/// Character offset of a byte offset that falls on a char boundary.
pub(crate) fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

struct PatternRule {
    category: PiiCategory,
    regex: Regex,
    /// Capture group holding the sensitive part (0 = whole match)
    group: usize,
    confidence: f32,
    validate: Option<fn(&str) -> bool>,
}

/// Regex-based local detector.
pub struct PatternBackend {
    rules: Vec<PatternRule>,
}

impl PatternBackend {
    /// Create the backend with its built-in rules.
    pub fn new() -> Self {
        let rule = |category, pattern: &str, group, confidence| PatternRule {
            category,
            regex: Regex::new(pattern).unwrap(),
            group,
            confidence,
            validate: None,
        };

        let mut card = rule(
            PiiCategory::PaymentCard,
            r"\b(?:\d[ -]?){12,18}\d\b",
            0,
            0.9,
        );
        card.validate = Some(luhn_valid);

        let rules = vec![
            rule(
                PiiCategory::Email,
                r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
                0,
                0.95,
            ),
            rule(PiiCategory::Phone, r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b", 0, 0.9),
            rule(PiiCategory::Phone, r"\(\d{3}\)\s?\d{3}[-.]\d{4}\b", 0, 0.9),
            rule(PiiCategory::NationalId, r"\b\d{3}-\d{2}-\d{4}\b", 0, 0.85),
            card,
            rule(
                PiiCategory::IpAddress,
                r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b",
                0,
                0.85,
            ),
            rule(
                PiiCategory::Passport,
                r"(?i)\bpassport(?:\s+(?:no\.?|number|#))?\s*[:#]?\s*([A-Z]{0,2}\d{6,9})\b",
                1,
                0.85,
            ),
            rule(
                PiiCategory::DriverLicense,
                r"(?i)\b(?:driver'?s?\s+licen[cs]e|DL)(?:\s+(?:no\.?|number|#))?\s*[:#]?\s*([A-Z]{0,3}\d[A-Z0-9-]{4,14})\b",
                1,
                0.8,
            ),
            rule(
                PiiCategory::PersonName,
                r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.?[ \t]+([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)?)",
                1,
                0.8,
            ),
            rule(
                PiiCategory::PersonName,
                r"\b(?:[Nn]ame|NAME)[ \t]*:[ \t]*([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+){0,2})",
                1,
                0.8,
            ),
        ];

        Self { rules }
    }

    /// Synchronous scan used by the async [`RedactionBackend`] impl.
    pub fn scan(&self, text: &str, categories: &[PiiCategory]) -> Vec<Candidate> {
        let mut out = Vec::new();

        for rule in self.rules.iter().filter(|r| categories.contains(&r.category)) {
            for caps in rule.regex.captures_iter(text) {
                let Some(m) = caps.get(rule.group) else {
                    continue;
                };
                if let Some(validate) = rule.validate {
                    if !validate(m.as_str()) {
                        continue;
                    }
                }
                out.push(Candidate::new(
                    char_offset(text, m.start()),
                    char_offset(text, m.end()),
                    rule.category.pii_type(),
                    rule.confidence,
                ));
            }
        }

        out
    }
}

impl Default for PatternBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RedactionBackend for PatternBackend {
    fn name(&self) -> &str {
        "pattern"
    }

    async fn analyze(&self, text: &str, categories: &[PiiCategory]) -> Result<Vec<Candidate>> {
        Ok(self.scan(text, categories))
    }
}

/// Luhn checksum over the digits of `s`.
fn luhn_valid(s: &str) -> bool {
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}
