//! Reversible, offset-stable redaction of sensitive spans.
//!
//! The [`Redactor`] asks a [`RedactionBackend`] for candidate spans per
//! block and replaces them back-to-front, so every [`RedactionRecord`] keeps
//! the offsets of the text as it was before redaction. A missing or
//! unreachable backend leaves the document unchanged.

mod backend;
mod ledger;
mod options;

pub use backend::{Candidate, PatternBackend, RedactionBackend};
pub use ledger::{LedgerAction, PiiSummary, RedactionEvent, RedactionLedger};
pub use options::{PiiCategory, PiiConfig, DEFAULT_THRESHOLD};

use crate::error::Result;
use crate::model::{ContentBlock, RedactionRecord};
use crate::remote::{call_remote, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Output of a redaction pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Redaction {
    /// Redacted copies of the input blocks, in input order
    pub blocks: Vec<ContentBlock>,
    /// One record per applied replacement
    pub records: Vec<RedactionRecord>,
}

impl Redaction {
    /// Input blocks returned unchanged with no records.
    pub fn unchanged(blocks: &[ContentBlock]) -> Self {
        Self {
            blocks: blocks.to_vec(),
            records: Vec::new(),
        }
    }

    /// Start a ledger over the produced records.
    pub fn ledger(&self) -> RedactionLedger {
        RedactionLedger::new(self.records.clone())
    }
}

/// Redaction stage.
#[derive(Clone, Default)]
pub struct Redactor {
    backend: Option<Arc<dyn RedactionBackend>>,
    retry: RetryPolicy,
}

impl Redactor {
    /// Create a redactor without a backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a detection backend.
    pub fn with_backend(mut self, backend: Arc<dyn RedactionBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use the built-in regex backend.
    pub fn with_pattern_backend(self) -> Self {
        self.with_backend(Arc::new(PatternBackend::new()))
    }

    /// Retry policy for remote backends.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether a backend is configured.
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Redact every block.
    ///
    /// A missing backend, or any backend failure such as being unreachable,
    /// timing out or returning an unreadable response, yields the input
    /// blocks with no records. Configuration and not-found errors are
    /// returned.
    pub async fn redact(&self, blocks: &[ContentBlock], config: &PiiConfig) -> Result<Redaction> {
        let Some(backend) = self.backend.as_ref() else {
            log::debug!("No PII backend configured, skipping redaction");
            return Ok(Redaction::unchanged(blocks));
        };

        let categories = config.categories();
        let mut out = Redaction::default();

        for block in blocks {
            if block.is_empty() {
                out.blocks.push(block.clone());
                continue;
            }

            let analyzed = if backend.is_remote() {
                call_remote(&self.retry, backend.name(), || {
                    backend.analyze(&block.text, &categories)
                })
                .await
            } else {
                backend.analyze(&block.text, &categories).await
            };

            let candidates = match analyzed {
                Ok(candidates) => candidates,
                Err(e) if e.is_configuration() || e.is_not_found() => return Err(e),
                Err(e) => {
                    log::warn!(
                        "PII backend '{}' failed, leaving document unredacted: {}",
                        backend.name(),
                        e
                    );
                    return Ok(Redaction::unchanged(blocks));
                }
            };

            let (redacted, records) = apply_candidates(block, &candidates, config.threshold);
            out.blocks.push(redacted);
            out.records.extend(records);
        }

        log::info!(
            "Redacted {} spans across {} blocks",
            out.records.len(),
            out.blocks.len()
        );
        Ok(out)
    }
}

/// Apply candidates to one block.
///
/// Candidates below `threshold`, with an empty or out-of-range span, or
/// overlapping a span already applied are discarded. The rest are replaced
/// in descending start order, so each record's `(start, end)` indexes the
/// original text. Records are returned in ascending start order.
pub fn apply_candidates(
    block: &ContentBlock,
    candidates: &[Candidate],
    threshold: f32,
) -> (ContentBlock, Vec<RedactionRecord>) {
    let original: Vec<char> = block.text.chars().collect();

    let mut accepted: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.confidence >= threshold && c.start < c.end && c.end <= original.len())
        .collect();
    accepted.sort_by(|a, b| {
        b.start
            .cmp(&a.start)
            .then(b.confidence.total_cmp(&a.confidence))
            .then((b.end - b.start).cmp(&(a.end - a.start)))
    });

    let mut text = original.clone();
    let mut floor = usize::MAX;
    let mut records = Vec::new();

    for candidate in accepted {
        if candidate.end > floor {
            log::debug!(
                "Skipping overlapping {} span {}..{} in block {}",
                candidate.pii_type,
                candidate.start,
                candidate.end,
                block.id
            );
            continue;
        }

        let record = RedactionRecord::new(
            block.id.clone(),
            candidate.pii_type.clone(),
            original[candidate.start..candidate.end].iter().collect::<String>(),
            candidate.start,
            candidate.end,
            candidate.confidence,
        );
        text.splice(candidate.start..candidate.end, record.replacement.chars());
        floor = candidate.start;
        records.push(record);
    }

    records.reverse();
    (block.with_text(text.into_iter().collect::<String>()), records)
}
