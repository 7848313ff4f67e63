//! Review actions over redaction records.
//!
//! Actions never delete a record. Each one appends a [`RedactionEvent`] and
//! returns a new block list, leaving the caller's list untouched.

use crate::error::{Error, Result};
use crate::model::{block_index, ContentBlock, RecordStatus, RedactionRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of review action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerAction {
    Approve,
    Undo,
    Modify,
}

/// One entry in the action history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionEvent {
    /// Record acted on
    pub record_id: String,
    /// What was done
    pub action: LedgerAction,
    /// Replacement text before the action
    pub before: String,
    /// Text standing in the block after the action
    pub after: String,
    /// When it happened
    pub at: DateTime<Utc>,
}

/// Per-type totals over active records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiSummary {
    pub count: usize,
    pub average_confidence: f32,
}

/// Redaction records of a document plus their review history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedactionLedger {
    records: Vec<RedactionRecord>,
    #[serde(default)]
    history: Vec<RedactionEvent>,
}

impl RedactionLedger {
    /// Create a ledger over freshly produced records.
    pub fn new(records: Vec<RedactionRecord>) -> Self {
        Self {
            records,
            history: Vec::new(),
        }
    }

    /// All records, including reverted ones.
    pub fn records(&self) -> &[RedactionRecord] {
        &self.records
    }

    /// Records still in effect.
    pub fn active(&self) -> impl Iterator<Item = &RedactionRecord> {
        self.records.iter().filter(|r| r.is_active())
    }

    /// Action history, oldest first.
    pub fn history(&self) -> &[RedactionEvent] {
        &self.history
    }

    /// Look up a record.
    pub fn get(&self, record_id: &str) -> Option<&RedactionRecord> {
        self.records.iter().find(|r| r.id == record_id)
    }

    fn position(&self, record_id: &str) -> Result<usize> {
        let idx = self
            .records
            .iter()
            .position(|r| r.id == record_id)
            .ok_or_else(|| Error::RecordNotFound(record_id.to_string()))?;
        if self.records[idx].status == RecordStatus::Reverted {
            return Err(Error::InvalidAction(format!(
                "redaction {} was already undone",
                record_id
            )));
        }
        Ok(idx)
    }

    fn log(&mut self, record_id: &str, action: LedgerAction, before: String, after: String) {
        self.history.push(RedactionEvent {
            record_id: record_id.to_string(),
            action,
            before,
            after,
            at: Utc::now(),
        });
    }

    /// Keep a redaction as it is.
    pub fn approve(&mut self, record_id: &str) -> Result<()> {
        let idx = self.position(record_id)?;
        self.records[idx].status = RecordStatus::Approved;
        let current = self.records[idx].replacement.clone();
        self.log(record_id, LedgerAction::Approve, current.clone(), current);
        Ok(())
    }

    /// Restore the original text of a redaction.
    ///
    /// Replaces the first occurrence of the record's replacement text in the
    /// block's current text. When several records share a placeholder in one
    /// block, the first occurrence may belong to a different record; callers
    /// that need exact restoration should undo in ascending offset order.
    pub fn undo(&mut self, blocks: &[ContentBlock], record_id: &str) -> Result<Vec<ContentBlock>> {
        let idx = self.position(record_id)?;
        let record = &self.records[idx];
        let block_idx = block_index(blocks, &record.block_id)?;

        let text = &blocks[block_idx].text;
        if !text.contains(&record.replacement) {
            return Err(Error::InvalidAction(format!(
                "placeholder {} is no longer present in block {}",
                record.replacement, record.block_id
            )));
        }

        let restored = text.replacen(&record.replacement, &record.original, 1);
        let mut out = blocks.to_vec();
        out[block_idx] = blocks[block_idx].with_text(restored);

        let (before, after) = (record.replacement.clone(), record.original.clone());
        self.records[idx].status = RecordStatus::Reverted;
        self.log(record_id, LedgerAction::Undo, before, after);
        log::debug!("Undid redaction {}", record_id);

        Ok(out)
    }

    /// Replace every occurrence of a record's replacement with `value`.
    ///
    /// The record's `replacement` is updated so later undo targets `value`.
    pub fn modify(
        &mut self,
        blocks: &[ContentBlock],
        record_id: &str,
        value: &str,
    ) -> Result<Vec<ContentBlock>> {
        if value.is_empty() {
            return Err(Error::InvalidAction(
                "replacement text must not be empty".to_string(),
            ));
        }

        let idx = self.position(record_id)?;
        let record = &self.records[idx];
        let block_idx = block_index(blocks, &record.block_id)?;

        let replaced = blocks[block_idx].text.replace(&record.replacement, value);
        let mut out = blocks.to_vec();
        out[block_idx] = blocks[block_idx].with_text(replaced);

        let before = std::mem::replace(&mut self.records[idx].replacement, value.to_string());
        self.log(record_id, LedgerAction::Modify, before, value.to_string());

        Ok(out)
    }

    /// Count and average confidence of active records per type tag.
    pub fn summary(&self) -> BTreeMap<String, PiiSummary> {
        let mut totals: BTreeMap<String, (usize, f32)> = BTreeMap::new();
        for record in self.active() {
            let entry = totals.entry(record.pii_type.tag().to_string()).or_default();
            entry.0 += 1;
            entry.1 += record.confidence;
        }

        totals
            .into_iter()
            .map(|(tag, (count, sum))| {
                (
                    tag,
                    PiiSummary {
                        count,
                        average_confidence: sum / count as f32,
                    },
                )
            })
            .collect()
    }
}
