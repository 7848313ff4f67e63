//! Document-level types.

use super::{apply_edits, BlockEdit, ContentBlock, DecisionSet, SuggestionRecord};
use crate::error::Result;
use crate::redact::RedactionLedger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything kept for one document between pipeline calls.
///
/// `original_blocks` is the extraction output and is never modified; every
/// stage can be re-run from it. `blocks` is the working (redacted, edited)
/// set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Document identifier
    pub id: String,

    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Blocks as produced by extraction
    pub original_blocks: Vec<ContentBlock>,

    /// Working blocks
    pub blocks: Vec<ContentBlock>,

    /// Redaction records and their action history
    #[serde(default)]
    pub ledger: RedactionLedger,

    /// Merged suggestions
    #[serde(default)]
    pub suggestions: Vec<SuggestionRecord>,

    /// Render decisions
    #[serde(default)]
    pub decisions: DecisionSet,

    /// Last rendered markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,

    /// Creation time
    pub created: DateTime<Utc>,

    /// Last modification time
    pub modified: DateTime<Utc>,
}

impl DocumentRecord {
    /// Create a record from freshly extracted blocks.
    pub fn new(id: impl Into<String>, blocks: Vec<ContentBlock>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: None,
            original_blocks: blocks.clone(),
            blocks,
            ledger: RedactionLedger::default(),
            suggestions: Vec::new(),
            decisions: DecisionSet::default(),
            markup: None,
            created: now,
            modified: now,
        }
    }

    /// Set the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Update the modification time.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    /// Keep a redaction as it is.
    pub fn approve_redaction(&mut self, record_id: &str) -> Result<()> {
        self.ledger.approve(record_id)?;
        self.touch();
        Ok(())
    }

    /// Restore the original text of a redaction in the working blocks.
    pub fn undo_redaction(&mut self, record_id: &str) -> Result<()> {
        self.blocks = self.ledger.undo(&self.blocks, record_id)?;
        self.markup = None;
        self.touch();
        Ok(())
    }

    /// Change the replacement text of a redaction in the working blocks.
    pub fn modify_redaction(&mut self, record_id: &str, value: &str) -> Result<()> {
        self.blocks = self.ledger.modify(&self.blocks, record_id, value)?;
        self.markup = None;
        self.touch();
        Ok(())
    }

    /// Apply user edits to the working blocks.
    ///
    /// Suggestions are kept; re-run the suggestion stage to refresh them.
    pub fn edit_blocks(&mut self, edits: &[BlockEdit]) -> Result<()> {
        self.blocks = apply_edits(&self.blocks, edits)?;
        self.markup = None;
        self.touch();
        Ok(())
    }

    /// Drop every derived artifact and restore the extracted blocks.
    pub fn reset(&mut self) {
        self.blocks = self.original_blocks.clone();
        self.ledger = RedactionLedger::default();
        self.suggestions.clear();
        self.decisions = DecisionSet::default();
        self.markup = None;
        self.touch();
    }
}
