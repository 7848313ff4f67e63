//! User edits applied to content blocks.

use super::block::{block_index, BlockKind, ContentBlock, USER_EDITED};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A replacement of a block's text and/or kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEdit {
    /// Target block
    pub block_id: String,

    /// Replacement text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Replacement kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<BlockKind>,
}

impl BlockEdit {
    /// Create an edit that changes nothing yet.
    pub fn new(block_id: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
            text: None,
            kind: None,
        }
    }

    /// Replace the block's text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Replace the block's kind.
    pub fn with_kind(mut self, kind: BlockKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Apply edits and return a new block list.
///
/// Text edits reset the block's confidence to 1.0. Every touched block is
/// flagged as user-edited. An edit that references an unknown block fails the
/// whole call and leaves `blocks` untouched.
pub fn apply_edits(blocks: &[ContentBlock], edits: &[BlockEdit]) -> Result<Vec<ContentBlock>> {
    let mut out = blocks.to_vec();

    for edit in edits {
        let idx = block_index(&out, &edit.block_id)?;
        let block = &mut out[idx];

        if let Some(ref text) = edit.text {
            block.text = text.clone();
            block.confidence = 1.0;
        }
        if let Some(kind) = edit.kind {
            block.kind = kind;
        }
        block
            .attributes
            .insert(USER_EDITED.to_string(), Value::Bool(true));

        log::debug!("Applied user edit to block {}", edit.block_id);
    }

    Ok(out)
}
