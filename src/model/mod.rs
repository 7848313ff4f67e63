//! Block model shared by every pipeline stage.
//!
//! Content blocks come from an extraction step. Redaction and suggestion
//! records reference blocks by id, so a block's identity survives text and
//! kind replacement. Stages never mutate a block list in place; they return
//! new lists.

mod block;
mod decision;
mod document;
mod edit;
mod redaction;
mod suggestion;

pub(crate) use block::block_index;
pub use block::{
    find_block, BlockKind, ContentBlock, ALT_TEXT, BOLD, DEFAULT_FONT_SIZE, FONT_SIZE, IMAGE_PATH,
    USER_EDITED,
};
pub use decision::{ConversionOption, DecisionSet, RenderDecision};
pub use document::DocumentRecord;
pub use edit::{apply_edits, BlockEdit};
pub use redaction::{PiiType, RecordStatus, RedactionRecord};
pub use suggestion::{ComponentKind, SuggestionRecord, SuggestionSource};
