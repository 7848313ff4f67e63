//! Error types for blockweave library.

use std::io;
use thiserror::Error;

/// Result type alias for blockweave operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while redacting, annotating or rendering blocks.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A redaction backend or remote classifier is missing or unreachable.
    #[error("Detector unavailable: {0}")]
    DetectorUnavailable(String),

    /// A remote call did not finish within its time budget.
    #[error("{operation} timed out after {millis} ms")]
    Timeout {
        /// What was being awaited
        operation: String,
        /// Elapsed budget in milliseconds
        millis: u64,
    },

    /// A block's text cannot be parsed by a specific renderer.
    #[error("Malformed content in block {block_id}: {reason}")]
    MalformedContent {
        /// Offending block
        block_id: String,
        /// Why the renderer rejected it
        reason: String,
    },

    /// Referenced block does not exist.
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    /// Referenced redaction record does not exist.
    #[error("Redaction record not found: {0}")]
    RecordNotFound(String),

    /// Referenced document does not exist in the store.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Unknown PII category name.
    #[error("Unknown PII category: {0}")]
    UnknownPiiCategory(String),

    /// Unknown suggestion component kind.
    #[error("Unknown component kind: {0}")]
    UnknownComponentKind(String),

    /// Unknown content block kind.
    #[error("Unknown block kind: {0}")]
    UnknownBlockKind(String),

    /// Unknown table conversion option.
    #[error("Unknown conversion option: {0}")]
    UnknownConversion(String),

    /// Unknown output theme.
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    /// The requested action is not valid for the target's current state.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Error during rendering (HTML, Markdown, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a [`Error::MalformedContent`] for a block.
    pub fn malformed(block_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedContent {
            block_id: block_id.into(),
            reason: reason.into(),
        }
    }

    /// True for references to a block, record or document that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::BlockNotFound(_) | Error::RecordNotFound(_) | Error::DocumentNotFound(_)
        )
    }

    /// True for unknown category, kind or option names and rejected actions.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownPiiCategory(_)
                | Error::UnknownComponentKind(_)
                | Error::UnknownBlockKind(_)
                | Error::UnknownConversion(_)
                | Error::UnknownTheme(_)
                | Error::InvalidAction(_)
        )
    }

    /// True for failures a stage absorbs with a local fallback.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::DetectorUnavailable(_) | Error::Timeout { .. } | Error::MalformedContent { .. }
        )
    }
}
