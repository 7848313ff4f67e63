//! Content block types.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Attribute key holding the source font size in points.
pub const FONT_SIZE: &str = "font_size";
/// Attribute key holding a bold flag.
pub const BOLD: &str = "bold";
/// Attribute key set once a user has edited the block.
pub const USER_EDITED: &str = "user_edited";
/// Attribute key holding an image path for image blocks.
pub const IMAGE_PATH: &str = "image_path";
/// Attribute key holding alternative text for image blocks.
pub const ALT_TEXT: &str = "alt_text";

/// Font size assumed when a block carries none.
pub const DEFAULT_FONT_SIZE: f64 = 12.0;

/// Structural kind of a content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// Section heading
    Heading,
    /// Running text
    Paragraph,
    /// Pipe-delimited table text
    Table,
    /// Bulleted or numbered list
    List,
    /// Source code
    Code,
    /// Figure or picture
    Image,
    /// Block quotation
    Quote,
}

impl BlockKind {
    /// Every block kind, in declaration order.
    pub const ALL: [BlockKind; 7] = [
        BlockKind::Heading,
        BlockKind::Paragraph,
        BlockKind::Table,
        BlockKind::List,
        BlockKind::Code,
        BlockKind::Image,
        BlockKind::Quote,
    ];

    /// Lowercase name used in serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Heading => "heading",
            BlockKind::Paragraph => "paragraph",
            BlockKind::Table => "table",
            BlockKind::List => "list",
            BlockKind::Code => "code",
            BlockKind::Image => "image",
            BlockKind::Quote => "quote",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_ascii_lowercase();
        BlockKind::ALL
            .into_iter()
            .find(|k| k.as_str() == needle)
            .ok_or_else(|| Error::UnknownBlockKind(s.to_string()))
    }
}

/// A fragment of document content.
///
/// `id` never changes once assigned. `kind` and `text` may be replaced
/// wholesale, producing a new block with the same identity, so redaction and
/// suggestion records keep pointing at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Stable identifier
    pub id: String,

    /// Structural kind
    pub kind: BlockKind,

    /// Current content
    pub text: String,

    /// Zero-based source page index
    #[serde(default)]
    pub page: u32,

    /// Extraction confidence in [0, 1]
    #[serde(default = "default_confidence")]
    pub confidence: f32,

    /// Ancillary metadata (font size, bold flag, user-edited flag)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

fn default_confidence() -> f32 {
    1.0
}

impl ContentBlock {
    /// Create a block on page 0 with full confidence.
    pub fn new(id: impl Into<String>, kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            text: text.into(),
            page: 0,
            confidence: 1.0,
            attributes: BTreeMap::new(),
        }
    }

    /// Set the source page.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Set the extraction confidence, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the font size attribute.
    pub fn with_font_size(self, size: f64) -> Self {
        self.with_attribute(FONT_SIZE, size)
    }

    /// Copy of this block with different text.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }

    /// Font size from attributes, or [`DEFAULT_FONT_SIZE`].
    pub fn font_size(&self) -> f64 {
        self.attributes
            .get(FONT_SIZE)
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_FONT_SIZE)
    }

    /// Whether the block was edited by a user.
    pub fn is_user_edited(&self) -> bool {
        self.attributes
            .get(USER_EDITED)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// String attribute lookup.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Check if the block has no visible text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Locate a block by id.
pub fn find_block<'a>(blocks: &'a [ContentBlock], id: &str) -> Option<&'a ContentBlock> {
    blocks.iter().find(|b| b.id == id)
}

/// Index of a block by id, or [`Error::BlockNotFound`].
pub(crate) fn block_index(blocks: &[ContentBlock], id: &str) -> Result<usize> {
    blocks
        .iter()
        .position(|b| b.id == id)
        .ok_or_else(|| Error::BlockNotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_kind_from_str() {
        assert_eq!("table".parse::<BlockKind>().unwrap(), BlockKind::Table);
        assert_eq!(" Code ".parse::<BlockKind>().unwrap(), BlockKind::Code);
        let err = "sidebar".parse::<BlockKind>().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_block_kind_names_round_trip() {
        for kind in BlockKind::ALL {
            assert_eq!(kind.as_str().parse::<BlockKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_block_builders() {
        let block = ContentBlock::new("h1", BlockKind::Heading, "Intro")
            .with_page(2)
            .with_confidence(1.4)
            .with_font_size(20.0);

        assert_eq!(block.page, 2);
        assert_eq!(block.confidence, 1.0);
        assert_eq!(block.font_size(), 20.0);
        assert!(!block.is_user_edited());
    }

    #[test]
    fn test_block_deserialize_defaults() {
        let block: ContentBlock =
            serde_json::from_str(r#"{"id":"p1","kind":"paragraph","text":"hi"}"#).unwrap();
        assert_eq!(block.page, 0);
        assert_eq!(block.confidence, 1.0);
        assert_eq!(block.font_size(), DEFAULT_FONT_SIZE);
        assert!(block.attributes.is_empty());
    }

    #[test]
    fn test_with_text_keeps_identity() {
        let block = ContentBlock::new("p1", BlockKind::Paragraph, "old").with_page(3);
        let edited = block.with_text("new");
        assert_eq!(edited.id, "p1");
        assert_eq!(edited.page, 3);
        assert_eq!(block.text, "old");
    }

    #[test]
    fn test_block_index() {
        let blocks = vec![
            ContentBlock::new("a", BlockKind::Paragraph, ""),
            ContentBlock::new("b", BlockKind::List, ""),
        ];
        assert_eq!(block_index(&blocks, "b").unwrap(), 1);
        assert!(block_index(&blocks, "z").unwrap_err().is_not_found());
        assert!(find_block(&blocks, "a").is_some());
    }
}
