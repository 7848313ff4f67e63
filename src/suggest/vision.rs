//! Page-image classification and matching of detections to blocks.

use crate::error::Result;
use crate::model::{BlockKind, ComponentKind, ContentBlock, SuggestionRecord, SuggestionSource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Reference to a rendered page image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Path or URL of the image
    pub location: String,

    /// MIME type, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl ImageRef {
    /// Create an image reference from a path or URL.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            media_type: None,
        }
    }
}

/// Page images keyed by zero-based page index.
pub type PageImages = BTreeMap<u32, ImageRef>;

fn default_chart_type() -> String {
    "bar".to_string()
}

fn default_quiz_type() -> String {
    "multiple_choice".to_string()
}

/// A table the classifier considers chartable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedTable {
    #[serde(default = "default_chart_type")]
    pub chart_type: String,
    #[serde(default)]
    pub data_summary: String,
}

/// A run of questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedQuiz {
    #[serde(default)]
    pub question_count: u32,
    #[serde(rename = "type", default = "default_quiz_type")]
    pub quiz_type: String,
}

/// A sequence of dated events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedTimeline {
    #[serde(default)]
    pub event_count: u32,
}

/// A set of geographic references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedMap {
    #[serde(default)]
    pub location_count: u32,
}

/// Coarse classification of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageClassification {
    pub tables: Vec<DetectedTable>,
    pub quizzes: Vec<DetectedQuiz>,
    pub timelines: Vec<DetectedTimeline>,
    pub maps: Vec<DetectedMap>,
    /// Overall confidence; per-item defaults apply when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub description: String,
}

impl PageClassification {
    /// Drop quiz, timeline and map detections with a zero count.
    pub fn without_empty(mut self) -> Self {
        self.quizzes.retain(|q| q.question_count > 0);
        self.timelines.retain(|t| t.event_count > 0);
        self.maps.retain(|m| m.location_count > 0);
        self
    }

    /// Total number of detections.
    pub fn detection_count(&self) -> usize {
        self.tables.len() + self.quizzes.len() + self.timelines.len() + self.maps.len()
    }
}

/// Remote classifier that inspects a page image plus its extracted text.
#[async_trait]
pub trait VisionClassifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Classify one page.
    async fn classify_page(&self, image: &ImageRef, context: &str) -> Result<PageClassification>;
}

/// Concatenated text of a page, truncated to `max_chars` characters.
pub fn page_context(blocks: &[ContentBlock], page: u32, max_chars: usize) -> String {
    let text = blocks
        .iter()
        .filter(|b| b.page == page)
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    text.chars().take(max_chars).collect()
}

/// Bind a page's detections to blocks on that page.
///
/// Each detection goes to the first block in document order whose kind
/// matches and which no earlier detection on the page has taken. Tables
/// match table blocks, quizzes match lists, timelines match lists or
/// paragraphs, maps match paragraphs, lists, tables or quotes. Detections
/// without a free block are dropped.
pub fn match_detections(
    blocks: &[ContentBlock],
    page: u32,
    classification: &PageClassification,
) -> Vec<SuggestionRecord> {
    let page_blocks: Vec<&ContentBlock> = blocks.iter().filter(|b| b.page == page).collect();
    let mut taken: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();

    let mut claim = |kinds: &[BlockKind]| -> Option<String> {
        let block: &ContentBlock = page_blocks
            .iter()
            .copied()
            .find(|b| kinds.contains(&b.kind) && !taken.contains(b.id.as_str()))?;
        taken.insert(block.id.as_str());
        Some(block.id.clone())
    };

    let confidence = |default: f32| classification.confidence.unwrap_or(default);
    let vision = |id: String, kind, confidence| {
        SuggestionRecord::new(id, kind, confidence, SuggestionSource::Vision)
            .with_config("source", "vision")
    };

    for table in &classification.tables {
        if let Some(id) = claim(&[BlockKind::Table]) {
            out.push(
                vision(id, ComponentKind::chart_from_type(&table.chart_type), confidence(0.8))
                    .with_config("data_summary", table.data_summary.clone()),
            );
        }
    }

    for quiz in &classification.quizzes {
        if let Some(id) = claim(&[BlockKind::List]) {
            out.push(
                vision(id, ComponentKind::Quiz, confidence(0.8))
                    .with_config("type", quiz.quiz_type.clone())
                    .with_config("question_count", quiz.question_count),
            );
        }
    }

    for timeline in &classification.timelines {
        if let Some(id) = claim(&[BlockKind::List, BlockKind::Paragraph]) {
            out.push(
                vision(id, ComponentKind::Timeline, confidence(0.75))
                    .with_config("event_count", timeline.event_count),
            );
        }
    }

    for map in &classification.maps {
        let kinds = [
            BlockKind::Paragraph,
            BlockKind::List,
            BlockKind::Table,
            BlockKind::Quote,
        ];
        if let Some(id) = claim(&kinds) {
            out.push(
                vision(id, ComponentKind::Map, confidence(0.75))
                    .with_config("location_count", map.location_count),
            );
        }
    }

    out
}
