//! Suggestion engine: independent detectors merged into at most one
//! suggestion per block.
//!
//! Detectors run in two tiers. The optional vision tier classifies whole
//! page images through a remote collaborator; anything it binds to a block
//! wins outright. Every other block is routed by kind to exactly one local
//! detector:
//!
//! | Kind      | Detector                                   |
//! |-----------|--------------------------------------------|
//! | table     | [`TableAnalyzer`] (remote advisor, digit fallback) |
//! | list      | [`ListAnalyzer`]                           |
//! | code      | [`CodeDetector`]                           |
//! | paragraph | [`ParagraphDetector`]                      |
//!
//! Remote failures never reach the caller.

mod patterns;
mod table;
mod vision;

pub use patterns::{
    detect_language, CodeDetector, ListAnalyzer, ParagraphDetector, ParagraphSignals,
    ParagraphThresholds,
};
pub use table::{
    fallback as table_fallback, ChartAdvice, TableAdvisor, TableAnalyzer, FALLBACK_CONFIDENCE,
};
pub use vision::{
    match_detections, page_context, DetectedMap, DetectedQuiz, DetectedTable, DetectedTimeline,
    ImageRef, PageClassification, PageImages, VisionClassifier,
};

use crate::model::{BlockKind, ContentBlock, SuggestionRecord, SuggestionSource};
use crate::remote::{call_remote, RetryPolicy};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Suggestion engine options.
#[derive(Debug, Clone)]
pub struct SuggestOptions {
    /// Run the vision tier when a classifier and page images are present
    pub enable_vision: bool,

    /// Characters of page text sent along with each page image
    pub context_chars: usize,

    /// Retry policy for remote calls
    pub retry: RetryPolicy,

    /// Paragraph detector thresholds
    pub paragraph: ParagraphThresholds,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            enable_vision: true,
            context_chars: 1500,
            retry: RetryPolicy::default(),
            paragraph: ParagraphThresholds::default(),
        }
    }
}

impl SuggestOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the vision tier.
    pub fn with_vision(mut self, enable: bool) -> Self {
        self.enable_vision = enable;
        self
    }

    /// Set the page context length.
    pub fn with_context_chars(mut self, chars: usize) -> Self {
        self.context_chars = chars;
        self
    }

    /// Set the retry policy for remote calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set paragraph detector thresholds.
    pub fn with_paragraph_thresholds(mut self, thresholds: ParagraphThresholds) -> Self {
        self.paragraph = thresholds;
        self
    }
}

/// Suggestion stage.
pub struct SuggestionEngine {
    options: SuggestOptions,
    vision: Option<Arc<dyn VisionClassifier>>,
    tables: TableAnalyzer,
    lists: ListAnalyzer,
    code: CodeDetector,
    paragraphs: ParagraphDetector,
}

impl SuggestionEngine {
    /// Create an engine with local detectors only.
    pub fn new() -> Self {
        Self::with_options(SuggestOptions::default())
    }

    /// Create an engine with custom options.
    pub fn with_options(options: SuggestOptions) -> Self {
        Self {
            tables: TableAnalyzer::new().with_retry(options.retry),
            paragraphs: ParagraphDetector::with_thresholds(options.paragraph.clone()),
            lists: ListAnalyzer::new(),
            code: CodeDetector::new(),
            vision: None,
            options,
        }
    }

    /// Use a remote page classifier.
    pub fn with_vision(mut self, classifier: Arc<dyn VisionClassifier>) -> Self {
        self.vision = Some(classifier);
        self
    }

    /// Use a remote table advisor.
    pub fn with_table_advisor(mut self, advisor: Arc<dyn TableAdvisor>) -> Self {
        self.tables = self.tables.with_advisor(advisor);
        self
    }

    /// Engine options.
    pub fn options(&self) -> &SuggestOptions {
        &self.options
    }

    /// Produce merged suggestions, ordered by block.
    pub async fn suggest(
        &self,
        blocks: &[ContentBlock],
        page_images: Option<&PageImages>,
    ) -> Vec<SuggestionRecord> {
        let mut candidates = match (page_images, self.vision.as_ref()) {
            (Some(images), Some(classifier))
                if self.options.enable_vision && !images.is_empty() =>
            {
                self.run_vision(classifier.as_ref(), blocks, images).await
            }
            _ => Vec::new(),
        };
        let vision_count = candidates.len();

        let claimed: HashSet<&str> = candidates.iter().map(|s| s.block_id.as_str()).collect();
        let open: Vec<&ContentBlock> = blocks
            .iter()
            .filter(|b| !claimed.contains(b.id.as_str()))
            .collect();

        let mut text_candidates: Vec<Option<SuggestionRecord>> =
            open.par_iter().map(|b| self.analyze_local(b)).collect();

        for (slot, block) in text_candidates.iter_mut().zip(&open) {
            if block.kind == BlockKind::Table {
                *slot = self.tables.analyze(block).await;
            }
        }
        candidates.extend(text_candidates.into_iter().flatten());

        let merged = merge_candidates(blocks, candidates);
        log::info!(
            "Suggestions: {} from vision, {} total across {} blocks",
            vision_count,
            merged.len(),
            blocks.len()
        );
        merged
    }

    async fn run_vision(
        &self,
        classifier: &dyn VisionClassifier,
        blocks: &[ContentBlock],
        images: &PageImages,
    ) -> Vec<SuggestionRecord> {
        let mut out = Vec::new();

        for (&page, image) in images {
            let context = page_context(blocks, page, self.options.context_chars);
            let result = call_remote(&self.options.retry, classifier.name(), || {
                classifier.classify_page(image, &context)
            })
            .await;

            match result {
                Ok(classification) => {
                    let classification = classification.without_empty();
                    log::debug!(
                        "Vision page {}: {} detections",
                        page,
                        classification.detection_count()
                    );
                    out.extend(match_detections(blocks, page, &classification));
                }
                Err(e) => {
                    log::warn!("Vision analysis failed for page {}, skipping: {}", page, e);
                }
            }
        }

        out
    }

    /// Local detector for a block, routed by kind. Tables are handled by
    /// the async table analyzer.
    fn analyze_local(&self, block: &ContentBlock) -> Option<SuggestionRecord> {
        match block.kind {
            BlockKind::List => self.lists.analyze(block),
            BlockKind::Code => Some(self.code.analyze(block)),
            BlockKind::Paragraph => self.paragraphs.analyze(block),
            BlockKind::Table | BlockKind::Heading | BlockKind::Image | BlockKind::Quote => None,
        }
    }
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Reduce candidates to at most one suggestion per block.
///
/// A vision candidate beats every other candidate for its block. Otherwise
/// the first candidate in input order wins. Candidates recommending
/// [`ComponentKind::None`](crate::model::ComponentKind::None) or naming an
/// unknown block are dropped. Output follows block order.
pub fn merge_candidates(
    blocks: &[ContentBlock],
    candidates: Vec<SuggestionRecord>,
) -> Vec<SuggestionRecord> {
    let mut chosen: HashMap<String, SuggestionRecord> = HashMap::new();

    for candidate in candidates {
        if candidate.kind == crate::model::ComponentKind::None {
            continue;
        }
        match chosen.get(&candidate.block_id) {
            Some(existing)
                if existing.source == SuggestionSource::Vision
                    || candidate.source != SuggestionSource::Vision => {}
            _ => {
                chosen.insert(candidate.block_id.clone(), candidate);
            }
        }
    }

    blocks.iter().filter_map(|b| chosen.remove(&b.id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::model::ComponentKind;
    use async_trait::async_trait;

    fn doc() -> Vec<ContentBlock> {
        vec![
            ContentBlock::new("h", BlockKind::Heading, "Quarterly report"),
            ContentBlock::new("t", BlockKind::Table, "Region | Revenue\nEast | 500"),
            ContentBlock::new("l", BlockKind::List, "Which is larger?\na) East\nb) West"),
            ContentBlock::new("c", BlockKind::Code, "def total(xs):\n    return sum(xs)"),
            ContentBlock::new("p", BlockKind::Paragraph, "Nothing remarkable here."),
        ]
    }

    #[test]
    fn test_merge_vision_precedence() {
        let blocks = doc();
        let candidates = vec![
            SuggestionRecord::new("l", ComponentKind::Quiz, 0.8, SuggestionSource::ListAnalyzer),
            SuggestionRecord::new("l", ComponentKind::Timeline, 0.5, SuggestionSource::Vision),
            SuggestionRecord::new("l", ComponentKind::Map, 0.9, SuggestionSource::Vision),
            SuggestionRecord::new(
                "t",
                ComponentKind::ChartBar,
                0.6,
                SuggestionSource::TableAnalyzer,
            ),
            SuggestionRecord::new("t", ComponentKind::ChartPie, 0.9, SuggestionSource::TextPattern),
            SuggestionRecord::new("ghost", ComponentKind::Quiz, 0.9, SuggestionSource::Vision),
            SuggestionRecord::new("p", ComponentKind::None, 0.9, SuggestionSource::TextPattern),
        ];
        let merged = merge_candidates(&blocks, candidates);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].block_id, "t");
        assert_eq!(merged[0].kind, ComponentKind::ChartBar);
        assert_eq!(merged[1].block_id, "l");
        assert_eq!(merged[1].source, SuggestionSource::Vision);
        assert_eq!(merged[1].kind, ComponentKind::Timeline);
    }

    #[tokio::test]
    async fn test_local_only() {
        let blocks = doc();
        let suggestions = SuggestionEngine::new().suggest(&blocks, None).await;

        let by_id: HashMap<&str, &SuggestionRecord> =
            suggestions.iter().map(|s| (s.block_id.as_str(), s)).collect();
        assert_eq!(by_id["t"].kind, ComponentKind::ChartBar);
        assert_eq!(by_id["l"].kind, ComponentKind::Quiz);
        assert_eq!(by_id["c"].config_str("language"), Some("python"));
        assert!(!by_id.contains_key("h"));
        assert!(!by_id.contains_key("p"));
        assert!(suggestions.iter().all(|s| s.source != SuggestionSource::Vision));
    }

    struct FlakyVision;

    #[async_trait]
    impl VisionClassifier for FlakyVision {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn classify_page(
            &self,
            image: &ImageRef,
            _context: &str,
        ) -> Result<PageClassification> {
            if image.location.ends_with("broken.png") {
                return Err(Error::DetectorUnavailable("503".into()));
            }
            Ok(PageClassification {
                timelines: vec![DetectedTimeline { event_count: 3 }],
                ..Default::default()
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_vision_failure_skips_page_only() {
        let mut blocks = doc();
        blocks.push(
            ContentBlock::new("p2", BlockKind::Paragraph, "Another page.").with_page(1),
        );
        let mut images = PageImages::new();
        images.insert(0, ImageRef::new("page0-broken.png"));
        images.insert(1, ImageRef::new("page1.png"));

        let engine = SuggestionEngine::new().with_vision(Arc::new(FlakyVision));
        let suggestions = engine.suggest(&blocks, Some(&images)).await;

        let p2 = suggestions.iter().find(|s| s.block_id == "p2").unwrap();
        assert_eq!(p2.source, SuggestionSource::Vision);
        assert_eq!(p2.kind, ComponentKind::Timeline);
        // Page 0 still gets local suggestions
        assert!(suggestions.iter().any(|s| s.block_id == "l"));
    }

    #[tokio::test]
    async fn test_vision_disabled_by_option() {
        let mut images = PageImages::new();
        images.insert(0, ImageRef::new("page0.png"));

        let engine = SuggestionEngine::with_options(SuggestOptions::new().with_vision(false))
            .with_vision(Arc::new(FlakyVision));
        let suggestions = engine.suggest(&doc(), Some(&images)).await;
        assert!(suggestions.iter().all(|s| s.source != SuggestionSource::Vision));
    }
}
