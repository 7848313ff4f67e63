//! # blockweave
//!
//! Turns extracted document content blocks into redacted, annotated,
//! interactive HTML.
//!
//! Three stages run in order over a document's blocks:
//!
//! - **Redactor**: finds sensitive spans (emails, phone numbers, names, ids,
//!   card numbers...) and replaces them with placeholders. Every replacement
//!   is kept as a record that can later be approved, undone or modified.
//! - **Suggestion engine**: runs independent detectors (page vision, table
//!   analysis, list, code and paragraph patterns) and merges them into at
//!   most one suggested component per block.
//! - **Synthesizer**: renders every block with the renderer chosen by the
//!   user's decisions (chart, quiz, code, timeline, map or plain markup) and
//!   assembles a page that only loads the libraries it needs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use blockweave::{load_blocks, Weaver};
//!
//! # async fn demo() -> blockweave::Result<()> {
//! let blocks = load_blocks("blocks.json")?;
//!
//! let pipeline = Weaver::new().auto_approve(true).build();
//! let output = pipeline.run("report", blocks, None).await?;
//! std::fs::write("report.html", &output.synthesis.html)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Reversible redaction**: placeholder records with an action ledger
//! - **Pluggable collaborators**: async traits for PII backends, page
//!   classifiers and table advisors, each with timeout, retry and a local
//!   fallback
//! - **Parallel processing**: Rayon for local detectors and block rendering
//! - **Exports**: themed HTML, Markdown, JSON
//! - **Persistence**: in-memory and directory document stores

pub mod error;
pub mod model;
pub mod pipeline;
pub mod redact;
pub mod remote;
pub mod render;
pub mod store;
pub mod suggest;

// Re-export commonly used types
pub use error::{Error, Result};
pub use model::{
    apply_edits, BlockEdit, BlockKind, ComponentKind, ContentBlock, ConversionOption,
    DecisionSet, DocumentRecord, PiiType, RecordStatus, RedactionRecord, RenderDecision,
    SuggestionRecord, SuggestionSource,
};
pub use pipeline::{Pipeline, PipelineOutput};
pub use redact::{
    PatternBackend, PiiCategory, PiiConfig, Redaction, RedactionBackend, RedactionLedger,
    Redactor,
};
pub use remote::RetryPolicy;
pub use render::{
    AccessibilityOptions, AccessibilityReport, JsonFormat, MarkdownOptions, RenderOptions,
    SynthesisResult, Synthesizer, Theme, WcagLevel, Widget,
};
pub use store::{DirectoryStore, DocumentStore, MemoryStore};
pub use suggest::{
    ImageRef, PageImages, SuggestOptions, SuggestionEngine, TableAdvisor, VisionClassifier,
};

use std::path::Path;
use std::sync::Arc;

/// Parse content blocks from JSON text (an array of blocks).
pub fn parse_blocks(json: &str) -> Result<Vec<ContentBlock>> {
    Ok(serde_json::from_str(json)?)
}

/// Read content blocks from a JSON file.
///
/// # Example
///
/// ```no_run
/// use blockweave::load_blocks;
///
/// let blocks = load_blocks("blocks.json").unwrap();
/// println!("Blocks: {}", blocks.len());
/// ```
pub fn load_blocks<P: AsRef<Path>>(path: P) -> Result<Vec<ContentBlock>> {
    let data = std::fs::read_to_string(path)?;
    parse_blocks(&data)
}

/// Redact blocks with the built-in pattern backend.
///
/// # Example
///
/// ```no_run
/// use blockweave::{redact, BlockKind, ContentBlock, PiiConfig};
///
/// # async fn demo() -> blockweave::Result<()> {
/// let blocks = vec![ContentBlock::new("p1", BlockKind::Paragraph, "Mail ana@example.org")];
/// let redaction = redact(&blocks, &PiiConfig::default()).await?;
/// assert_eq!(redaction.blocks[0].text, "Mail [EMAIL_REDACTED]");
/// # Ok(())
/// # }
/// ```
pub async fn redact(blocks: &[ContentBlock], config: &PiiConfig) -> Result<Redaction> {
    Redactor::new().with_pattern_backend().redact(blocks, config).await
}

/// Suggest components using the local detectors only.
pub async fn suggest(blocks: &[ContentBlock]) -> Vec<SuggestionRecord> {
    SuggestionEngine::new().suggest(blocks, None).await
}

/// Render blocks to an HTML page with default options.
pub fn synthesize(
    blocks: &[ContentBlock],
    suggestions: &[SuggestionRecord],
    decisions: &DecisionSet,
) -> Result<SynthesisResult> {
    Synthesizer::new().synthesize(blocks, suggestions, decisions)
}

/// Convert blocks to Markdown with default options.
pub fn to_markdown(blocks: &[ContentBlock]) -> String {
    render::to_markdown(blocks, &MarkdownOptions::default())
}

/// Convert blocks to JSON.
pub fn to_json(blocks: &[ContentBlock], format: JsonFormat) -> Result<String> {
    render::to_json(blocks, format)
}

/// Builder for a [`Pipeline`].
///
/// # Example
///
/// ```
/// use blockweave::{PiiCategory, PiiConfig, Theme, Weaver};
///
/// let pipeline = Weaver::new()
///     .with_pii(PiiConfig::new().with_category(PiiCategory::PersonName, false))
///     .with_theme(Theme::Academic)
///     .with_title("Lecture notes")
///     .auto_approve(true)
///     .build();
/// assert!(!pipeline.pii_config().is_enabled(PiiCategory::PersonName));
/// ```
pub struct Weaver {
    pii: PiiConfig,
    redaction_backend: Option<Arc<dyn RedactionBackend>>,
    pattern_redaction: bool,
    suggest_options: SuggestOptions,
    vision: Option<Arc<dyn VisionClassifier>>,
    table_advisor: Option<Arc<dyn TableAdvisor>>,
    render_options: RenderOptions,
    retry: Option<RetryPolicy>,
    auto_approve: bool,
    store: Option<Arc<dyn DocumentStore>>,
}

impl Weaver {
    /// Create a new builder: pattern redaction, local detectors, light theme.
    pub fn new() -> Self {
        Self {
            pii: PiiConfig::default(),
            redaction_backend: None,
            pattern_redaction: true,
            suggest_options: SuggestOptions::default(),
            vision: None,
            table_advisor: None,
            render_options: RenderOptions::default(),
            retry: None,
            auto_approve: false,
            store: None,
        }
    }

    /// Set PII categories and threshold.
    pub fn with_pii(mut self, config: PiiConfig) -> Self {
        self.pii = config;
        self
    }

    /// Use a custom PII backend instead of the pattern backend.
    pub fn with_redaction_backend(mut self, backend: Arc<dyn RedactionBackend>) -> Self {
        self.redaction_backend = Some(backend);
        self
    }

    /// Skip redaction when no custom backend is set.
    pub fn without_redaction(mut self) -> Self {
        self.pattern_redaction = false;
        self
    }

    /// Set suggestion options.
    pub fn with_suggest_options(mut self, options: SuggestOptions) -> Self {
        self.suggest_options = options;
        self
    }

    /// Use a page classifier.
    pub fn with_vision(mut self, classifier: Arc<dyn VisionClassifier>) -> Self {
        self.vision = Some(classifier);
        self
    }

    /// Use a table advisor.
    pub fn with_table_advisor(mut self, advisor: Arc<dyn TableAdvisor>) -> Self {
        self.table_advisor = Some(advisor);
        self
    }

    /// Set render options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Set the page theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.render_options = self.render_options.with_theme(theme);
        self
    }

    /// Set the page title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.render_options = self.render_options.with_title(title);
        self
    }

    /// Retry policy for every remote collaborator.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Approve every merged suggestion automatically.
    pub fn auto_approve(mut self, enabled: bool) -> Self {
        self.auto_approve = enabled;
        self
    }

    /// Save documents produced by [`Pipeline::run`].
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Pipeline {
        let mut redactor = Redactor::new();
        if let Some(backend) = self.redaction_backend {
            redactor = redactor.with_backend(backend);
        } else if self.pattern_redaction {
            redactor = redactor.with_pattern_backend();
        }

        let mut suggest_options = self.suggest_options;
        if let Some(retry) = self.retry {
            redactor = redactor.with_retry(retry);
            suggest_options = suggest_options.with_retry(retry);
        }

        let mut engine = SuggestionEngine::with_options(suggest_options);
        if let Some(vision) = self.vision {
            engine = engine.with_vision(vision);
        }
        if let Some(advisor) = self.table_advisor {
            engine = engine.with_table_advisor(advisor);
        }

        Pipeline {
            redactor,
            pii: self.pii,
            engine,
            synthesizer: Synthesizer::with_options(self.render_options),
            auto_approve: self.auto_approve,
            store: self.store,
        }
    }
}

impl Default for Weaver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blocks() {
        let json = r#"[{"id":"b1","kind":"table","text":"A | 1","page":2}]"#;
        let blocks = parse_blocks(json).unwrap();
        assert_eq!(blocks[0].kind, BlockKind::Table);
        assert_eq!(blocks[0].page, 2);
        assert_eq!(blocks[0].confidence, 1.0);

        assert!(matches!(parse_blocks("{"), Err(Error::Json(_))));
    }

    #[tokio::test]
    async fn test_weaver_without_redaction() {
        let pipeline = Weaver::new().without_redaction().build();
        let blocks = vec![ContentBlock::new("p", BlockKind::Paragraph, "ana@example.org")];
        let doc = pipeline.process("d", blocks, None).await.unwrap();
        assert_eq!(doc.blocks[0].text, "ana@example.org");
        assert!(doc.ledger.records().is_empty());
    }

    #[test]
    fn test_top_level_markdown() {
        let blocks = vec![ContentBlock::new("q", BlockKind::Quote, "Stay curious")];
        assert_eq!(to_markdown(&blocks), "> Stay curious");
    }
}
