//! The three stages chained over one document.

use crate::error::{Error, Result};
use crate::model::{ContentBlock, DecisionSet, DocumentRecord};
use crate::redact::{PiiConfig, Redactor};
use crate::render::{SynthesisResult, Synthesizer};
use crate::store::DocumentStore;
use crate::suggest::{PageImages, SuggestionEngine};
use std::sync::Arc;

/// Output of [`Pipeline::run`].
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Document state after all stages
    pub document: DocumentRecord,
    /// Rendered page
    pub synthesis: SynthesisResult,
}

/// Redactor, suggestion engine and synthesizer with their configuration.
///
/// A pipeline holds no per-document state, so one `Arc<Pipeline>` can serve
/// many documents concurrently.
pub struct Pipeline {
    pub(crate) redactor: Redactor,
    pub(crate) pii: PiiConfig,
    pub(crate) engine: SuggestionEngine,
    pub(crate) synthesizer: Synthesizer,
    pub(crate) auto_approve: bool,
    pub(crate) store: Option<Arc<dyn DocumentStore>>,
}

impl Pipeline {
    /// Pipeline with the pattern PII backend, local detectors and default
    /// rendering.
    pub fn new() -> Self {
        Self {
            redactor: Redactor::new().with_pattern_backend(),
            pii: PiiConfig::default(),
            engine: SuggestionEngine::new(),
            synthesizer: Synthesizer::new(),
            auto_approve: false,
            store: None,
        }
    }

    /// PII settings used by [`Pipeline::process`].
    pub fn pii_config(&self) -> &PiiConfig {
        &self.pii
    }

    /// Attached document store, if any.
    pub fn store(&self) -> Option<&Arc<dyn DocumentStore>> {
        self.store.as_ref()
    }

    /// Redact and annotate freshly extracted blocks.
    pub async fn process(
        &self,
        id: &str,
        blocks: Vec<ContentBlock>,
        page_images: Option<&PageImages>,
    ) -> Result<DocumentRecord> {
        let redaction = self.redactor.redact(&blocks, &self.pii).await?;
        let mut doc = DocumentRecord::new(id, blocks);
        doc.ledger = redaction.ledger();
        doc.blocks = redaction.blocks;

        self.annotate(&mut doc, page_images).await;
        Ok(doc)
    }

    /// Recompute the document's suggestions from its working blocks.
    pub async fn annotate(&self, doc: &mut DocumentRecord, page_images: Option<&PageImages>) {
        doc.suggestions = self.engine.suggest(&doc.blocks, page_images).await;
        if self.auto_approve {
            doc.decisions = DecisionSet::new().approve_all(&doc.suggestions);
        }
        doc.touch();
    }

    /// Render the document with its current decisions and keep the markup.
    pub fn render(&self, doc: &mut DocumentRecord) -> Result<SynthesisResult> {
        let result = self
            .synthesizer
            .synthesize(&doc.blocks, &doc.suggestions, &doc.decisions)?;
        doc.markup = Some(result.html.clone());
        doc.touch();
        Ok(result)
    }

    /// Process, render and, with a store attached, save a document.
    pub async fn run(
        &self,
        id: &str,
        blocks: Vec<ContentBlock>,
        page_images: Option<&PageImages>,
    ) -> Result<PipelineOutput> {
        let mut document = self.process(id, blocks, page_images).await?;
        let synthesis = self.render(&mut document)?;
        if let Some(store) = &self.store {
            store.save(&document)?;
        }
        log::info!(
            "Document {}: {} redactions, {} suggestions, {} widgets",
            id,
            document.ledger.records().len(),
            document.suggestions.len(),
            synthesis.stats.interactive_count()
        );
        Ok(PipelineOutput {
            document,
            synthesis,
        })
    }

    /// Load a stored document, apply `update`, render and save it again.
    pub fn rerender<F>(&self, id: &str, update: F) -> Result<SynthesisResult>
    where
        F: FnOnce(&mut DocumentRecord) -> Result<()>,
    {
        let Some(store) = &self.store else {
            return Err(Error::Other("no document store configured".to_string()));
        };
        let mut doc = store.load(id)?;
        update(&mut doc)?;
        let result = self.render(&mut doc)?;
        store.save(&doc)?;
        Ok(result)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockKind, ComponentKind, ConversionOption};
    use crate::render::Widget;
    use crate::store::MemoryStore;

    fn blocks() -> Vec<ContentBlock> {
        vec![
            ContentBlock::new("h", BlockKind::Heading, "Quarterly report").with_font_size(24.0),
            ContentBlock::new("p", BlockKind::Paragraph, "Contact jane@example.com for details."),
            ContentBlock::new("t", BlockKind::Table, "Region | Revenue\nEast | 500\nWest | 300"),
        ]
    }

    #[tokio::test]
    async fn test_process_redacts_and_annotates() {
        let pipeline = Pipeline::new();
        let doc = pipeline.process("d1", blocks(), None).await.unwrap();

        assert_eq!(doc.blocks[1].text, "Contact [EMAIL_REDACTED] for details.");
        assert_eq!(doc.original_blocks[1].text, "Contact jane@example.com for details.");
        assert_eq!(doc.ledger.records().len(), 1);
        let table = doc.suggestions.iter().find(|s| s.block_id == "t").unwrap();
        assert_eq!(table.kind, ComponentKind::ChartBar);
        assert!(doc.decisions.is_empty());
    }

    #[tokio::test]
    async fn test_render_uses_decisions() {
        let pipeline = Pipeline::new();
        let mut doc = pipeline.process("d1", blocks(), None).await.unwrap();
        doc.decisions = DecisionSet::new().convert_table("t", ConversionOption::ConvertToChart);

        let result = pipeline.render(&mut doc).unwrap();
        assert_eq!(result.block("t").unwrap().widget, Widget::Chart);
        assert!(doc.markup.as_deref().unwrap().contains("chart-t"));
    }

    #[tokio::test]
    async fn test_run_saves_and_rerenders() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let pipeline = Pipeline {
            auto_approve: true,
            store: Some(store.clone()),
            ..Pipeline::new()
        };

        let output = pipeline.run("d1", blocks(), None).await.unwrap();
        assert_eq!(output.synthesis.block("t").unwrap().widget, Widget::Chart);
        assert!(store.contains("d1").unwrap());

        let record_id = output.document.ledger.records()[0].id.clone();
        let result = pipeline
            .rerender("d1", |doc| doc.undo_redaction(&record_id))
            .unwrap();
        assert!(result.html.contains("jane@example.com"));
        assert!(store.load("d1").unwrap().markup.unwrap().contains("jane@example.com"));
    }
}
