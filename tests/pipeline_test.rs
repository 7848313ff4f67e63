//! End-to-end pipeline tests.

use std::sync::Arc;

use async_trait::async_trait;
use blockweave::suggest::{DetectedMap, PageClassification};
use blockweave::{
    BlockEdit, BlockKind, ComponentKind, ContentBlock, DecisionSet, DirectoryStore, DocumentStore,
    Error, ImageRef, MemoryStore, PageImages, Pipeline, Result, SuggestionSource,
    VisionClassifier, Weaver, Widget,
};
use tempfile::TempDir;

fn report(contact: &str) -> Vec<ContentBlock> {
    vec![
        ContentBlock::new("h1", BlockKind::Heading, "Field report").with_font_size(24.0),
        ContentBlock::new("p1", BlockKind::Paragraph, format!("Questions go to {contact}.")),
        ContentBlock::new("t1", BlockKind::Table, "Site | Samples\nRidge | 14\nValley | 9"),
        ContentBlock::new(
            "l1",
            BlockKind::List,
            "Which site had more samples?\na) Ridge (correct)\nb) Valley",
        ),
        ContentBlock::new(
            "p2",
            BlockKind::Paragraph,
            "Ridge (46.50, 7.98)\nValley (46.20, 7.60)",
        )
        .with_page(1),
    ]
}

/// Classifier that spots a map on page 1.
struct MapVision;

#[async_trait]
impl VisionClassifier for MapVision {
    fn name(&self) -> &str {
        "maps"
    }

    async fn classify_page(&self, image: &ImageRef, _context: &str) -> Result<PageClassification> {
        if image.location.contains("page1") {
            Ok(PageClassification {
                maps: vec![DetectedMap { location_count: 2 }],
                ..Default::default()
            })
        } else {
            Ok(PageClassification::default())
        }
    }
}

#[tokio::test]
async fn test_run_with_directory_store() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(DirectoryStore::open(dir.path()).unwrap());
    let pipeline = Weaver::new()
        .with_title("Field report")
        .auto_approve(true)
        .with_store(store.clone())
        .build();

    let output = pipeline
        .run("field-report", report("ops@example.net"), None)
        .await
        .unwrap();

    let doc = &output.document;
    assert_eq!(doc.blocks[1].text, "Questions go to [EMAIL_REDACTED].");
    assert_eq!(doc.ledger.records().len(), 1);
    assert_eq!(output.synthesis.block("t1").unwrap().widget, Widget::Chart);
    assert_eq!(output.synthesis.block("l1").unwrap().widget, Widget::Quiz);
    assert!(!output.synthesis.html.contains("ops@example.net"));
    assert!(output.synthesis.html.contains("<title>Field report</title>"));

    let stored = store.load("field-report").unwrap();
    assert_eq!(stored.blocks, doc.blocks);
    assert_eq!(stored.suggestions, doc.suggestions);
    assert_eq!(stored.markup.as_deref(), Some(output.synthesis.html.as_str()));
    assert!(dir.path().join("field-report.json").is_file());
}

#[tokio::test]
async fn test_review_cycle_through_store() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let pipeline = Weaver::new().with_store(store.clone()).build();

    let output = pipeline
        .run("doc", report("ops@example.net"), None)
        .await
        .unwrap();
    // Nothing approved yet
    assert_eq!(output.synthesis.stats.interactive_count(), 0);
    assert!(!output.document.suggestions.is_empty());

    let result = pipeline
        .rerender("doc", |doc| {
            doc.decisions = DecisionSet::new()
                .enable_quiz("l1")
                .approve("t1", ComponentKind::ChartPie);
            Ok(())
        })
        .unwrap();
    assert_eq!(result.block("l1").unwrap().widget, Widget::Quiz);
    assert_eq!(result.block("t1").unwrap().widget, Widget::Chart);

    let record = store.load("doc").unwrap().ledger.records()[0].id.clone();
    let result = pipeline
        .rerender("doc", |doc| doc.undo_redaction(&record))
        .unwrap();
    assert!(result.html.contains("ops@example.net"));
    // Decisions survive the undo
    assert_eq!(result.block("l1").unwrap().widget, Widget::Quiz);

    let err = pipeline.rerender("missing", |_| Ok(())).unwrap_err();
    assert!(matches!(err, Error::DocumentNotFound(_)));
}

#[test]
fn test_rerender_needs_store() {
    let pipeline = Pipeline::new();
    assert!(pipeline.store().is_none());
    assert!(pipeline.rerender("doc", |_| Ok(())).is_err());
}

#[tokio::test]
async fn test_vision_suggestion_renders_map() {
    let pipeline = Weaver::new()
        .with_vision(Arc::new(MapVision))
        .auto_approve(true)
        .build();

    let mut images = PageImages::new();
    images.insert(0, ImageRef::new("scan/page0.png"));
    images.insert(1, ImageRef::new("scan/page1.png"));

    let output = pipeline
        .run("maps", report("ops@example.net"), Some(&images))
        .await
        .unwrap();

    let p2 = output
        .document
        .suggestions
        .iter()
        .find(|s| s.block_id == "p2")
        .unwrap();
    assert_eq!(p2.kind, ComponentKind::Map);
    assert_eq!(p2.source, SuggestionSource::Vision);
    assert_eq!(output.synthesis.block("p2").unwrap().widget, Widget::Map);
    assert!(output.synthesis.html.contains("leaflet"));
}

#[tokio::test]
async fn test_edits_then_reannotate() {
    let pipeline = Pipeline::new();
    let mut doc = pipeline
        .process("doc", report("ops@example.net"), None)
        .await
        .unwrap();
    assert!(doc.suggestions.iter().all(|s| s.block_id != "h1"));

    doc.edit_blocks(&[BlockEdit::new("h1")
        .with_kind(BlockKind::Code)
        .with_text("def hello():\n    return 1")])
        .unwrap();
    pipeline.annotate(&mut doc, None).await;

    let h1 = doc.suggestions.iter().find(|s| s.block_id == "h1").unwrap();
    assert_eq!(h1.kind, ComponentKind::CodeBlock);
    assert_eq!(h1.config_str("language"), Some("python"));
    assert!(doc.blocks[0].is_user_edited());

    let err = doc
        .edit_blocks(&[BlockEdit::new("ghost").with_text("x")])
        .unwrap_err();
    assert!(matches!(err, Error::BlockNotFound(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_documents_processed_concurrently() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = Arc::new(
        Weaver::new()
            .auto_approve(true)
            .with_store(store.clone())
            .build(),
    );

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                let id = format!("doc-{i}");
                let contact = format!("user{i}@example.com");
                let output = pipeline.run(&id, report(&contact), None).await.unwrap();
                (id, contact, output)
            })
        })
        .collect();

    for handle in handles {
        let (id, contact, output) = handle.await.unwrap();
        assert_eq!(output.document.id, id);
        assert_eq!(output.document.ledger.records().len(), 1);
        assert_eq!(output.document.ledger.records()[0].original, contact);
        assert!(output.document.original_blocks[1].text.contains(&contact));
        assert!(!output.synthesis.html.contains(&contact));
    }

    let ids = store.list().unwrap();
    assert_eq!(ids.len(), 8);
    assert_eq!(ids[0], "doc-0");
}
