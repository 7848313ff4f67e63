//! Synthesis engine: chooses one renderer per block, renders blocks in
//! parallel and assembles the final page. Also hosts the Markdown and JSON
//! exporters.
//!
//! Renderer selection for a block, first match wins:
//!
//! 1. timeline enabled
//! 2. map enabled
//! 3. table with a conversion option (keep, chart, hybrid)
//! 4. list with quiz enabled
//! 5. code with execution enabled
//! 6. approved component kind, dispatched by kind
//! 7. structural markup for the block kind
//!
//! A renderer that cannot parse its block falls back to structural markup
//! for that block only.

mod accessibility;
mod assemble;
mod chart;
mod code;
mod html;
mod json;
mod map;
mod markdown;
mod options;
mod quiz;
mod result;
mod timeline;

pub use accessibility::{
    enhance, validate, AccessibilityIssue, AccessibilityOptions, AccessibilityReport,
    IssueSummary, Severity, WcagLevel,
};
pub use assemble::{assemble, Libraries};
pub use chart::{
    extract_chart_data, extract_numeric, render_chart, render_hybrid, ChartData, ChartKind,
    Colors, Dataset, PALETTE,
};
pub use code::{executable_language, render_code_block, render_executable};
pub use html::{escape_html, heading_level, render_structural, render_table, safe_id};
pub use json::{to_json, JsonFormat};
pub use map::{extract_locations, render_map, Location};
pub use markdown::{to_markdown, MarkdownOptions, MarkdownRenderer};
pub use options::{RenderOptions, Theme};
pub use quiz::{extract_quiz, render_quiz, Quiz, QuizOption};
pub use result::{RenderStats, RenderedBlock, SynthesisResult, Widget};
pub use timeline::{extract_events, render_timeline, TimelineEvent};

use crate::error::Result;
use crate::model::{
    BlockKind, ComponentKind, ContentBlock, ConversionOption, DecisionSet, RenderDecision,
    SuggestionRecord,
};
use crate::suggest::detect_language;
use rayon::prelude::*;
use std::collections::HashMap;

/// Renderer chosen for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPlan {
    Timeline,
    Map,
    /// Table conversion with the chart flavor to use
    Conversion(ConversionOption, ChartKind),
    Quiz,
    ExecutableCode,
    /// Approved component kind
    Component(ComponentKind),
    Structural,
}

impl RenderPlan {
    /// Select the renderer for a block from its decision and merged
    /// suggestion.
    pub fn select(
        block: &ContentBlock,
        decision: Option<&RenderDecision>,
        suggestion: Option<&SuggestionRecord>,
    ) -> Self {
        let Some(d) = decision else {
            return RenderPlan::Structural;
        };

        if d.timeline_enabled {
            return RenderPlan::Timeline;
        }
        if d.map_enabled {
            return RenderPlan::Map;
        }
        if let (BlockKind::Table, Some(option)) = (block.kind, d.conversion) {
            let kind = suggestion
                .map(|s| s.kind)
                .filter(ComponentKind::is_chart)
                .or(d.approved.filter(ComponentKind::is_chart))
                .map_or(ChartKind::Bar, ChartKind::from_component);
            return RenderPlan::Conversion(option, kind);
        }
        if d.quiz_enabled && block.kind == BlockKind::List {
            return RenderPlan::Quiz;
        }
        if d.code_execution_enabled && block.kind == BlockKind::Code {
            return RenderPlan::ExecutableCode;
        }
        match d.approved {
            Some(kind) if kind != ComponentKind::None => RenderPlan::Component(kind),
            _ => RenderPlan::Structural,
        }
    }
}

/// Synthesis engine.
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    options: RenderOptions,
}

impl Synthesizer {
    /// Create a synthesizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a synthesizer with custom options.
    pub fn with_options(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Get the render options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render every block and assemble the page.
    ///
    /// Decisions must reference existing blocks. Suggestions for unknown
    /// blocks are ignored.
    pub fn synthesize(
        &self,
        blocks: &[ContentBlock],
        suggestions: &[SuggestionRecord],
        decisions: &DecisionSet,
    ) -> Result<SynthesisResult> {
        decisions.validate(blocks)?;

        let by_block: HashMap<&str, &SuggestionRecord> = suggestions
            .iter()
            .map(|s| (s.block_id.as_str(), s))
            .collect();

        let rendered: Vec<RenderedBlock> = blocks
            .par_iter()
            .map(|block| {
                render_block(
                    block,
                    decisions.get(&block.id),
                    by_block.get(block.id.as_str()).copied(),
                )
            })
            .collect();

        let mut stats = RenderStats::new();
        for block in &rendered {
            stats.add(block);
        }
        log::info!(
            "Synthesized {} blocks ({} interactive, {} fallbacks)",
            stats.block_count,
            stats.interactive_count(),
            stats.fallback_count
        );

        let html = assemble(&rendered, &self.options);
        let accessibility = self.options.accessibility.as_ref().map(|a11y| {
            let report = validate(&html, a11y.level);
            log::info!(
                "Accessibility score {} ({} errors, {} warnings)",
                report.score,
                report.summary.errors,
                report.summary.warnings
            );
            report
        });

        Ok(SynthesisResult {
            html,
            blocks: rendered,
            stats,
            accessibility,
        })
    }
}

/// Render one block. Renderer failures degrade to structural markup.
pub fn render_block(
    block: &ContentBlock,
    decision: Option<&RenderDecision>,
    suggestion: Option<&SuggestionRecord>,
) -> RenderedBlock {
    let plan = RenderPlan::select(block, decision, suggestion);
    log::debug!("Block {}: {:?}", block.id, plan);

    match try_render(block, plan, suggestion) {
        Ok((widget, html)) => RenderedBlock {
            block_id: block.id.clone(),
            widget,
            html,
            fallback: None,
        },
        Err(e) => {
            log::warn!("Block {} falls back to structural markup: {}", block.id, e);
            RenderedBlock {
                block_id: block.id.clone(),
                widget: Widget::Structural,
                html: render_structural(block),
                fallback: Some(e.to_string()),
            }
        }
    }
}

fn try_render(
    block: &ContentBlock,
    plan: RenderPlan,
    suggestion: Option<&SuggestionRecord>,
) -> Result<(Widget, String)> {
    let id = block.id.as_str();
    let text = block.text.as_str();

    match plan {
        RenderPlan::Timeline => Ok((
            Widget::Timeline,
            render_timeline(id, &extract_events(id, text)?),
        )),
        RenderPlan::Map => Ok((Widget::Map, render_map(id, &extract_locations(id, text)?)?)),
        RenderPlan::Conversion(ConversionOption::KeepTable, _) => {
            Ok((Widget::Structural, render_structural(block)))
        }
        RenderPlan::Conversion(ConversionOption::ConvertToChart, kind) => {
            let data = extract_chart_data(id, text, kind)?;
            let title = conversion_title(block, suggestion);
            Ok((Widget::Chart, render_chart(id, &data, kind, &title)?))
        }
        RenderPlan::Conversion(ConversionOption::Hybrid, kind) => {
            let data = extract_chart_data(id, text, kind)?;
            let title = conversion_title(block, suggestion);
            Ok((Widget::Hybrid, render_hybrid(id, text, &data, kind, &title)?))
        }
        RenderPlan::Quiz => Ok((Widget::Quiz, render_quiz(id, &extract_quiz(id, text)?))),
        RenderPlan::ExecutableCode => Ok((
            Widget::ExecutableCode,
            render_executable(id, text, executable_language(text))?,
        )),
        RenderPlan::Component(kind) => render_component(block, kind, suggestion),
        RenderPlan::Structural => Ok((Widget::Structural, render_structural(block))),
    }
}

fn render_component(
    block: &ContentBlock,
    kind: ComponentKind,
    suggestion: Option<&SuggestionRecord>,
) -> Result<(Widget, String)> {
    let id = block.id.as_str();
    let text = block.text.as_str();
    let language = |default: &'static str| -> String {
        suggestion
            .and_then(|s| s.config_str("language"))
            .filter(|l| *l != "text")
            .unwrap_or(default)
            .to_string()
    };

    match kind {
        ComponentKind::ChartBar | ComponentKind::ChartLine | ComponentKind::ChartPie => {
            let chart = ChartKind::from_component(kind);
            let data = extract_chart_data(id, text, chart)?;
            let title = suggestion_title(block, suggestion);
            Ok((Widget::Chart, render_chart(id, &data, chart, &title)?))
        }
        ComponentKind::Quiz => Ok((Widget::Quiz, render_quiz(id, &extract_quiz(id, text)?))),
        ComponentKind::CodeBlock => {
            let lang = language(detect_language(text));
            Ok((Widget::CodeBlock, render_code_block(id, text, &lang)?))
        }
        ComponentKind::CodeExecutable => {
            let lang = language(executable_language(text));
            Ok((Widget::ExecutableCode, render_executable(id, text, &lang)?))
        }
        ComponentKind::Timeline => Ok((
            Widget::Timeline,
            render_timeline(id, &extract_events(id, text)?),
        )),
        ComponentKind::Map => Ok((Widget::Map, render_map(id, &extract_locations(id, text)?)?)),
        ComponentKind::None => Ok((Widget::Structural, render_structural(block))),
    }
}

fn config_title(suggestion: Option<&SuggestionRecord>) -> Option<String> {
    suggestion
        .and_then(|s| s.config_str("title"))
        .map(str::to_string)
}

/// Title of a chart produced by a table conversion.
fn conversion_title(block: &ContentBlock, suggestion: Option<&SuggestionRecord>) -> String {
    config_title(suggestion).unwrap_or_else(|| format!("Data from Page {}", block.page + 1))
}

/// Title of a chart produced by an approved suggestion: the configured
/// title, else a caption line above the table, else a page label.
fn suggestion_title(block: &ContentBlock, suggestion: Option<&SuggestionRecord>) -> String {
    if let Some(title) = config_title(suggestion) {
        return title;
    }
    match block.text.lines().map(str::trim).find(|l| !l.is_empty()) {
        Some(first) if !first.contains('|') => first.chars().take(50).collect(),
        _ => format!("Data Visualization (Page {})", block.page + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::SuggestionSource;

    fn table() -> ContentBlock {
        ContentBlock::new("t1", BlockKind::Table, "Region | Revenue\nEast | 500\nWest | 300")
    }

    fn chart_config(html: &str, id: &str) -> serde_json::Value {
        let open = format!("<script type=\"application/json\" id=\"chart-config-{id}\">");
        let start = html.find(&open).unwrap() + open.len();
        let end = start + html[start..].find("</script>").unwrap();
        serde_json::from_str(&html[start..end]).unwrap()
    }

    #[test]
    fn test_plan_priority() {
        let block = table();
        let all = RenderDecision {
            block_id: "t1".into(),
            approved: Some(ComponentKind::ChartPie),
            conversion: Some(ConversionOption::Hybrid),
            quiz_enabled: true,
            code_execution_enabled: true,
            timeline_enabled: true,
            map_enabled: true,
        };
        assert_eq!(RenderPlan::select(&block, Some(&all), None), RenderPlan::Timeline);

        let no_timeline = RenderDecision {
            timeline_enabled: false,
            ..all.clone()
        };
        assert_eq!(RenderPlan::select(&block, Some(&no_timeline), None), RenderPlan::Map);

        let conversion = RenderDecision {
            map_enabled: false,
            ..no_timeline
        };
        assert_eq!(
            RenderPlan::select(&block, Some(&conversion), None),
            RenderPlan::Conversion(ConversionOption::Hybrid, ChartKind::Pie)
        );

        // Quiz and execution flags only apply to their own block kinds
        let flags_only = RenderDecision {
            conversion: None,
            ..conversion
        };
        assert_eq!(
            RenderPlan::select(&block, Some(&flags_only), None),
            RenderPlan::Component(ComponentKind::ChartPie)
        );
        assert_eq!(RenderPlan::select(&block, None, None), RenderPlan::Structural);
    }

    #[test]
    fn test_conversion_ignored_for_non_tables() {
        let block = ContentBlock::new("p", BlockKind::Paragraph, "a | 1");
        let mut decision = RenderDecision::new("p");
        decision.conversion = Some(ConversionOption::ConvertToChart);
        assert_eq!(RenderPlan::select(&block, Some(&decision), None), RenderPlan::Structural);
    }

    #[test]
    fn test_convert_to_chart_end_to_end() {
        let blocks = vec![table()];
        let decisions = DecisionSet::new().convert_table("t1", ConversionOption::ConvertToChart);
        let result = Synthesizer::new().synthesize(&blocks, &[], &decisions).unwrap();

        assert!(result.html.contains(r#"id="chart-t1""#));
        assert!(!result.html.contains("<table"));
        let config = chart_config(&result.html, "t1");
        assert_eq!(config["data"]["labels"], serde_json::json!(["East", "West"]));
        assert_eq!(config["data"]["datasets"][0]["data"], serde_json::json!([500.0, 300.0]));
        assert_eq!(
            config["options"]["plugins"]["title"]["text"],
            "Data from Page 1"
        );
        assert!(result.html.contains("chart.umd.min.js"));
    }

    #[test]
    fn test_keep_table_and_hybrid() {
        let decisions = DecisionSet::new().convert_table("t1", ConversionOption::KeepTable);
        let keep = render_block(&table(), decisions.get("t1"), None);
        assert_eq!(keep.widget, Widget::Structural);
        assert!(keep.html.contains("<table>"));

        let decisions = DecisionSet::new().convert_table("t1", ConversionOption::Hybrid);
        let hybrid = render_block(&table(), decisions.get("t1"), None);
        assert_eq!(hybrid.widget, Widget::Hybrid);
        assert!(hybrid.html.contains("<table>"));
        assert!(hybrid.html.contains("<canvas"));
    }

    #[test]
    fn test_malformed_table_falls_back() {
        let blocks = vec![
            ContentBlock::new("bad", BlockKind::Table, "no pipes here"),
            table(),
        ];
        let decisions = DecisionSet::new()
            .convert_table("bad", ConversionOption::ConvertToChart)
            .convert_table("t1", ConversionOption::ConvertToChart);
        let result = Synthesizer::new().synthesize(&blocks, &[], &decisions).unwrap();

        assert_eq!(result.blocks[0].widget, Widget::Structural);
        assert_eq!(result.blocks[0].html, "<pre>no pipes here</pre>");
        assert!(result.blocks[0].fallback.is_some());
        assert_eq!(result.blocks[1].widget, Widget::Chart);
        assert_eq!(result.stats.fallback_count, 1);
    }

    #[test]
    fn test_approved_suggestion_dispatch() {
        let blocks = vec![
            ContentBlock::new("c", BlockKind::Code, "def f():\n    return 1"),
            ContentBlock::new("l", BlockKind::List, "Pick one\n- a (correct)\n- b"),
        ];
        let suggestions = vec![
            SuggestionRecord::new(
                "c",
                ComponentKind::CodeBlock,
                0.95,
                SuggestionSource::TextPattern,
            )
            .with_config("language", "python"),
            SuggestionRecord::new("l", ComponentKind::Quiz, 0.8, SuggestionSource::ListAnalyzer),
        ];
        let decisions = DecisionSet::new().approve_all(&suggestions);
        let result = Synthesizer::new()
            .synthesize(&blocks, &suggestions, &decisions)
            .unwrap();

        assert_eq!(result.blocks[0].widget, Widget::CodeBlock);
        assert!(result.blocks[0].html.contains("language-python"));
        assert_eq!(result.blocks[1].widget, Widget::Quiz);
        assert!(result.html.contains("prism.min.js"));
        assert!(!result.html.contains("chart.umd.min.js"));
    }

    #[test]
    fn test_unapproved_suggestion_is_structural() {
        let blocks = vec![table()];
        let suggestions = vec![SuggestionRecord::new(
            "t1",
            ComponentKind::ChartBar,
            0.6,
            SuggestionSource::TableAnalyzer,
        )];
        let result = Synthesizer::new()
            .synthesize(&blocks, &suggestions, &DecisionSet::new())
            .unwrap();
        assert_eq!(result.blocks[0].widget, Widget::Structural);
    }

    #[test]
    fn test_suggestion_chart_title() {
        let block =
            ContentBlock::new("t", BlockKind::Table, "Quarterly sales\nQ | V\nQ1 | 3").with_page(2);
        assert_eq!(suggestion_title(&block, None), "Quarterly sales");
        assert_eq!(
            suggestion_title(&table().with_page(2), None),
            "Data Visualization (Page 3)"
        );
        let titled =
            SuggestionRecord::new("t", ComponentKind::ChartBar, 0.8, SuggestionSource::Vision)
                .with_config("title", "Revenue");
        assert_eq!(suggestion_title(&block, Some(&titled)), "Revenue");
    }

    #[test]
    fn test_order_preserved_and_unknown_decision_rejected() {
        let blocks: Vec<ContentBlock> = (0..50)
            .map(|i| ContentBlock::new(format!("b{i}"), BlockKind::Paragraph, format!("para {i}")))
            .collect();
        let result = Synthesizer::new()
            .synthesize(&blocks, &[], &DecisionSet::new())
            .unwrap();
        let ids: Vec<&str> = result.blocks.iter().map(|b| b.block_id.as_str()).collect();
        let expected: Vec<String> = (0..50).map(|i| format!("b{i}")).collect();
        assert_eq!(ids, expected);

        let err = Synthesizer::new()
            .synthesize(&blocks, &[], &DecisionSet::new().enable_map("ghost"))
            .unwrap_err();
        assert!(matches!(err, Error::BlockNotFound(_)));
    }

    #[test]
    fn test_timeline_and_map_widgets() {
        let blocks = vec![
            ContentBlock::new("tl", BlockKind::List, "- 1990: Start\n- 2000: Growth"),
            ContentBlock::new("mp", BlockKind::Paragraph, "Lisbon (38.72, -9.14)"),
        ];
        let decisions = DecisionSet::new().enable_timeline("tl").enable_map("mp");
        let result = Synthesizer::new().synthesize(&blocks, &[], &decisions).unwrap();

        assert_eq!(result.blocks[0].widget, Widget::Timeline);
        assert_eq!(result.blocks[1].widget, Widget::Map);
        assert!(result.html.contains("leaflet.js"));
        assert_eq!(result.stats.count(Widget::Timeline), 1);
    }
}
