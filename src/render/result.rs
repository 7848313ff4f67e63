//! Synthesis result with per-block output and statistics.

use super::accessibility::AccessibilityReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Renderer that produced a block's markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Widget {
    /// Plain semantic HTML
    Structural,
    Chart,
    /// Table plus chart
    Hybrid,
    Quiz,
    CodeBlock,
    ExecutableCode,
    Timeline,
    Map,
}

impl Widget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Widget::Structural => "structural",
            Widget::Chart => "chart",
            Widget::Hybrid => "hybrid",
            Widget::Quiz => "quiz",
            Widget::CodeBlock => "code-block",
            Widget::ExecutableCode => "executable-code",
            Widget::Timeline => "timeline",
            Widget::Map => "map",
        }
    }

    /// True when the widget draws a chart.
    pub fn needs_charts(&self) -> bool {
        matches!(self, Widget::Chart | Widget::Hybrid)
    }

    /// True when the widget shows highlighted source.
    pub fn needs_highlighting(&self) -> bool {
        matches!(self, Widget::CodeBlock | Widget::ExecutableCode)
    }

    /// True when the widget draws a map.
    pub fn needs_maps(&self) -> bool {
        matches!(self, Widget::Map)
    }
}

impl fmt::Display for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markup of one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedBlock {
    pub block_id: String,
    pub widget: Widget,
    pub html: String,

    /// Why a richer renderer was abandoned for the structural one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

/// Counts collected while synthesizing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Number of blocks rendered
    pub block_count: usize,

    /// Blocks per widget
    pub widgets: BTreeMap<Widget, usize>,

    /// Blocks that fell back to structural markup
    pub fallback_count: usize,
}

impl RenderStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one rendered block.
    pub fn add(&mut self, block: &RenderedBlock) {
        self.block_count += 1;
        *self.widgets.entry(block.widget).or_insert(0) += 1;
        if block.fallback.is_some() {
            self.fallback_count += 1;
        }
    }

    /// Number of blocks rendered with a widget.
    pub fn count(&self, widget: Widget) -> usize {
        self.widgets.get(&widget).copied().unwrap_or(0)
    }

    /// Blocks rendered with anything but structural markup.
    pub fn interactive_count(&self) -> usize {
        self.block_count - self.count(Widget::Structural)
    }
}

/// Result of synthesizing a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisResult {
    /// Final markup
    pub html: String,

    /// Per-block markup, in block order
    pub blocks: Vec<RenderedBlock>,

    /// Statistics
    pub stats: RenderStats,

    /// WCAG report for the final markup, when accessibility is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<AccessibilityReport>,
}

impl SynthesisResult {
    /// Markup rendered for a block.
    pub fn block(&self, block_id: &str) -> Option<&RenderedBlock> {
        self.blocks.iter().find(|b| b.block_id == block_id)
    }

    /// Length of the final markup in bytes.
    pub fn content_len(&self) -> usize {
        self.html.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(widget: Widget, fallback: Option<&str>) -> RenderedBlock {
        RenderedBlock {
            block_id: "b".into(),
            widget,
            html: String::new(),
            fallback: fallback.map(str::to_string),
        }
    }

    #[test]
    fn test_stats_counts() {
        let mut stats = RenderStats::new();
        stats.add(&rendered(Widget::Chart, None));
        stats.add(&rendered(Widget::Structural, Some("no pipes")));
        stats.add(&rendered(Widget::Structural, None));

        assert_eq!(stats.block_count, 3);
        assert_eq!(stats.count(Widget::Structural), 2);
        assert_eq!(stats.count(Widget::Map), 0);
        assert_eq!(stats.fallback_count, 1);
        assert_eq!(stats.interactive_count(), 1);
    }

    #[test]
    fn test_widget_library_needs() {
        assert!(Widget::Hybrid.needs_charts());
        assert!(Widget::ExecutableCode.needs_highlighting());
        assert!(!Widget::Quiz.needs_charts());
        assert!(Widget::Map.needs_maps());
    }

    #[test]
    fn test_stats_serialize_widget_keys() {
        let mut stats = RenderStats::new();
        stats.add(&rendered(Widget::CodeBlock, None));
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains(r#""code-block":1"#));
    }
}
