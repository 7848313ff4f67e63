//! Suggestion record types.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Interactive treatment recommended for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    ChartBar,
    ChartLine,
    ChartPie,
    Quiz,
    CodeBlock,
    CodeExecutable,
    Timeline,
    Map,
    None,
}

impl ComponentKind {
    /// Every component kind, in declaration order.
    pub const ALL: [ComponentKind; 9] = [
        ComponentKind::ChartBar,
        ComponentKind::ChartLine,
        ComponentKind::ChartPie,
        ComponentKind::Quiz,
        ComponentKind::CodeBlock,
        ComponentKind::CodeExecutable,
        ComponentKind::Timeline,
        ComponentKind::Map,
        ComponentKind::None,
    ];

    /// Kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::ChartBar => "chart-bar",
            ComponentKind::ChartLine => "chart-line",
            ComponentKind::ChartPie => "chart-pie",
            ComponentKind::Quiz => "quiz",
            ComponentKind::CodeBlock => "code-block",
            ComponentKind::CodeExecutable => "code-executable",
            ComponentKind::Timeline => "timeline",
            ComponentKind::Map => "map",
            ComponentKind::None => "none",
        }
    }

    /// Whether this kind renders as a chart.
    pub fn is_chart(&self) -> bool {
        matches!(
            self,
            ComponentKind::ChartBar | ComponentKind::ChartLine | ComponentKind::ChartPie
        )
    }

    /// Chart kind for a chart type name such as `bar`, `line` or `pie`.
    ///
    /// Unrecognized names map to a bar chart.
    pub fn chart_from_type(name: &str) -> ComponentKind {
        match name.trim().to_ascii_lowercase().as_str() {
            "line" => ComponentKind::ChartLine,
            "pie" | "doughnut" => ComponentKind::ChartPie,
            _ => ComponentKind::ChartBar,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = Error;

    /// Accepts kebab-case and snake_case names.
    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_ascii_lowercase().replace('_', "-");
        ComponentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == needle)
            .ok_or_else(|| Error::UnknownComponentKind(s.to_string()))
    }
}

/// Detector that produced a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionSource {
    /// Remote page-image classifier
    Vision,
    /// Paragraph and code pattern detectors
    TextPattern,
    /// Table chartability analysis
    TableAnalyzer,
    /// List quiz analysis
    ListAnalyzer,
}

/// One recommended interactive treatment for a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRecord {
    /// Target block
    pub block_id: String,

    /// Recommended component
    pub kind: ComponentKind,

    /// Detector confidence
    pub confidence: f32,

    /// Producing detector
    pub source: SuggestionSource,

    /// Renderer hints (chart title, language, ...)
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub config: Map<String, Value>,
}

impl SuggestionRecord {
    /// Create a suggestion with an empty config.
    pub fn new(
        block_id: impl Into<String>,
        kind: ComponentKind,
        confidence: f32,
        source: SuggestionSource,
    ) -> Self {
        Self {
            block_id: block_id.into(),
            kind,
            confidence,
            source,
            config: Map::new(),
        }
    }

    /// Add a renderer hint.
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// String renderer hint.
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_kind_parse() {
        assert_eq!(
            "chart-bar".parse::<ComponentKind>().unwrap(),
            ComponentKind::ChartBar
        );
        assert_eq!(
            "code_executable".parse::<ComponentKind>().unwrap(),
            ComponentKind::CodeExecutable
        );
        let err = "gauge".parse::<ComponentKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownComponentKind(ref s) if s == "gauge"));
    }

    #[test]
    fn test_component_kind_serde_matches_as_str() {
        for kind in ComponentKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_chart_from_type() {
        assert_eq!(ComponentKind::chart_from_type("Line"), ComponentKind::ChartLine);
        assert_eq!(ComponentKind::chart_from_type("pie"), ComponentKind::ChartPie);
        assert_eq!(ComponentKind::chart_from_type("radar"), ComponentKind::ChartBar);
        assert!(ComponentKind::ChartPie.is_chart());
        assert!(!ComponentKind::Quiz.is_chart());
    }

    #[test]
    fn test_suggestion_serde() {
        let s = SuggestionRecord::new(
            "c1",
            ComponentKind::CodeBlock,
            0.95,
            SuggestionSource::TextPattern,
        )
        .with_config("language", "python");
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"code-block\""));
        assert!(json.contains("\"text-pattern\""));
        assert_eq!(s.config_str("language"), Some("python"));
    }
}
