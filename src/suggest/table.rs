//! Chart suitability analysis for table blocks.

use crate::error::{Error, Result};
use crate::model::{ComponentKind, ContentBlock, SuggestionRecord, SuggestionSource};
use crate::remote::{call_remote, RetryPolicy};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Confidence of the digit-based fallback suggestion.
pub const FALLBACK_CONFIDENCE: f32 = 0.6;

fn default_advice_type() -> String {
    "none".to_string()
}

fn default_advice_confidence() -> f32 {
    0.7
}

/// Answer of a [`TableAdvisor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartAdvice {
    /// `bar`, `line`, `pie` or `none`
    #[serde(default = "default_advice_type")]
    pub chart_type: String,

    #[serde(default = "default_advice_confidence")]
    pub confidence: f32,

    /// Renderer hints
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl ChartAdvice {
    /// Advice recommending a chart type.
    pub fn chart(chart_type: impl Into<String>, confidence: f32) -> Self {
        Self {
            chart_type: chart_type.into(),
            confidence,
            config: Map::new(),
        }
    }

    /// Advice that the table should stay a table.
    pub fn no_chart() -> Self {
        Self::chart("none", 0.0)
    }
}

/// Remote collaborator deciding whether tabular data supports a chart.
#[async_trait]
pub trait TableAdvisor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Recommend a chart type for pipe-delimited table text.
    async fn advise(&self, table: &str) -> Result<ChartAdvice>;
}

/// Table analyzer: asks the advisor, falls back to a bar chart for tables
/// that contain digits.
#[derive(Clone, Default)]
pub struct TableAnalyzer {
    advisor: Option<Arc<dyn TableAdvisor>>,
    retry: RetryPolicy,
}

impl TableAnalyzer {
    /// Create an analyzer without an advisor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a remote advisor.
    pub fn with_advisor(mut self, advisor: Arc<dyn TableAdvisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    /// Retry policy for advisor calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Analyze a table block.
    pub async fn analyze(&self, block: &ContentBlock) -> Option<SuggestionRecord> {
        let advice = match self.advisor.as_ref() {
            Some(advisor) => {
                call_remote(&self.retry, advisor.name(), || advisor.advise(&block.text)).await
            }
            None => Err(Error::DetectorUnavailable("no table advisor".to_string())),
        };

        match advice {
            Ok(advice) => from_advice(block, advice),
            Err(e) => {
                log::warn!("Table analysis failed for block {}: {}", block.id, e);
                fallback(block)
            }
        }
    }
}

fn from_advice(block: &ContentBlock, advice: ChartAdvice) -> Option<SuggestionRecord> {
    if advice.chart_type.trim().eq_ignore_ascii_case("none") {
        return None;
    }

    let mut suggestion = SuggestionRecord::new(
        block.id.clone(),
        ComponentKind::chart_from_type(&advice.chart_type),
        advice.confidence.clamp(0.0, 1.0),
        SuggestionSource::TableAnalyzer,
    );
    suggestion.config = advice.config;
    Some(suggestion)
}

/// Bar-chart suggestion for a table with any digit, else nothing.
pub fn fallback(block: &ContentBlock) -> Option<SuggestionRecord> {
    if !block.text.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(SuggestionRecord::new(
        block.id.clone(),
        ComponentKind::ChartBar,
        FALLBACK_CONFIDENCE,
        SuggestionSource::TableAnalyzer,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockKind;

    struct Scripted(Result<ChartAdvice>);

    #[async_trait]
    impl TableAdvisor for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn advise(&self, _table: &str) -> Result<ChartAdvice> {
            match &self.0 {
                Ok(advice) => Ok(advice.clone()),
                Err(e) => Err(Error::DetectorUnavailable(e.to_string())),
            }
        }
    }

    fn table(text: &str) -> ContentBlock {
        ContentBlock::new("t", BlockKind::Table, text)
    }

    #[tokio::test]
    async fn test_no_advisor_falls_back_on_digits() {
        let analyzer = TableAnalyzer::new();
        let s = analyzer.analyze(&table("Q | Sales\nQ1 | 10")).await.unwrap();
        assert_eq!(s.kind, ComponentKind::ChartBar);
        assert_eq!(s.confidence, FALLBACK_CONFIDENCE);
        assert!(analyzer.analyze(&table("Name | Role\nAna | Lead")).await.is_none());
    }

    #[tokio::test]
    async fn test_advisor_recommendation() {
        let advice = ChartAdvice::chart("line", 0.9);
        let analyzer = TableAnalyzer::new().with_advisor(Arc::new(Scripted(Ok(advice))));
        let s = analyzer.analyze(&table("Y | V\n2020 | 1")).await.unwrap();
        assert_eq!(s.kind, ComponentKind::ChartLine);
        assert_eq!(s.source, SuggestionSource::TableAnalyzer);
    }

    #[tokio::test]
    async fn test_advisor_says_none() {
        let analyzer =
            TableAnalyzer::new().with_advisor(Arc::new(Scripted(Ok(ChartAdvice::no_chart()))));
        assert!(analyzer.analyze(&table("A | 1")).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_advisor_failure_falls_back() {
        let analyzer = TableAnalyzer::new().with_advisor(Arc::new(Scripted(Err(
            Error::Other("boom".into()),
        ))));
        let s = analyzer.analyze(&table("A | 1")).await.unwrap();
        assert_eq!(s.confidence, FALLBACK_CONFIDENCE);
    }

    #[test]
    fn test_advice_deserialize_defaults() {
        let advice: ChartAdvice = serde_json::from_str("{}").unwrap();
        assert_eq!(advice.chart_type, "none");
        assert_eq!(advice.confidence, 0.7);
    }
}
