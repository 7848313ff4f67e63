//! Per-block render decisions supplied by users or automation.

use super::block::ContentBlock;
use super::suggestion::{ComponentKind, SuggestionRecord};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

/// How a table block should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionOption {
    /// Render the table as-is
    KeepTable,
    /// Replace the table with a chart
    ConvertToChart,
    /// Chart followed by the table
    Hybrid,
}

impl FromStr for ConversionOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "keep-table" | "keep" => Ok(ConversionOption::KeepTable),
            "convert-to-chart" | "chart" => Ok(ConversionOption::ConvertToChart),
            "hybrid" => Ok(ConversionOption::Hybrid),
            _ => Err(Error::UnknownConversion(s.to_string())),
        }
    }
}

/// Decision for one block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDecision {
    /// Target block
    pub block_id: String,

    /// Approved component kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<ComponentKind>,

    /// Table conversion option
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ConversionOption>,

    /// Render a list as a quiz
    pub quiz_enabled: bool,

    /// Render code with a run button
    pub code_execution_enabled: bool,

    /// Render as a timeline
    pub timeline_enabled: bool,

    /// Render as a map
    pub map_enabled: bool,
}

impl RenderDecision {
    /// Create an empty decision for a block.
    pub fn new(block_id: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
            ..Default::default()
        }
    }
}

/// Decisions for a document, keyed by block id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionSet {
    decisions: BTreeMap<String, RenderDecision>,
}

impl DecisionSet {
    /// Create an empty decision set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decision for a block, if any.
    pub fn get(&self, block_id: &str) -> Option<&RenderDecision> {
        self.decisions.get(block_id)
    }

    /// Insert or replace a whole decision.
    pub fn insert(&mut self, decision: RenderDecision) {
        self.decisions.insert(decision.block_id.clone(), decision);
    }

    /// Iterate over decisions in block id order.
    pub fn iter(&self) -> impl Iterator<Item = &RenderDecision> {
        self.decisions.values()
    }

    /// Number of blocks with a decision.
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// Check if no decisions were made.
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    fn entry(&mut self, block_id: &str) -> &mut RenderDecision {
        self.decisions
            .entry(block_id.to_string())
            .or_insert_with(|| RenderDecision::new(block_id))
    }

    /// Approve a component kind for a block.
    pub fn approve(mut self, block_id: &str, kind: ComponentKind) -> Self {
        self.entry(block_id).approved = Some(kind);
        self
    }

    /// Choose a table conversion option.
    pub fn convert_table(mut self, block_id: &str, option: ConversionOption) -> Self {
        self.entry(block_id).conversion = Some(option);
        self
    }

    /// Enable quiz rendering for a list block.
    pub fn enable_quiz(mut self, block_id: &str) -> Self {
        self.entry(block_id).quiz_enabled = true;
        self
    }

    /// Enable code execution for a code block.
    pub fn enable_code_execution(mut self, block_id: &str) -> Self {
        self.entry(block_id).code_execution_enabled = true;
        self
    }

    /// Enable timeline rendering.
    pub fn enable_timeline(mut self, block_id: &str) -> Self {
        self.entry(block_id).timeline_enabled = true;
        self
    }

    /// Enable map rendering.
    pub fn enable_map(mut self, block_id: &str) -> Self {
        self.entry(block_id).map_enabled = true;
        self
    }

    /// Approve every suggestion that recommends a component.
    pub fn approve_all(mut self, suggestions: &[SuggestionRecord]) -> Self {
        for suggestion in suggestions {
            if suggestion.kind != ComponentKind::None {
                self.entry(&suggestion.block_id).approved = Some(suggestion.kind);
            }
        }
        self
    }

    /// Check that every decision references an existing block.
    pub fn validate(&self, blocks: &[ContentBlock]) -> Result<()> {
        let known: HashSet<&str> = blocks.iter().map(|b| b.id.as_str()).collect();
        match self.decisions.keys().find(|id| !known.contains(id.as_str())) {
            Some(id) => Err(Error::BlockNotFound(id.clone())),
            None => Ok(()),
        }
    }
}

impl FromIterator<RenderDecision> for DecisionSet {
    fn from_iter<I: IntoIterator<Item = RenderDecision>>(iter: I) -> Self {
        let mut set = DecisionSet::new();
        for decision in iter {
            set.insert(decision);
        }
        set
    }
}
