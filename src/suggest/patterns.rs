//! Local text detectors for list, code and paragraph blocks.

use crate::model::{ComponentKind, ContentBlock, SuggestionRecord, SuggestionSource};
use regex::Regex;

/// Substrings that mark a list as question material.
const LIST_QUIZ_INDICATORS: [&str; 8] = [
    "?", "answer:", "a)", "b)", "c)", "correct", "true", "false",
];

/// Substrings counted as Q&A indicators in a paragraph.
const PARAGRAPH_QA_INDICATORS: [&str; 9] = [
    "q:", "a:", "question:", "answer:", "?", "a)", "b)", "c)", "d)",
];

/// Substrings that suggest a paragraph holds source code.
const CODE_KEYWORDS: [&str; 9] = [
    "def ", "function ", "class ", "import ", "const ", "var ", "let ", "=>", "return ",
];

/// Guess a source language by keyword sniffing.
pub fn detect_language(code: &str) -> &'static str {
    let lower = code.to_lowercase();

    if code.contains("def ") || code.contains("import ") {
        "python"
    } else if code.contains("function ") || code.contains("const ") {
        "javascript"
    } else if lower.contains("<html") || lower.contains("<div") {
        "html"
    } else if code.contains("public class") || code.contains("private ") {
        "java"
    } else {
        "text"
    }
}

/// Flags lists that read like quiz questions.
#[derive(Debug, Clone, Default)]
pub struct ListAnalyzer;

impl ListAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, block: &ContentBlock) -> Option<SuggestionRecord> {
        let lower = block.text.to_lowercase();
        if !LIST_QUIZ_INDICATORS.iter().any(|i| lower.contains(i)) {
            return None;
        }

        Some(
            SuggestionRecord::new(
                block.id.clone(),
                ComponentKind::Quiz,
                0.8,
                SuggestionSource::ListAnalyzer,
            )
            .with_config("type", "multiple_choice"),
        )
    }
}

/// Marks every code block as highlighted code.
#[derive(Debug, Clone, Default)]
pub struct CodeDetector;

impl CodeDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, block: &ContentBlock) -> SuggestionRecord {
        SuggestionRecord::new(
            block.id.clone(),
            ComponentKind::CodeBlock,
            0.95,
            SuggestionSource::TextPattern,
        )
        .with_config("language", detect_language(&block.text))
    }
}

/// Paragraph detector thresholds.
#[derive(Debug, Clone)]
pub struct ParagraphThresholds {
    /// Distinct Q&A indicators needed for a quiz
    pub min_qa_indicators: usize,
    /// Date and quarter matches needed for a timeline
    pub min_dates: usize,
    /// Formatted numbers needed for a chart
    pub min_numbers: usize,
}

impl Default for ParagraphThresholds {
    fn default() -> Self {
        Self {
            min_qa_indicators: 2,
            min_dates: 3,
            min_numbers: 3,
        }
    }
}

/// Counts produced by the four paragraph counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParagraphSignals {
    pub qa_indicators: usize,
    pub dates: usize,
    pub numbers: usize,
    pub has_code_keyword: bool,
}

/// Runs pattern counters over paragraphs and picks at most one treatment.
pub struct ParagraphDetector {
    thresholds: ParagraphThresholds,
    date_patterns: Vec<Regex>,
    number_patterns: Vec<Regex>,
}

impl ParagraphDetector {
    /// Create a detector with default thresholds.
    pub fn new() -> Self {
        Self::with_thresholds(ParagraphThresholds::default())
    }

    /// Create a detector with custom thresholds.
    pub fn with_thresholds(thresholds: ParagraphThresholds) -> Self {
        let date_patterns = [
            r"\b\d{4}\b",
            r"\b(?:january|february|march|april|may|june|july|august|september|october|november|december)\b",
            r"\b\d{1,2}/\d{1,2}/\d{2,4}\b",
            r"\b(?:q1|q2|q3|q4)\b",
        ];
        let number_patterns = [
            r"\b\d+(?:\.\d+)?%",
            r"\$\d+(?:,\d{3})*(?:\.\d{2})?",
            r"\b\d+(?:,\d{3})+\b",
            r"\b\d+(?:\.\d+)?\s*(?:million|billion|thousand|k|m|b)\b",
        ];

        Self {
            thresholds,
            date_patterns: date_patterns
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect(),
            number_patterns: number_patterns
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect(),
        }
    }

    /// Run the four counters over a paragraph.
    pub fn signals(&self, text: &str) -> ParagraphSignals {
        let lower = text.to_lowercase();
        let count = |patterns: &[Regex]| -> usize {
            patterns.iter().map(|re| re.find_iter(&lower).count()).sum()
        };

        ParagraphSignals {
            qa_indicators: PARAGRAPH_QA_INDICATORS
                .iter()
                .filter(|i| lower.contains(*i))
                .count(),
            dates: count(&self.date_patterns[..]),
            numbers: count(&self.number_patterns[..]),
            has_code_keyword: CODE_KEYWORDS.iter().any(|k| text.contains(k)),
        }
    }

    /// First treatment whose threshold is met, in quiz, timeline, chart,
    /// code order.
    pub fn analyze(&self, block: &ContentBlock) -> Option<SuggestionRecord> {
        let s = self.signals(&block.text);
        let t = &self.thresholds;
        let suggest = |kind, confidence| {
            SuggestionRecord::new(
                block.id.clone(),
                kind,
                confidence,
                SuggestionSource::TextPattern,
            )
        };

        let suggestion = if s.qa_indicators >= t.min_qa_indicators {
            suggest(ComponentKind::Quiz, 0.7).with_config("type", "qa_detected")
        } else if s.dates >= t.min_dates {
            suggest(ComponentKind::Timeline, 0.65).with_config("date_count", s.dates)
        } else if s.numbers >= t.min_numbers {
            suggest(ComponentKind::ChartBar, 0.7).with_config("numeric_count", s.numbers)
        } else if s.has_code_keyword {
            suggest(ComponentKind::CodeBlock, 0.75)
                .with_config("language", detect_language(&block.text))
        } else {
            return None;
        };

        log::debug!(
            "Block {}: paragraph pattern -> {} ({:?})",
            block.id,
            suggestion.kind,
            s
        );
        Some(suggestion)
    }
}

impl Default for ParagraphDetector {
    fn default() -> Self {
        Self::new()
    }
}
