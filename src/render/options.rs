//! Synthesis options and output themes.

use super::accessibility::AccessibilityOptions;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visual theme of the generated page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Professional,
    Academic,
    Minimal,
}

impl Theme {
    /// Every theme.
    pub const ALL: [Theme; 5] = [
        Theme::Light,
        Theme::Dark,
        Theme::Professional,
        Theme::Academic,
        Theme::Minimal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Professional => "professional",
            Theme::Academic => "academic",
            Theme::Minimal => "minimal",
        }
    }

    /// Stylesheet: shared widget styles plus the theme's overrides.
    pub fn css(&self) -> String {
        let overrides = match self {
            Theme::Light => "",
            Theme::Dark => DARK_CSS,
            Theme::Professional => PROFESSIONAL_CSS,
            Theme::Academic => ACADEMIC_CSS,
            Theme::Minimal => MINIMAL_CSS,
        };
        format!("{BASE_CSS}{overrides}")
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Theme::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownTheme(s.to_string()))
    }
}

/// Options for HTML synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Page theme
    pub theme: Theme,

    /// Document title
    pub title: String,

    /// Emit a complete HTML document; otherwise only library tags and body
    pub standalone: bool,

    /// Extra CSS appended after the theme stylesheet
    pub extra_css: Option<String>,

    /// Enhance the page for accessibility and attach a WCAG report
    #[serde(default)]
    pub accessibility: Option<AccessibilityOptions>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            title: "Converted Document".to_string(),
            standalone: true,
            extra_css: None,
            accessibility: None,
        }
    }
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Emit a fragment instead of a full document.
    pub fn fragment(mut self) -> Self {
        self.standalone = false;
        self
    }

    /// Append custom CSS.
    pub fn with_extra_css(mut self, css: impl Into<String>) -> Self {
        self.extra_css = Some(css.into());
        self
    }

    /// Apply accessibility enhancements and validation.
    pub fn with_accessibility(mut self, options: AccessibilityOptions) -> Self {
        self.accessibility = Some(options);
        self
    }
}

const BASE_CSS: &str = r#"
* { box-sizing: border-box; }
body { margin: 0; font-family: -apple-system, "Segoe UI", Roboto, sans-serif; line-height: 1.6; color: #222; background: #fafafa; }
.container { max-width: 960px; margin: 0 auto; padding: 2rem; background: #fff; }
h1, h2, h3, h4 { line-height: 1.25; margin: 1.5em 0 0.5em; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid #ddd; padding: 0.5rem; text-align: left; }
th { background: #f3f4f6; }
blockquote { border-left: 4px solid #ccc; margin: 1rem 0; padding: 0.5rem 1rem; color: #555; }
img { max-width: 100%; height: auto; }
.chart-container { position: relative; height: 360px; margin: 1.5rem 0; }
.hybrid-container { display: grid; grid-template-columns: 1fr 1fr; gap: 1.5rem; margin: 1.5rem 0; }
.hybrid-container .chart-container { margin: 0; }
.quiz-container { border: 1px solid #ddd; border-radius: 8px; padding: 1rem 1.5rem; margin: 1.5rem 0; }
.quiz-question { font-weight: 600; margin-bottom: 0.75rem; }
.quiz-option { display: block; padding: 0.4rem 0.6rem; border-radius: 4px; cursor: pointer; }
.quiz-option:hover { background: #f3f4f6; }
.quiz-check-btn, .run-btn, .copy-btn { border: 0; border-radius: 4px; padding: 0.35rem 0.9rem; cursor: pointer; background: #4e79a7; color: #fff; }
.quiz-feedback { margin-top: 0.75rem; font-weight: 600; }
.quiz-feedback.correct { color: #2e7d32; }
.quiz-feedback.incorrect { color: #c62828; }
.code-block, .code-executable { margin: 1.5rem 0; border-radius: 6px; overflow: hidden; background: #2d2d2d; }
.code-toolbar { display: flex; justify-content: space-between; align-items: center; padding: 0.4rem 0.8rem; background: #1f1f1f; color: #ccc; font-size: 0.85rem; }
.code-block pre { margin: 0; padding: 1rem; overflow-x: auto; }
.code-editor { width: 100%; min-height: 140px; border: 0; padding: 1rem; font-family: monospace; background: #2d2d2d; color: #eee; }
.code-output { margin: 0; padding: 0.75rem 1rem; min-height: 2rem; background: #111; color: #9fef00; white-space: pre-wrap; }
.timeline-container { position: relative; margin: 2rem 0; }
.timeline-line { position: absolute; left: 50%; top: 0; bottom: 0; width: 2px; background: #4e79a7; }
.timeline-item { position: relative; width: 50%; padding: 0.5rem 2rem; }
.timeline-item.left { left: 0; text-align: right; }
.timeline-item.right { left: 50%; }
.timeline-content { display: inline-block; padding: 0.75rem 1rem; border-radius: 6px; background: #f3f4f6; }
.timeline-date { font-size: 0.85rem; color: #4e79a7; font-weight: 600; }
.timeline-title { font-weight: 600; }
.map-container { height: 400px; margin: 1.5rem 0; border-radius: 6px; }
@media (max-width: 700px) { .hybrid-container { grid-template-columns: 1fr; } }
"#;

const DARK_CSS: &str = r#"
body.theme-dark { background: #121212; color: #e0e0e0; }
.theme-dark .container { background: #1e1e1e; }
.theme-dark th { background: #2a2a2a; }
.theme-dark th, .theme-dark td { border-color: #444; }
.theme-dark blockquote { border-color: #555; color: #aaa; }
.theme-dark .quiz-container { border-color: #444; }
.theme-dark .quiz-option:hover, .theme-dark .timeline-content { background: #2a2a2a; }
"#;

const PROFESSIONAL_CSS: &str = r#"
body.theme-professional { font-family: "Helvetica Neue", Arial, sans-serif; background: #eef1f5; }
.theme-professional h1, .theme-professional h2 { color: #1f3a5f; border-bottom: 2px solid #1f3a5f; padding-bottom: 0.25em; }
.theme-professional th { background: #1f3a5f; color: #fff; }
"#;

const ACADEMIC_CSS: &str = r#"
body.theme-academic { font-family: Georgia, "Times New Roman", serif; background: #fdfcf8; }
.theme-academic .container { max-width: 800px; }
.theme-academic p { text-align: justify; }
.theme-academic blockquote { font-style: italic; }
"#;

const MINIMAL_CSS: &str = r#"
body.theme-minimal { background: #fff; }
.theme-minimal .container { padding: 1rem; }
.theme-minimal th { background: transparent; }
.theme-minimal th, .theme-minimal td { border: 0; border-bottom: 1px solid #eee; }
.theme-minimal .quiz-container, .theme-minimal .timeline-content { border-radius: 0; }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_parse() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(" academic ".parse::<Theme>().unwrap(), Theme::Academic);
        assert!(matches!("neon".parse::<Theme>(), Err(Error::UnknownTheme(_))));
    }

    #[test]
    fn test_theme_css() {
        assert!(Theme::Light.css().contains(".chart-container"));
        assert!(Theme::Dark.css().contains(".theme-dark"));
        assert!(!Theme::Light.css().contains(".theme-dark"));
    }

    #[test]
    fn test_options_builder() {
        let options = RenderOptions::new()
            .with_theme(Theme::Minimal)
            .with_title("Report")
            .fragment();
        assert_eq!(options.theme, Theme::Minimal);
        assert_eq!(options.title, "Report");
        assert!(!options.standalone);
        assert!(RenderOptions::default().standalone);
        assert!(RenderOptions::default().accessibility.is_none());
    }
}
