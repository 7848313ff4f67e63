//! WCAG checks and accessibility enhancement of synthesized pages.
//!
//! [`validate`] scans markup for common WCAG failures (images, headings,
//! links, tables, language, form labels, ARIA roles) and scores the page.
//! [`enhance`] adds a skip link, a main-content target, ARIA attributes on
//! the interactive widgets and optional focus and high-contrast styles.

use super::html::escape_html;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// WCAG conformance level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum WcagLevel {
    A,
    #[default]
    AA,
    AAA,
}

impl fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WcagLevel::A => "A",
            WcagLevel::AA => "AA",
            WcagLevel::AAA => "AAA",
        };
        f.write_str(s)
    }
}

/// How serious an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One problem found in the markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityIssue {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wcag_criteria: Option<String>,
}

/// Issue counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

/// Result of [`validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityReport {
    /// No errors at the requested level
    pub passed: bool,
    pub wcag_level: WcagLevel,
    pub issues: Vec<AccessibilityIssue>,
    /// 100 minus 10 per error and 2 per warning, floored at 0
    pub score: f64,
    pub summary: IssueSummary,
}

impl AccessibilityReport {
    /// Issues raised by one rule.
    pub fn by_rule<'a>(
        &'a self,
        rule_id: &'a str,
    ) -> impl Iterator<Item = &'a AccessibilityIssue> {
        self.issues.iter().filter(move |i| i.rule_id == rule_id)
    }
}

/// Accessibility settings for synthesized pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityOptions {
    /// Level checked by [`validate`]
    pub level: WcagLevel,

    /// Language code for `<html lang>` when missing
    pub language: String,

    /// Insert a "skip to main content" link
    pub skip_link: bool,

    /// Add ARIA roles and labels to widgets
    pub aria_labels: bool,

    /// Visible keyboard focus outlines
    pub focus_styles: bool,

    /// Styles for `prefers-contrast: high`
    pub high_contrast: bool,
}

impl Default for AccessibilityOptions {
    fn default() -> Self {
        Self {
            level: WcagLevel::AA,
            language: "en".to_string(),
            skip_link: true,
            aria_labels: true,
            focus_styles: true,
            high_contrast: true,
        }
    }
}

impl AccessibilityOptions {
    /// All enhancements on, checked at AA.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the conformance level.
    pub fn with_level(mut self, level: WcagLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the fallback page language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Enable or disable the skip link.
    pub fn with_skip_link(mut self, enabled: bool) -> Self {
        self.skip_link = enabled;
        self
    }

    /// Enable or disable widget ARIA attributes.
    pub fn with_aria_labels(mut self, enabled: bool) -> Self {
        self.aria_labels = enabled;
        self
    }

    /// Enable or disable focus styles.
    pub fn with_focus_styles(mut self, enabled: bool) -> Self {
        self.focus_styles = enabled;
        self
    }

    /// Enable or disable high-contrast styles.
    pub fn with_high_contrast(mut self, enabled: bool) -> Self {
        self.high_contrast = enabled;
        self
    }
}

/// Rule id, minimum level and WCAG success criterion.
const RULES: [(&str, WcagLevel, &str); 8] = [
    ("img-alt", WcagLevel::A, "1.1.1"),
    ("page-has-h1", WcagLevel::A, "1.3.1"),
    ("heading-order", WcagLevel::A, "1.3.1"),
    ("link-name", WcagLevel::A, "2.4.4"),
    ("table-header", WcagLevel::A, "1.3.1"),
    ("table-caption", WcagLevel::A, "1.3.1"),
    ("html-lang", WcagLevel::A, "3.1.1"),
    ("label", WcagLevel::A, "1.3.1"),
];

const ARIA_RULE: (&str, WcagLevel, &str) = ("aria-valid", WcagLevel::A, "4.1.2");

const VALID_ROLES: [&str; 69] = [
    "alert", "alertdialog", "application", "article", "banner", "button", "cell", "checkbox",
    "columnheader", "combobox", "complementary", "contentinfo", "definition", "dialog",
    "directory", "document", "feed", "figure", "form", "grid", "gridcell", "group", "heading",
    "img", "link", "list", "listbox", "listitem", "log", "main", "marquee", "math", "menu",
    "menubar", "menuitem", "menuitemcheckbox", "menuitemradio", "navigation", "none", "note",
    "option", "presentation", "progressbar", "radio", "radiogroup", "region", "row", "rowgroup",
    "rowheader", "scrollbar", "search", "searchbox", "separator", "slider", "spinbutton",
    "status", "switch", "tab", "table", "tablist", "tabpanel", "term", "textbox", "timer",
    "toolbar", "tooltip", "tree", "treegrid", "treeitem",
];

const GENERIC_LINK_TEXT: [&str; 5] = ["click here", "read more", "learn more", "here", "more"];

const SKIP_LINK: &str = "<a href=\"#main-content\" class=\"skip-link\">Skip to main content</a>";

const SKIP_LINK_CSS: &str = "<style>.skip-link{position:absolute;top:-40px;left:0;background:#000;color:#fff;padding:8px;z-index:100;}.skip-link:focus{top:0;}</style>\n";

const FOCUS_CSS: &str = "<style>:focus{outline:2px solid #4e79a7;outline-offset:2px;}:focus:not(:focus-visible){outline:none;}:focus-visible{outline:2px solid #4e79a7;outline-offset:2px;}</style>\n";

const HIGH_CONTRAST_CSS: &str = "<style>@media (prefers-contrast: high){body{background:#000!important;color:#fff!important;}a{color:#ff0!important;}button{border:2px solid #fff!important;}}</style>\n";

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        fn $name() -> &'static Regex {
            static PATTERN: OnceLock<Regex> = OnceLock::new();
            PATTERN.get_or_init(|| Regex::new($re).unwrap())
        }
    };
}

pattern!(img_tag, r"(?i)<img\b[^>]*>");
pattern!(heading_tag, r"(?i)<h([1-6])\b[^>]*>");
pattern!(link_tag, r"(?is)<a\b([^>]*)>(.*?)</a>");
pattern!(table_tag, r"(?is)<table\b[^>]*>(.*?)</table>");
pattern!(html_tag, r"(?i)<html\b[^>]*>");
pattern!(input_tag, r"(?i)<input\b[^>]*>");
pattern!(id_attr, r#"\bid=["']([^"']+)["']"#);
pattern!(role_attr, r#"(?i)\brole=["']([^"']+)["']"#);
pattern!(body_tag, r"(?i)<body\b[^>]*>");
pattern!(container_tag, r#"<div class="container"[^>]*>"#);

fn snippet(tag: &str) -> String {
    tag.chars().take(100).collect()
}

fn issue(rule_id: &str, severity: Severity, message: impl Into<String>) -> AccessibilityIssue {
    let criterion = RULES
        .iter()
        .chain(std::iter::once(&ARIA_RULE))
        .find(|(id, _, _)| *id == rule_id)
        .map(|(_, _, c)| c.to_string());
    AccessibilityIssue {
        rule_id: rule_id.to_string(),
        severity,
        message: message.into(),
        element: None,
        suggestion: None,
        wcag_criteria: criterion,
    }
}

impl AccessibilityIssue {
    fn at(mut self, element: &str) -> Self {
        self.element = Some(snippet(element));
        self
    }

    fn hint(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

fn rule_level(rule_id: &str) -> WcagLevel {
    RULES
        .iter()
        .chain(std::iter::once(&ARIA_RULE))
        .find(|(id, _, _)| *id == rule_id)
        .map_or(WcagLevel::A, |(_, level, _)| *level)
}

/// Check markup against the rules that apply at `level`.
pub fn validate(html: &str, level: WcagLevel) -> AccessibilityReport {
    let mut issues = Vec::new();
    check_images(html, &mut issues);
    check_headings(html, &mut issues);
    check_links(html, &mut issues);
    check_tables(html, &mut issues);
    check_language(html, &mut issues);
    check_forms(html, &mut issues);
    check_aria(html, &mut issues);
    issues.retain(|i| rule_level(&i.rule_id) <= level);

    let count = |severity| issues.iter().filter(|i| i.severity == severity).count();
    let summary = IssueSummary {
        errors: count(Severity::Error),
        warnings: count(Severity::Warning),
        info: count(Severity::Info),
    };
    let penalty = summary.errors * 10 + summary.warnings * 2;
    let score = 100usize.saturating_sub(penalty) as f64;

    log::debug!(
        "Accessibility at {}: {} errors, {} warnings, score {}",
        level,
        summary.errors,
        summary.warnings,
        score
    );

    AccessibilityReport {
        passed: summary.errors == 0,
        wcag_level: level,
        issues,
        score,
        summary,
    }
}

fn check_images(html: &str, issues: &mut Vec<AccessibilityIssue>) {
    for tag in img_tag().find_iter(html) {
        if !tag.as_str().to_lowercase().contains("alt=") {
            issues.push(
                issue("img-alt", Severity::Error, "Image missing alt attribute")
                    .at(tag.as_str())
                    .hint("Add alt text, or alt=\"\" for decorative images"),
            );
        }
    }
}

fn check_headings(html: &str, issues: &mut Vec<AccessibilityIssue>) {
    let levels: Vec<u32> = heading_tag()
        .captures_iter(html)
        .filter_map(|c| c[1].parse().ok())
        .collect();

    match levels.iter().filter(|&&l| l == 1).count() {
        0 => issues.push(
            issue("page-has-h1", Severity::Warning, "Page should have an h1 heading")
                .hint("Add an h1 element as the main page heading"),
        ),
        1 => {}
        n => issues.push(
            issue(
                "page-has-h1",
                Severity::Warning,
                format!("Page has {n} h1 headings, should have exactly one"),
            )
            .hint("Use only one h1 for the main page heading"),
        ),
    }

    for pair in levels.windows(2) {
        let (prev, level) = (pair[0], pair[1]);
        if level > prev + 1 {
            issues.push(
                issue(
                    "heading-order",
                    Severity::Warning,
                    format!("Heading level skipped from h{prev} to h{level}"),
                )
                .hint(format!("Use h{} instead of h{level}", prev + 1)),
            );
        }
    }
}

fn check_links(html: &str, issues: &mut Vec<AccessibilityIssue>) {
    for caps in link_tag().captures_iter(html) {
        let tag = &caps[0];
        let text = caps[2].trim();
        if text.is_empty() && !caps[1].to_lowercase().contains("aria-label") {
            issues.push(
                issue("link-name", Severity::Error, "Link has no discernible text")
                    .at(tag)
                    .hint("Add link text or an aria-label attribute"),
            );
        } else if GENERIC_LINK_TEXT.contains(&text.to_lowercase().as_str()) {
            issues.push(
                issue(
                    "link-name",
                    Severity::Warning,
                    format!("Link text '{text}' is not descriptive"),
                )
                .at(tag)
                .hint("Use link text that names the destination"),
            );
        }
    }
}

fn check_tables(html: &str, issues: &mut Vec<AccessibilityIssue>) {
    for caps in table_tag().captures_iter(html) {
        let content = caps[1].to_lowercase();
        if !content.contains("<th") {
            issues.push(
                issue("table-header", Severity::Error, "Table missing header cells (th)")
                    .hint("Add th elements for table headers"),
            );
        }
        if !content.contains("<caption") {
            issues.push(
                issue("table-caption", Severity::Warning, "Table missing caption")
                    .hint("Add a caption element that describes the table"),
            );
        }
    }
}

fn check_language(html: &str, issues: &mut Vec<AccessibilityIssue>) {
    if let Some(tag) = html_tag().find(html) {
        if !tag.as_str().to_lowercase().contains("lang=") {
            issues.push(
                issue("html-lang", Severity::Error, "HTML element missing lang attribute")
                    .hint("Add lang=\"en\" or the page's language code"),
            );
        }
    }
}

fn check_forms(html: &str, issues: &mut Vec<AccessibilityIssue>) {
    for tag in input_tag().find_iter(html) {
        let tag = tag.as_str();
        let lower = tag.to_lowercase();
        if lower.contains("type=\"hidden\"") || lower.contains("type=\"submit\"") {
            continue;
        }
        let Some(id) = id_attr().captures(tag).map(|c| c[1].to_string()) else {
            continue;
        };
        let label = format!(r#"(?i)<label[^>]*for=["']?{}["']?"#, regex::escape(&id));
        let labelled = Regex::new(&label).is_ok_and(|re| re.is_match(html));
        if !labelled && !lower.contains("aria-label") {
            issues.push(
                issue(
                    "label",
                    Severity::Error,
                    format!("Input '{id}' has no associated label"),
                )
                .at(tag)
                .hint("Add a label element with a for attribute, or aria-label"),
            );
        }
    }
}

fn check_aria(html: &str, issues: &mut Vec<AccessibilityIssue>) {
    for caps in role_attr().captures_iter(html) {
        let role = caps[1].to_lowercase();
        if !VALID_ROLES.contains(&role.as_str()) {
            issues.push(
                issue(
                    "aria-valid",
                    Severity::Error,
                    format!("Invalid ARIA role: '{role}'"),
                )
                .hint("Use a role defined by WAI-ARIA"),
            );
        }
    }
}

/// Add attributes to every tag matched by `tag`, unless the tag already
/// carries `attr_name`.
fn add_attribute(html: &str, tag: &Regex, attr_name: &str, attrs: &str) -> String {
    tag.replace_all(html, |caps: &Captures| {
        let whole = &caps[0];
        if whole.contains(attr_name) {
            whole.to_string()
        } else {
            format!("{} {}{}", &caps[1], attrs, &caps[2])
        }
    })
    .into_owned()
}

// Group 1 is the tag name plus its marker attribute, group 2 the rest
pattern!(canvas_open, r"(<canvas)(\b[^>]*>)");
pattern!(map_open, r#"(<div class="map-container")([^>]*>)"#);
pattern!(quiz_options_open, r#"(<div class="quiz-options")([^>]*>)"#);
pattern!(quiz_feedback_open, r#"(<div class="quiz-feedback")([^>]*>)"#);
pattern!(code_output_open, r#"(<pre class="code-output")([^>]*>)"#);
pattern!(timeline_open, r#"(<div class="timeline-container[^"]*")([^>]*>)"#);
pattern!(nav_open, r"(?i)(<nav)(\b[^>]*>)");

fn add_aria_labels(html: &str) -> String {
    let html = add_attribute(html, canvas_open(), "role=", r#"role="img" aria-label="Chart""#);
    let html = add_attribute(&html, map_open(), "role=", r#"role="region" aria-label="Map""#);
    let html = add_attribute(&html, quiz_options_open(), "role=", r#"role="radiogroup""#);
    let html = add_attribute(&html, quiz_feedback_open(), "aria-live=", r#"aria-live="polite""#);
    let html = add_attribute(&html, code_output_open(), "aria-live=", r#"aria-live="polite""#);
    let html = add_attribute(
        &html,
        timeline_open(),
        "role=",
        r#"role="list" aria-label="Timeline""#,
    );
    add_attribute(&html, nav_open(), "aria-label=", r#"aria-label="Main navigation""#)
}

/// Apply the enabled enhancements to a full page.
///
/// Applying it twice gives the same page as applying it once.
pub fn enhance(html: &str, options: &AccessibilityOptions) -> String {
    let mut out = html.to_string();

    if let Some(tag) = html_tag().find(&out) {
        if !tag.as_str().contains("lang=") {
            let lang = format!(" lang=\"{}\"", escape_html(&options.language));
            out.insert_str(tag.start() + "<html".len(), &lang);
        }
    }

    if options.skip_link && !out.contains("class=\"skip-link\"") {
        if let Some(body) = body_tag().find(&out) {
            out.insert_str(body.end(), &format!("\n{SKIP_LINK}"));
            if !out.contains("id=\"main-content\"") {
                if let Some(container) = container_tag().find(&out) {
                    out.insert_str(container.start() + "<div".len(), " id=\"main-content\"");
                }
            }
            insert_head_style(&mut out, SKIP_LINK_CSS);
        }
    }

    if options.aria_labels {
        out = add_aria_labels(&out);
    }
    if options.focus_styles {
        insert_head_style(&mut out, FOCUS_CSS);
    }
    if options.high_contrast {
        insert_head_style(&mut out, HIGH_CONTRAST_CSS);
    }
    out
}

fn insert_head_style(html: &mut String, style: &str) {
    if html.contains(style) {
        return;
    }
    if let Some(pos) = html.find("</head>") {
        html.insert_str(pos, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<title>T</title>
</head>
<body class="theme-light">
<div class="container" role="main">
<h1>Title</h1>
<h3>Skipped</h3>
<img src="a.png">
<table>
<thead><tr><th>A</th></tr></thead>
</table>
<div class="quiz-options">
<label class="quiz-option"><input type="radio" name="quiz-q" value="0"> A</label>
</div>
</div>
</body>
</html>
"#;

    #[test]
    fn test_validate_counts_and_score() {
        let report = validate(PAGE, WcagLevel::AA);
        assert_eq!(report.by_rule("img-alt").count(), 1);
        assert_eq!(report.by_rule("heading-order").count(), 1);
        assert_eq!(report.by_rule("table-caption").count(), 1);
        assert_eq!(report.by_rule("table-header").count(), 0);
        assert_eq!(report.by_rule("html-lang").count(), 0);

        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.warnings, 2);
        assert_eq!(report.score, 86.0);
        assert!(!report.passed);
        assert_eq!(
            report.by_rule("img-alt").next().unwrap().wcag_criteria.as_deref(),
            Some("1.1.1")
        );
    }

    #[test]
    fn test_validate_language_links_forms_roles() {
        let html = r#"<html><body><h1>x</h1><h1>y</h1><a href="/a"></a><a href="/b">click here</a>
<a href="/c" aria-label="Close"></a><input id="q" type="text"><label for="n">N</label>
<input id="n"><div role="banana"></div></body></html>"#;
        let report = validate(html, WcagLevel::A);

        assert_eq!(report.by_rule("html-lang").count(), 1);
        assert_eq!(report.by_rule("page-has-h1").count(), 1);
        let links: Vec<_> = report.by_rule("link-name").map(|i| i.severity).collect();
        assert_eq!(links, vec![Severity::Error, Severity::Warning]);
        let labels: Vec<_> = report.by_rule("label").collect();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].message.contains("'q'"));
        assert_eq!(report.by_rule("aria-valid").count(), 1);
        assert_eq!(report.wcag_level, WcagLevel::A);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let html = "<img>".repeat(12);
        let report = validate(&html, WcagLevel::AAA);
        assert_eq!(report.summary.errors, 12);
        assert_eq!(report.score, 0.0);
    }

    #[test]
    fn test_enhance_page() {
        let html = enhance(PAGE, &AccessibilityOptions::new());
        assert!(html.contains(
            "<body class=\"theme-light\">\n<a href=\"#main-content\" class=\"skip-link\">"
        ));
        assert!(html.contains(r#"<div id="main-content" class="container" role="main">"#));
        assert!(html.contains(r#"<div class="quiz-options" role="radiogroup">"#));
        assert!(html.contains(":focus-visible"));
        assert!(html.contains("prefers-contrast: high"));
        assert!(html.find(".skip-link{").unwrap() < html.find("</head>").unwrap());

        assert_eq!(enhance(&html, &AccessibilityOptions::new()), html);
    }

    #[test]
    fn test_enhance_widgets_and_language() {
        let html = r#"<html><head></head><body>
<canvas id="canvas-t"></canvas>
<div class="map-container" id="map-m"></div>
<div class="quiz-feedback" id="feedback-q"></div>
<pre class="code-output" id="output-c"></pre>
<div class="timeline-container timeline-vertical" id="timeline-t"></div>
</body></html>"#;
        let options = AccessibilityOptions::new()
            .with_language("de")
            .with_skip_link(false)
            .with_focus_styles(false)
            .with_high_contrast(false);
        let out = enhance(html, &options);

        assert!(out.starts_with(r#"<html lang="de">"#));
        assert!(out.contains(r#"<canvas role="img" aria-label="Chart" id="canvas-t">"#));
        assert!(out.contains(
            r#"<div class="map-container" role="region" aria-label="Map" id="map-m">"#
        ));
        assert!(out.contains(r#"<div class="quiz-feedback" aria-live="polite" id="feedback-q">"#));
        assert!(out.contains(r#"<pre class="code-output" aria-live="polite" id="output-c">"#));
        assert!(out.contains(r#"role="list" aria-label="Timeline""#));
        assert!(!out.contains("skip-link"));
        assert!(!out.contains("<style>"));
    }

    #[test]
    fn test_enhance_fragment_has_no_page_parts() {
        let out = enhance("<canvas id=\"c\"></canvas>", &AccessibilityOptions::new());
        assert_eq!(out, r#"<canvas role="img" aria-label="Chart" id="c"></canvas>"#);
    }
}
