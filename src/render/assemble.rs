//! Final document assembly with conditional library includes.

use super::accessibility::enhance;
use super::html::escape_html;
use super::options::RenderOptions;
use super::result::RenderedBlock;

const CHART_JS: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js";
const PRISM_CSS: &str = "https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/themes/prism-tomorrow.min.css";
const PRISM_JS: &str = "https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/prism.min.js";
const PRISM_COMPONENTS: [&str; 2] = [
    "https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/components/prism-python.min.js",
    "https://cdnjs.cloudflare.com/ajax/libs/prism/1.29.0/components/prism-javascript.min.js",
];
const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

/// Client-side libraries a page may need.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Libraries {
    pub charts: bool,
    pub highlighting: bool,
    pub maps: bool,
}

impl Libraries {
    /// Libraries required by the rendered blocks.
    pub fn for_blocks(blocks: &[RenderedBlock]) -> Self {
        blocks.iter().fold(Self::default(), |acc, b| Self {
            charts: acc.charts || b.widget.needs_charts(),
            highlighting: acc.highlighting || b.widget.needs_highlighting(),
            maps: acc.maps || b.widget.needs_maps(),
        })
    }

    /// `<link>` and `<script>` tags for the required libraries.
    pub fn tags(&self) -> String {
        let mut tags = String::new();
        if self.charts {
            tags.push_str(&format!("<script src=\"{CHART_JS}\"></script>\n"));
        }
        if self.highlighting {
            tags.push_str(&format!("<link rel=\"stylesheet\" href=\"{PRISM_CSS}\">\n"));
            tags.push_str(&format!("<script src=\"{PRISM_JS}\"></script>\n"));
            for component in PRISM_COMPONENTS {
                tags.push_str(&format!("<script src=\"{component}\"></script>\n"));
            }
            tags.push_str(
                "<script>document.addEventListener('DOMContentLoaded', function() { Prism.highlightAll(); });</script>\n",
            );
        }
        if self.maps {
            tags.push_str(&format!("<link rel=\"stylesheet\" href=\"{LEAFLET_CSS}\">\n"));
            tags.push_str(&format!("<script src=\"{LEAFLET_JS}\"></script>\n"));
        }
        tags
    }
}

/// Join rendered blocks into the final markup, enhanced for accessibility
/// when the options ask for it.
pub fn assemble(blocks: &[RenderedBlock], options: &RenderOptions) -> String {
    let page = assemble_page(blocks, options);
    match &options.accessibility {
        Some(a11y) => enhance(&page, a11y),
        None => page,
    }
}

fn assemble_page(blocks: &[RenderedBlock], options: &RenderOptions) -> String {
    let libraries = Libraries::for_blocks(blocks).tags();
    let body = blocks
        .iter()
        .map(|b| b.html.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    if !options.standalone {
        return format!("{libraries}{body}\n");
    }

    let extra_css = options.extra_css.as_deref().unwrap_or("");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{css}{extra_css}</style>
{libraries}</head>
<body class="theme-{theme}">
<div class="container" role="main">
{body}
</div>
</body>
</html>
"#,
        title = escape_html(&options.title),
        css = options.theme.css(),
        theme = options.theme,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{AccessibilityOptions, Theme, Widget};

    fn block(widget: Widget, html: &str) -> RenderedBlock {
        RenderedBlock {
            block_id: "b".into(),
            widget,
            html: html.into(),
            fallback: None,
        }
    }

    #[test]
    fn test_structural_only_has_no_libraries() {
        let html = assemble(&[block(Widget::Structural, "<p>x</p>")], &RenderOptions::new());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<p>x</p>"));
        assert!(!html.contains("chart.js"));
        assert!(!html.contains("prism"));
        assert!(!html.contains("leaflet"));
    }

    #[test]
    fn test_libraries_follow_widgets() {
        let blocks = [
            block(Widget::Hybrid, ""),
            block(Widget::ExecutableCode, ""),
        ];
        let libs = Libraries::for_blocks(&blocks);
        assert_eq!(
            libs,
            Libraries {
                charts: true,
                highlighting: true,
                maps: false
            }
        );
        let tags = libs.tags();
        assert!(tags.contains(CHART_JS));
        assert!(tags.contains("Prism.highlightAll"));
        assert!(!tags.contains(LEAFLET_JS));
    }

    #[test]
    fn test_theme_and_title() {
        let options = RenderOptions::new()
            .with_theme(Theme::Dark)
            .with_title("Q&A");
        let html = assemble(&[block(Widget::Map, "<div></div>")], &options);
        assert!(html.contains(r#"<body class="theme-dark">"#));
        assert!(html.contains("<title>Q&amp;A</title>"));
        assert!(html.contains(LEAFLET_CSS));
    }

    #[test]
    fn test_accessibility_enhancement() {
        let blocks = [block(Widget::Chart, "<canvas id=\"c\"></canvas>")];
        let plain = assemble(&blocks, &RenderOptions::new());
        assert!(!plain.contains("skip-link"));

        let options = RenderOptions::new().with_accessibility(AccessibilityOptions::new());
        let html = assemble(&blocks, &options);
        assert!(html.contains(r##"<a href="#main-content" class="skip-link">"##));
        assert!(html.contains(r#"<div id="main-content" class="container" role="main">"#));
        assert!(html.contains(r#"<canvas role="img" aria-label="Chart" id="c">"#));
    }

    #[test]
    fn test_fragment() {
        let options = RenderOptions::new().fragment();
        let html = assemble(&[block(Widget::Chart, "<canvas></canvas>")], &options);
        assert!(!html.contains("<html"));
        assert!(html.starts_with("<script src="));
        assert!(html.contains("<canvas></canvas>"));
    }
}
