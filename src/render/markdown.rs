//! Markdown export of content blocks.

use super::html::{heading_level, pipe_rows, strip_code_fences};
use crate::model::{BlockKind, ContentBlock, ALT_TEXT, IMAGE_PATH};
use crate::suggest::detect_language;

/// Options for Markdown export.
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Insert a horizontal rule where the page number changes
    pub page_separators: bool,

    /// Character to use for unordered list markers
    pub list_marker: char,

    /// Escape special Markdown characters
    pub escape_special_chars: bool,

    /// Precede each block with an HTML comment naming its id
    pub include_block_ids: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            page_separators: true,
            list_marker: '-',
            escape_special_chars: false,
            include_block_ids: false,
        }
    }
}

impl MarkdownOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable page separators.
    pub fn with_page_separators(mut self, enabled: bool) -> Self {
        self.page_separators = enabled;
        self
    }

    /// Set the list marker character.
    pub fn with_list_marker(mut self, marker: char) -> Self {
        self.list_marker = marker;
        self
    }

    /// Enable or disable escaping of special characters.
    pub fn with_escaping(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Enable or disable block id comments.
    pub fn with_block_ids(mut self, include: bool) -> Self {
        self.include_block_ids = include;
        self
    }
}

/// Convert blocks to Markdown.
pub fn to_markdown(blocks: &[ContentBlock], options: &MarkdownOptions) -> String {
    MarkdownRenderer::new(options.clone()).render(blocks)
}

/// Markdown renderer.
pub struct MarkdownRenderer {
    options: MarkdownOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }

    /// Render blocks to Markdown.
    pub fn render(&self, blocks: &[ContentBlock]) -> String {
        let mut output = String::new();
        let mut page = blocks.first().map(|b| b.page);

        for block in blocks.iter().filter(|b| !b.is_empty()) {
            if self.options.page_separators && page.is_some_and(|p| p != block.page) {
                output.push_str("---\n\n");
            }
            page = Some(block.page);

            if self.options.include_block_ids {
                output.push_str(&format!("<!-- block:{} -->\n", block.id));
            }
            self.render_block(&mut output, block);
        }

        output.trim().to_string()
    }

    fn render_block(&self, output: &mut String, block: &ContentBlock) {
        let text = block.text.trim();
        match block.kind {
            BlockKind::Heading => {
                let prefix = "#".repeat(heading_level(block.font_size()) as usize);
                output.push_str(&format!("{} {}\n\n", prefix, self.inline(text)));
            }
            BlockKind::Paragraph => {
                output.push_str(&self.inline(text));
                output.push_str("\n\n");
            }
            BlockKind::Table => self.render_table(output, text),
            BlockKind::List => self.render_list(output, text),
            BlockKind::Code => {
                let code = strip_code_fences(text);
                let lang = match detect_language(&code) {
                    "text" => "",
                    lang => lang,
                };
                output.push_str(&format!("```{lang}\n{code}\n```\n\n"));
            }
            BlockKind::Image => {
                let path = block.attr_str(IMAGE_PATH).unwrap_or(text);
                let alt = block.attr_str(ALT_TEXT).unwrap_or("");
                output.push_str(&format!("![{}]({})\n\n", alt, path));
            }
            BlockKind::Quote => {
                for line in text.lines() {
                    output.push_str("> ");
                    output.push_str(&self.inline(line.trim()));
                    output.push('\n');
                }
                output.push('\n');
            }
        }
    }

    fn render_table(&self, output: &mut String, text: &str) {
        let rows = pipe_rows(text);
        if rows.is_empty() {
            output.push_str(&self.inline(text));
            output.push_str("\n\n");
            return;
        }

        let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
        for (i, row) in rows.iter().enumerate() {
            output.push('|');
            for col in 0..col_count {
                let cell = row.get(col).map(String::as_str).unwrap_or("");
                output.push_str(&format!(" {} |", cell.replace('|', "\\|")));
            }
            output.push('\n');

            // Add separator after header row
            if i == 0 {
                output.push('|');
                output.push_str(&" --- |".repeat(col_count));
                output.push('\n');
            }
        }
        output.push('\n');
    }

    fn render_list(&self, output: &mut String, text: &str) {
        let mut number = 0;
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if line.starts_with(|c: char| c.is_ascii_digit()) {
                number += 1;
                let item =
                    line.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')');
                output.push_str(&format!("{}. {}\n", number, self.inline(item.trim())));
            } else {
                let item = line.trim_start_matches(['-', '*', '•']);
                output.push_str(&format!(
                    "{} {}\n",
                    self.options.list_marker,
                    self.inline(item.trim())
                ));
            }
        }
        output.push('\n');
    }

    fn inline(&self, text: &str) -> String {
        if self.options.escape_special_chars {
            escape_markdown(text)
        } else {
            text.to_string()
        }
    }
}

/// Escape special Markdown characters.
/// Only escape characters that could be misinterpreted as Markdown syntax.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("Hello *world*"), "Hello \\*world\\*");
        assert_eq!(escape_markdown("[link]"), "\\[link\\]");
    }

    #[test]
    fn test_render_heading_and_paragraph() {
        let blocks = vec![
            ContentBlock::new("h", BlockKind::Heading, "Chapter 1").with_font_size(24.0),
            ContentBlock::new("p", BlockKind::Paragraph, "Hello, world!"),
        ];
        let md = to_markdown(&blocks, &MarkdownOptions::new());
        assert_eq!(md, "# Chapter 1\n\nHello, world!");
    }

    #[test]
    fn test_render_table_normalizes_rows() {
        let blocks = vec![ContentBlock::new("t", BlockKind::Table, "A | B\n---|---\n1 | 2\n3 |")];
        let md = to_markdown(&blocks, &MarkdownOptions::new());
        assert_eq!(md, "| A | B |\n| --- | --- |\n| 1 | 2 |\n| 3 |  |");
    }

    #[test]
    fn test_render_lists_and_code() {
        let blocks = vec![
            ContentBlock::new("l", BlockKind::List, "• one\n• two"),
            ContentBlock::new("o", BlockKind::List, "1) first\n2) second"),
            ContentBlock::new("c", BlockKind::Code, "def f():\n    return 1"),
        ];
        let md = to_markdown(&blocks, &MarkdownOptions::new().with_list_marker('*'));
        assert!(md.contains("* one\n* two"));
        assert!(md.contains("1. first\n2. second"));
        assert!(md.contains("```python\ndef f():\n    return 1\n```"));
    }

    #[test]
    fn test_page_separators_and_ids() {
        let blocks = vec![
            ContentBlock::new("a", BlockKind::Paragraph, "one").with_page(0),
            ContentBlock::new("b", BlockKind::Quote, "two").with_page(1),
        ];
        let md = to_markdown(&blocks, &MarkdownOptions::new().with_block_ids(true));
        assert_eq!(md, "<!-- block:a -->\none\n\n---\n\n<!-- block:b -->\n> two");

        let md = to_markdown(&blocks, &MarkdownOptions::new().with_page_separators(false));
        assert_eq!(md, "one\n\n> two");
    }
}
