//! HTML escaping and the plain structural renderers.

use crate::model::{BlockKind, ContentBlock, ALT_TEXT, IMAGE_PATH};

/// Escape `& < > " '` for use in HTML text and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Block id reduced to a JavaScript identifier fragment.
pub fn safe_id(id: &str) -> String {
    let mut out: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Element id as a JavaScript string literal for use inside `<script>`.
pub(crate) fn script_str(element_id: &str) -> String {
    serde_json::Value::from(element_id)
        .to_string()
        .replace("</", "<\\/")
}

/// Serialize a value for embedding inside a `<script>` element.
pub(crate) fn script_json<T: serde::Serialize>(value: &T) -> crate::error::Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Heading level for a font size: 24pt and up is h1, 18 h2, 14 h3, else h4.
pub fn heading_level(font_size: f64) -> u8 {
    if font_size >= 24.0 {
        1
    } else if font_size >= 18.0 {
        2
    } else if font_size >= 14.0 {
        3
    } else {
        4
    }
}

/// Strip surrounding Markdown code fences, if any.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let mut lines: Vec<&str> = trimmed.lines().collect();
    lines.remove(0);
    if lines.last().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.pop();
    }
    lines.join("\n")
}

/// Cells of every pipe-delimited row, skipping `---` separator rows.
/// Outer pipes are optional; a blank cell between two pipes keeps its
/// column as an empty string. Rows with only blank cells are skipped.
pub fn pipe_rows(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.contains('|') && !line.contains("---"))
        .map(|line| {
            let inner = line.strip_prefix('|').unwrap_or(line);
            let inner = inner.strip_suffix('|').unwrap_or(inner);
            inner
                .split('|')
                .map(|cell| cell.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|cells| cells.iter().any(|cell| !cell.is_empty()))
        .collect()
}

/// Render a block as plain semantic HTML.
pub fn render_structural(block: &ContentBlock) -> String {
    let text = block.text.trim();
    match block.kind {
        BlockKind::Heading => {
            let level = heading_level(block.font_size());
            format!("<h{level}>{}</h{level}>", escape_html(text))
        }
        BlockKind::Paragraph => format!("<p>{}</p>", escape_html(text).replace('\n', "<br>")),
        BlockKind::Table => render_table(text),
        BlockKind::List => render_list(text),
        BlockKind::Code => format!(
            "<pre><code>{}</code></pre>",
            escape_html(&strip_code_fences(text))
        ),
        BlockKind::Image => {
            let src = block.attr_str(IMAGE_PATH).unwrap_or(text);
            let alt = block.attr_str(ALT_TEXT).unwrap_or("Image");
            format!(
                "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
                escape_html(src),
                escape_html(alt)
            )
        }
        BlockKind::Quote => format!(
            "<blockquote>{}</blockquote>",
            escape_html(text).replace('\n', "<br>")
        ),
    }
}

/// Pipe rows as a `<table>` with the first row as header, or `<pre>` when
/// there are no pipe rows.
pub fn render_table(text: &str) -> String {
    let rows = pipe_rows(text);
    if rows.is_empty() {
        return format!("<pre>{}</pre>", escape_html(text));
    }

    let row_html = |cells: &[String], tag: &str| -> String {
        let cells: String = cells
            .iter()
            .map(|c| format!("<{tag}>{}</{tag}>", escape_html(c)))
            .collect();
        format!("<tr>{cells}</tr>")
    };

    let mut html = String::from("<table>\n<thead>");
    html.push_str(&row_html(&rows[0], "th"));
    html.push_str("</thead>\n<tbody>\n");
    for row in &rows[1..] {
        html.push_str(&row_html(row, "td"));
        html.push('\n');
    }
    html.push_str("</tbody>\n</table>");
    html
}

fn render_list(text: &str) -> String {
    let mut ordered = false;
    let items: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            if line.starts_with(|c: char| c.is_ascii_digit()) {
                ordered = true;
                line.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
            } else {
                line.trim_start_matches(['-', '*', '•'])
            }
            .trim()
            .to_string()
        })
        .collect();

    let tag = if ordered { "ol" } else { "ul" };
    let body: String = items
        .iter()
        .map(|i| format!("<li>{}</li>", escape_html(i)))
        .collect();
    format!("<{tag}>{body}</{tag}>")
}
