//! Chart extraction from pipe-delimited tables and chart markup.

use super::html::{escape_html, pipe_rows, render_table, script_json, script_str};
use crate::error::{Error, Result};
use crate::model::ComponentKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Series colors, cycled by dataset index.
pub const PALETTE: [&str; 15] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab", "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
];

/// Chart flavor understood by the charting library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
        }
    }

    /// Chart kind for a component kind; non-chart kinds become bar.
    pub fn from_component(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::ChartLine => ChartKind::Line,
            ComponentKind::ChartPie => ChartKind::Pie,
            _ => ChartKind::Bar,
        }
    }
}

/// One or many colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Colors {
    One(String),
    Many(Vec<String>),
}

/// A numeric series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<f64>,
    pub background_color: Colors,
    pub border_color: String,
    pub border_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
}

/// Labels plus datasets, in the charting library's data shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?\d+\.?\d*").unwrap())
}

/// First number in a cell after removing currency symbols, percent signs,
/// thousands separators and whitespace. Cells without a number count as 0.
pub fn extract_numeric(cell: &str) -> f64 {
    let cleaned: String = cell
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | '%' | ',') && !c.is_whitespace())
        .collect();
    number_pattern()
        .find(&cleaned)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// Parse a pipe table into chart data.
///
/// The first row holds the headers. Every following row contributes its
/// first cell as a label and the remaining cells, in header order, to one
/// series per value column. A table with a single header column gets one
/// series named `Value`. Blank cells count as 0 in their own column, and
/// short rows are padded with 0.
pub fn extract_chart_data(block_id: &str, text: &str, kind: ChartKind) -> Result<ChartData> {
    if !text.contains('|') {
        return Err(Error::malformed(block_id, "no pipe characters"));
    }
    let rows = pipe_rows(text);
    let Some((headers, body)) = rows.split_first() else {
        return Err(Error::malformed(block_id, "empty table"));
    };
    if body.is_empty() {
        return Err(Error::malformed(block_id, "no data rows"));
    }

    let columns: Vec<String> = if headers.len() > 1 {
        headers[1..].to_vec()
    } else {
        vec!["Value".to_string()]
    };

    let labels: Vec<String> = body.iter().map(|row| row[0].clone()).collect();
    let series: Vec<Vec<f64>> = (0..columns.len())
        .map(|col| {
            body.iter()
                .map(|row| row.get(col + 1).map_or(0.0, |cell| extract_numeric(cell)))
                .collect()
        })
        .collect();

    let datasets = match kind {
        ChartKind::Pie => {
            // Pie charts show the first series only
            let data = series.into_iter().next().unwrap_or_default();
            let colors = (0..data.len())
                .map(|i| PALETTE[i % PALETTE.len()].to_string())
                .collect();
            vec![Dataset {
                label: None,
                data,
                background_color: Colors::Many(colors),
                border_color: "#fff".to_string(),
                border_width: 2,
                fill: None,
            }]
        }
        ChartKind::Bar | ChartKind::Line => columns
            .into_iter()
            .zip(series)
            .enumerate()
            .map(|(i, (label, data))| {
                let color = PALETTE[i % PALETTE.len()];
                let line = kind == ChartKind::Line;
                Dataset {
                    label: Some(label),
                    data,
                    background_color: Colors::One(if line {
                        format!("{color}33")
                    } else {
                        color.to_string()
                    }),
                    border_color: color.to_string(),
                    border_width: 2,
                    fill: Some(line),
                }
            })
            .collect(),
    };

    Ok(ChartData { labels, datasets })
}

/// Chart markup: a canvas, the data as an inline JSON script, and the
/// initialization script.
pub fn render_chart(
    block_id: &str,
    data: &ChartData,
    kind: ChartKind,
    title: &str,
) -> Result<String> {
    let id = escape_html(block_id);
    let config = serde_json::json!({
        "type": kind.as_str(),
        "data": data,
        "options": {
            "responsive": true,
            "maintainAspectRatio": false,
            "plugins": {
                "title": { "display": true, "text": title },
                "legend": { "display": true, "position": "top" }
            }
        }
    });
    let config = script_json(&config)?;
    let config_id = script_str(&format!("chart-config-{block_id}"));
    let canvas_id = script_str(&format!("canvas-{block_id}"));

    Ok(format!(
        r#"<div class="chart-container" id="chart-{id}" data-chart-type="{kind}">
<canvas id="canvas-{id}"></canvas>
</div>
<script type="application/json" id="chart-config-{id}">{config}</script>
<script>
(function() {{
  var config = JSON.parse(document.getElementById({config_id}).textContent);
  new Chart(document.getElementById({canvas_id}).getContext('2d'), config);
}})();
</script>"#,
        kind = kind.as_str(),
    ))
}

/// Table and chart side by side.
pub fn render_hybrid(
    block_id: &str,
    text: &str,
    data: &ChartData,
    kind: ChartKind,
    title: &str,
) -> Result<String> {
    let chart = render_chart(block_id, data, kind, title)?;
    Ok(format!(
        "<div class=\"hybrid-container\" id=\"hybrid-{}\">\n<div class=\"table-section\">{}</div>\n<div class=\"chart-section\">{}</div>\n</div>",
        escape_html(block_id),
        render_table(text),
        chart
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_numeric() {
        assert_eq!(extract_numeric("$1,250.50"), 1250.5);
        assert_eq!(extract_numeric("45%"), 45.0);
        assert_eq!(extract_numeric("-3"), -3.0);
        assert_eq!(extract_numeric("€ 9"), 9.0);
        assert_eq!(extract_numeric("n/a"), 0.0);
    }

    #[test]
    fn test_single_series() {
        let data =
            extract_chart_data("t", "Name | Sales\nA | 100\nB | 200", ChartKind::Bar).unwrap();
        assert_eq!(data.labels, vec!["A", "B"]);
        assert_eq!(data.datasets.len(), 1);
        assert_eq!(data.datasets[0].data, vec![100.0, 200.0]);
        assert_eq!(data.datasets[0].label.as_deref(), Some("Sales"));
        assert_eq!(data.datasets[0].fill, Some(false));
    }

    #[test]
    fn test_multi_series_with_separator() {
        let text = "| Q | North | South |\n|---|---|---|\n| Q1 | 10 | 7 |\n| Q2 | 12 |";
        let data = extract_chart_data("t", text, ChartKind::Line).unwrap();
        assert_eq!(data.labels, vec!["Q1", "Q2"]);
        assert_eq!(data.datasets.len(), 2);
        assert_eq!(data.datasets[1].data, vec![7.0, 0.0]);
        assert_eq!(data.datasets[0].background_color, Colors::One("#4e79a733".into()));
        assert_eq!(data.datasets[1].border_color, PALETTE[1]);
    }

    #[test]
    fn test_blank_cell_stays_in_its_column() {
        let data = extract_chart_data("t", "Q | North | South\nQ1 |  | 7", ChartKind::Bar).unwrap();
        assert_eq!(data.datasets[0].data, vec![0.0]);
        assert_eq!(data.datasets[1].data, vec![7.0]);
    }

    #[test]
    fn test_palette_repeats_past_its_end() {
        let header: Vec<String> = (1..=18).map(|i| format!("S{i}")).collect();
        let values: Vec<String> = (1..=18).map(|i| i.to_string()).collect();
        let text = format!("Row | {}\nr1 | {}", header.join(" | "), values.join(" | "));

        let data = extract_chart_data("t", &text, ChartKind::Bar).unwrap();
        assert_eq!(data.datasets.len(), 18);
        assert_eq!(data.datasets[14].border_color, PALETTE[14]);
        assert_eq!(data.datasets[15].border_color, PALETTE[0]);
        assert_eq!(data.datasets[17].border_color, PALETTE[2]);
        assert_eq!(data.datasets[17].data, vec![18.0]);
    }

    #[test]
    fn test_pie_uses_first_series() {
        let data =
            extract_chart_data("t", "K | V | W\nx | 1 | 5\ny | 2 | 6", ChartKind::Pie).unwrap();
        assert_eq!(data.datasets.len(), 1);
        assert_eq!(data.datasets[0].data, vec![1.0, 2.0]);
        assert_eq!(
            data.datasets[0].background_color,
            Colors::Many(vec![PALETTE[0].into(), PALETTE[1].into()])
        );
    }

    #[test]
    fn test_single_column_series_is_value() {
        let data = extract_chart_data("t", "Item |\nx | 4", ChartKind::Bar).unwrap();
        assert_eq!(data.datasets[0].label.as_deref(), Some("Value"));
        assert_eq!(data.datasets[0].data, vec![4.0]);
    }

    #[test]
    fn test_malformed_tables() {
        let err = extract_chart_data("t", "just words", ChartKind::Bar).unwrap_err();
        assert!(matches!(err, Error::MalformedContent { .. }));
        assert!(extract_chart_data("t", "A | B", ChartKind::Bar).is_err());
    }

    #[test]
    fn test_render_chart_embeds_data() {
        let data = extract_chart_data("t", "A | B\nx | 1", ChartKind::Bar).unwrap();
        let html = render_chart("t", &data, ChartKind::Bar, "</script>").unwrap();
        assert!(html.contains(r#"<canvas id="canvas-t">"#));
        assert!(html.contains(r#""type":"bar""#));
        assert!(!html.contains("\"</script>\""));
    }

    #[test]
    fn test_script_looks_up_raw_block_id() {
        let data = extract_chart_data("a'b&c", "A | B\nx | 1", ChartKind::Bar).unwrap();
        let html = render_chart("a'b&c", &data, ChartKind::Bar, "T").unwrap();
        assert!(html.contains(r#"id="chart-config-a&#39;b&amp;c""#));
        assert!(html.contains(r#"document.getElementById("chart-config-a'b&c")"#));
        assert!(html.contains(r#"document.getElementById("canvas-a'b&c")"#));
    }

    #[test]
    fn test_hybrid_keeps_table() {
        let text = "A | B\nx | 1";
        let data = extract_chart_data("t", text, ChartKind::Bar).unwrap();
        let html = render_hybrid("t", text, &data, ChartKind::Bar, "T").unwrap();
        assert!(html.contains("hybrid-container"));
        assert!(html.contains("<table>"));
        assert!(html.contains("chart-container"));
    }
}
