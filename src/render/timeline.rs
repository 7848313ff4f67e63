//! Vertical timeline widget.

use super::html::escape_html;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One dated event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub date: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl TimelineEvent {
    fn is_empty(&self) -> bool {
        self.date.is_empty() && self.title.is_empty() && self.description.is_empty()
    }

    fn add_line(&mut self, line: &str) {
        if self.title.is_empty() {
            self.title = line.to_string();
        } else {
            if !self.description.is_empty() {
                self.description.push(' ');
            }
            self.description.push_str(line);
        }
    }
}

/// Parse dated events from block text.
///
/// A line `DATE: TITLE` whose date part contains a digit starts a new event.
/// Other lines fill the current event's title, then its description. A
/// blank line closes the current event. Text with no dated line is
/// malformed.
pub fn extract_events(block_id: &str, text: &str) -> Result<Vec<TimelineEvent>> {
    let mut events = Vec::new();
    let mut current = TimelineEvent::default();

    for raw in text.lines() {
        let line = raw.trim().trim_start_matches(['-', '*', '•']).trim();
        if line.is_empty() {
            if !current.is_empty() {
                events.push(std::mem::take(&mut current));
            }
            continue;
        }

        match line.split_once(':') {
            Some((date, title)) if date.chars().any(|c| c.is_ascii_digit()) => {
                if !current.is_empty() {
                    events.push(std::mem::take(&mut current));
                }
                current.date = date.trim().to_string();
                current.title = title.trim().to_string();
            }
            _ => current.add_line(line),
        }
    }
    if !current.is_empty() {
        events.push(current);
    }

    if !events.iter().any(|e| !e.date.is_empty()) {
        return Err(Error::malformed(block_id, "no dated events"));
    }
    Ok(events)
}

/// Alternating left/right timeline markup.
pub fn render_timeline(block_id: &str, events: &[TimelineEvent]) -> String {
    let items: String = events
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let side = if i % 2 == 0 { "left" } else { "right" };
            let desc = if e.description.is_empty() {
                String::new()
            } else {
                format!("\n<div class=\"timeline-desc\">{}</div>", escape_html(&e.description))
            };
            format!(
                "<div class=\"timeline-item {side}\">\n<div class=\"timeline-content\">\n<div class=\"timeline-date\">{}</div>\n<div class=\"timeline-title\">{}</div>{desc}\n</div>\n</div>\n",
                escape_html(&e.date),
                escape_html(&e.title),
            )
        })
        .collect();

    format!(
        "<div class=\"timeline-container timeline-vertical\" id=\"timeline-{}\">\n<div class=\"timeline-line\"></div>\n{items}</div>",
        escape_html(block_id)
    )
}
