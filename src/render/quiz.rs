//! Interactive multiple-choice quiz markup.

use super::html::{escape_html, safe_id, script_str};
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// One answer option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub text: String,
    pub correct: bool,
}

/// A question and its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub question: String,
    pub options: Vec<QuizOption>,
}

impl Quiz {
    /// Index of the first correct option.
    pub fn correct_index(&self) -> usize {
        self.options.iter().position(|o| o.correct).unwrap_or(0)
    }
}

fn correct_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\(correct\)|\(answer\)|\*correct\*|\[correct\]|\(✓\)|✓|✔|★").unwrap()
    })
}

fn option_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[-*•]?\s*[a-dA-D1-4][.)]\s+").unwrap())
}

fn parse_option(line: &str) -> Option<QuizOption> {
    let mut correct = correct_marker().is_match(line);
    let text = correct_marker().replace_all(line, "");
    let text = option_marker().replace(text.trim(), "");
    let mut text = text.trim_start_matches(['-', '*', '•']).trim().to_string();

    if text.len() > 4 && text.starts_with("**") && text.ends_with("**") {
        correct = true;
        text = text[2..text.len() - 2].trim().to_string();
    }

    if text.is_empty() {
        None
    } else {
        Some(QuizOption { text, correct })
    }
}

/// Parse a list block into a quiz.
///
/// The first line is the question; a `?` is appended unless it already ends
/// in `?`, `:`, `.` or `!`. Remaining lines are options with `a)`, `B.`,
/// `1)` or bullet markers removed. An option is correct when it carries a
/// marker such as `(correct)` or `✓`, or is wrapped in `**`. Without any
/// marked option the first option is correct.
pub fn extract_quiz(block_id: &str, text: &str) -> Result<Quiz> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    let question = lines
        .next()
        .map(|l| l.trim_start_matches(['-', '*', '•']).trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| Error::malformed(block_id, "no question line"))?;
    let question = if question.ends_with(['?', ':', '.', '!']) {
        question
    } else {
        format!("{question}?")
    };

    let mut options: Vec<QuizOption> = lines.filter_map(parse_option).collect();
    if options.is_empty() {
        return Err(Error::malformed(block_id, "no answer options"));
    }
    if !options.iter().any(|o| o.correct) {
        options[0].correct = true;
    }

    Ok(Quiz { question, options })
}

fn option_letter(index: usize) -> String {
    if index < 26 {
        ((b'A' + index as u8) as char).to_string()
    } else {
        (index + 1).to_string()
    }
}

/// Quiz markup with a check button and per-option correctness flags.
pub fn render_quiz(block_id: &str, quiz: &Quiz) -> String {
    let id = escape_html(block_id);
    let fn_name = format!("checkQuiz_{}", safe_id(block_id));
    let quiz_id = script_str(&format!("quiz-{block_id}"));
    let feedback_id = script_str(&format!("feedback-{block_id}"));

    let options: String = quiz
        .options
        .iter()
        .enumerate()
        .map(|(i, o)| {
            format!(
                "<label class=\"quiz-option\" data-correct=\"{}\"><input type=\"radio\" name=\"quiz-{id}\" value=\"{i}\"> <strong>{}.</strong> {}</label>\n",
                o.correct,
                option_letter(i),
                escape_html(&o.text)
            )
        })
        .collect();

    format!(
        r#"<div class="quiz-container" id="quiz-{id}" data-correct="{correct}">
<div class="quiz-question">{question}</div>
<div class="quiz-options">
{options}</div>
<button class="quiz-check-btn" type="button" onclick="{fn_name}()">Check Answer</button>
<div class="quiz-feedback" id="feedback-{id}"></div>
</div>
<script>
function {fn_name}() {{
  var root = document.getElementById({quiz_id});
  var picked = root.querySelector('input[type=radio]:checked');
  var feedback = document.getElementById({feedback_id});
  if (!picked) {{ feedback.textContent = 'Please select an answer.'; return; }}
  var ok = picked.closest('.quiz-option').dataset.correct === 'true';
  feedback.textContent = ok ? 'Correct!' : 'Not quite. Try again.';
  feedback.className = 'quiz-feedback ' + (ok ? 'correct' : 'incorrect');
}}
</script>"#,
        correct = quiz.correct_index(),
        question = escape_html(&quiz.question),
    )
}
