//! Highlighted and executable code markup.

use super::html::{escape_html, safe_id, script_str, strip_code_fences};
use crate::error::{Error, Result};
use crate::suggest::detect_language;

/// Language for an executable snippet: the detected language, or
/// `javascript` when nothing is detected.
pub fn executable_language(code: &str) -> &'static str {
    match detect_language(code) {
        "text" => "javascript",
        lang => lang,
    }
}

/// Syntax-highlighted code with a language label and a copy button.
pub fn render_code_block(block_id: &str, text: &str, language: &str) -> Result<String> {
    let code = strip_code_fences(text);
    if code.trim().is_empty() {
        return Err(Error::malformed(block_id, "empty code"));
    }
    let id = escape_html(block_id);
    let lang = escape_html(language);

    Ok(format!(
        r#"<div class="code-block" id="code-{id}">
<div class="code-toolbar"><span class="code-lang">{lang}</span><button class="copy-btn" type="button" onclick="navigator.clipboard.writeText(this.closest('.code-block').querySelector('code').textContent)">Copy</button></div>
<pre><code class="language-{lang}">{code}</code></pre>
</div>"#,
        code = escape_html(&code),
    ))
}

/// Editable snippet with a run button; JavaScript runs in the page with
/// `console.log` captured into the output panel.
pub fn render_executable(block_id: &str, text: &str, language: &str) -> Result<String> {
    let code = strip_code_fences(text);
    if code.trim().is_empty() {
        return Err(Error::malformed(block_id, "empty code"));
    }
    let id = escape_html(block_id);
    let fn_name = format!("runCode_{}", safe_id(block_id));
    let lang = escape_html(language);
    let exec_id = script_str(&format!("exec-{block_id}"));
    let editor_id = script_str(&format!("editor-{block_id}"));
    let output_id = script_str(&format!("output-{block_id}"));

    Ok(format!(
        r#"<div class="code-executable" id="exec-{id}" data-language="{lang}">
<div class="code-toolbar"><span class="code-lang">{lang}</span><button class="run-btn" type="button" onclick="{fn_name}()">Run</button></div>
<textarea class="code-editor" id="editor-{id}" spellcheck="false">{code}</textarea>
<pre class="code-output" id="output-{id}"></pre>
</div>
<script>
function {fn_name}() {{
  var out = document.getElementById({output_id});
  if (document.getElementById({exec_id}).dataset.language !== 'javascript') {{ out.textContent = 'Only JavaScript runs in the browser.'; return; }}
  var lines = [];
  var log = console.log;
  console.log = function() {{ lines.push(Array.prototype.join.call(arguments, ' ')); log.apply(console, arguments); }};
  try {{
    var result = eval(document.getElementById({editor_id}).value);
    if (result !== undefined) lines.push(String(result));
  }} catch (e) {{
    lines.push('Error: ' + e.message);
  }} finally {{
    console.log = log;
  }}
  out.textContent = lines.join('\n');
}}
</script>"#,
        code = escape_html(&code),
    ))
}
