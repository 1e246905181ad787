//! Per-line projection of stream-json backend output.
//!
//! Each backend CLI emits its own newline-delimited JSON dialect. These
//! helpers map the known shapes onto two things the dispatcher cares
//! about: assistant-visible text (for summaries) and touched file paths.
//! Unknown lines are ignored; plain text passes through untouched at the
//! call site. Best-effort by design.

use serde_json::Value;

/// Assistant text carried by one stream-json line, if any.
///
/// Known shapes:
/// - claude: {"type":"assistant","message":{"content":[{"type":"text","text":"..."}]}}
/// - codex:  {"type":"item.completed","item":{"type":"agent_message","text":"..."}}
/// - gemini: {"type":"message","role":"assistant","content":"..."}
pub fn assistant_text_in_line(line: &str) -> Option<String> {
    let v = parse_json_line(line)?;
    let line_type = v.get("type").and_then(|x| x.as_str()).unwrap_or("");

    match line_type {
        "assistant" => {
            let items = v
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(|c| c.as_array())?;
            for item in items {
                let ty = item.get("type").and_then(|x| x.as_str()).unwrap_or("");
                if ty != "text" && ty != "output_text" {
                    continue;
                }
                if let Some(t) = item.get("text").and_then(|x| x.as_str()) {
                    if !t.is_empty() {
                        return Some(t.to_string());
                    }
                }
            }
            None
        }
        "item.completed" => {
            let item = v.get("item")?;
            if item.get("type").and_then(|x| x.as_str()) != Some("agent_message") {
                return None;
            }
            item.get("text")
                .and_then(|x| x.as_str())
                .filter(|t| !t.is_empty())
                .map(|t| t.to_string())
        }
        "message" => {
            if v.get("role").and_then(|x| x.as_str()) != Some("assistant") {
                return None;
            }
            v.get("content")
                .and_then(|x| x.as_str())
                .filter(|t| !t.is_empty())
                .map(|t| t.to_string())
        }
        _ => None,
    }
}

/// File paths a stream-json line reports as touched.
///
/// Collects `file_path` values from tool-use records (the claude editing
/// tools all carry one) and `path` values inside `changes` arrays (codex
/// file-change items). Anything else would be guesswork.
pub fn touched_files_in_line(line: &str) -> Vec<String> {
    let Some(v) = parse_json_line(line) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    collect_paths(&v, &mut out);
    out
}

fn collect_paths(v: &Value, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            if let Some(Value::String(p)) = map.get("file_path") {
                if !p.trim().is_empty() {
                    out.push(p.clone());
                }
            }
            if let Some(Value::Array(changes)) = map.get("changes") {
                for change in changes {
                    if let Some(p) = change.get("path").and_then(|x| x.as_str()) {
                        if !p.trim().is_empty() {
                            out.push(p.to_string());
                        }
                    }
                }
            }
            for value in map.values() {
                collect_paths(value, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_paths(item, out);
            }
        }
        _ => {}
    }
}

fn parse_json_line(line: &str) -> Option<Value> {
    let s = line.trim();
    if !(s.starts_with('{') && s.ends_with('}')) {
        return None;
    }
    serde_json::from_str(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claude_assistant_text() {
        let line = r#"{"type":"assistant","message":{"content":[{"type":"text","text":"All tests pass."}]}}"#;
        assert_eq!(
            assistant_text_in_line(line).as_deref(),
            Some("All tests pass.")
        );
    }

    #[test]
    fn codex_agent_message_text() {
        let line = r#"{"type":"item.completed","item":{"id":"item_3","type":"agent_message","text":"Added the middleware."}}"#;
        assert_eq!(
            assistant_text_in_line(line).as_deref(),
            Some("Added the middleware.")
        );
    }

    #[test]
    fn gemini_assistant_message_text() {
        let line = r#"{"type":"message","role":"assistant","content":"Refactor complete."}"#;
        assert_eq!(
            assistant_text_in_line(line).as_deref(),
            Some("Refactor complete.")
        );
    }

    #[test]
    fn non_assistant_lines_yield_nothing() {
        assert!(assistant_text_in_line(r#"{"type":"message","role":"user","content":"hi"}"#).is_none());
        assert!(assistant_text_in_line("plain text line").is_none());
        assert!(assistant_text_in_line(r#"{"type":"init","session_id":"x"}"#).is_none());
    }

    #[test]
    fn claude_tool_use_file_path() {
        let line = r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"t1","name":"Edit","input":{"file_path":"src/auth.rs","old_string":"a","new_string":"b"}}]}}"#;
        assert_eq!(touched_files_in_line(line), vec!["src/auth.rs"]);
    }

    #[test]
    fn codex_file_change_paths() {
        let line = r#"{"type":"item.completed","item":{"type":"file_change","status":"completed","changes":[{"path":"src/lib.rs","kind":"update"},{"path":"tests/api.rs","kind":"add"}]}}"#;
        assert_eq!(
            touched_files_in_line(line),
            vec!["src/lib.rs", "tests/api.rs"]
        );
    }

    #[test]
    fn plain_lines_touch_nothing() {
        assert!(touched_files_in_line("modified src/main.rs").is_empty());
    }
}
