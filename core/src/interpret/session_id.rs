use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

/// Best-effort extraction of a backend session id from a JSON output line.
///
/// Known shapes:
/// - claude/gemini stream-json init: {"type":"...","session_id":"..."}
/// - codex --json: {"thread_id":"..."} on thread events
/// - some tools: {"run_id":"..."} or camelCase variants
pub fn extract_session_id(line: &str) -> Option<String> {
    let s = line.trim();
    if !(s.starts_with('{') && s.ends_with('}')) {
        return None;
    }

    let v: Value = serde_json::from_str(s).ok()?;

    for key in ["session_id", "sessionId", "thread_id", "run_id", "runId"] {
        if let Some(id) = v.get(key).and_then(|x| x.as_str()) {
            let id = id.trim();
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
    }

    None
}

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Stable fallback identifier for a task whose backend never reported a
/// session id. Monotonic within the process, so logs and retries stay
/// addressable even without backend cooperation.
pub fn fallback_session_id() -> String {
    let n = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("task-{n}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn extracts_session_id_from_init_line() {
        let line = r#"{"type":"init","timestamp":"2025-12-26T12:48:29.765Z","session_id":"dfa4182a-d2da-4dc7-9080-fa2d39bba588","model":"auto-gemini-2.5"}"#;
        assert_eq!(
            extract_session_id(line).as_deref(),
            Some("dfa4182a-d2da-4dc7-9080-fa2d39bba588")
        );
    }

    #[test]
    fn extracts_thread_id() {
        let line = r#"{"type":"thread.started","thread_id":"th_0192"}"#;
        assert_eq!(extract_session_id(line).as_deref(), Some("th_0192"));
    }

    #[test]
    fn ignores_non_json_lines() {
        assert!(extract_session_id("event: message_start").is_none());
        assert!(extract_session_id("YOLO mode is enabled.").is_none());
        assert!(extract_session_id("").is_none());
    }

    #[test]
    fn ignores_blank_ids() {
        assert!(extract_session_id(r#"{"session_id":"  "}"#).is_none());
    }

    #[test]
    fn fallback_ids_are_distinct_and_patterned() {
        let a = fallback_session_id();
        let b = fallback_session_id();
        assert!(!a.is_empty() && !b.is_empty());
        assert_ne!(a, b);
        let re = Regex::new(r"^task-\d+$").unwrap();
        assert!(re.is_match(&a), "unexpected suffix format: {a}");
        assert!(re.is_match(&b), "unexpected suffix format: {b}");
    }
}
