//! Deterministic environment merging for backend subprocesses.

use std::collections::BTreeMap;

/// Merge an overlay onto a base environment.
///
/// Overlay entries win on key collision. Keys that are empty or
/// whitespace-only are rejected rather than merged. The result is sorted
/// by key so every launch sees an identical, reproducible environment.
pub fn merge_env<I>(base: I, overlay: &BTreeMap<String, String>) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut merged: BTreeMap<String, String> = base
        .into_iter()
        .filter(|(k, _)| !k.trim().is_empty())
        .collect();

    for (k, v) in overlay {
        if k.trim().is_empty() {
            continue;
        }
        merged.insert(k.clone(), v.clone());
    }

    merged.into_iter().collect()
}

/// Parse `KEY=VALUE` strings (CLI `--env` flags) into an overlay map.
/// Entries without `=` or with a blank key are dropped.
pub fn parse_overlay(pairs: &[String]) -> BTreeMap<String, String> {
    let mut overlay = BTreeMap::new();
    for pair in pairs {
        let Some((k, v)) = pair.split_once('=') else {
            continue;
        };
        if k.trim().is_empty() {
            continue;
        }
        overlay.insert(k.to_string(), v.to_string());
    }
    overlay
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base() -> Vec<(String, String)> {
        vec![
            ("A".to_string(), "old".to_string()),
            ("B".to_string(), "keep".to_string()),
        ]
    }

    #[test]
    fn merges_overrides_and_sorts() {
        let mut overlay = BTreeMap::new();
        overlay.insert("A".to_string(), "new".to_string());
        overlay.insert("C".to_string(), "added".to_string());
        overlay.insert("   ".to_string(), "ignored".to_string());

        let merged = merge_env(base(), &overlay);

        let keys: Vec<&str> = merged.iter().map(|(k, _)| k.as_str()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted, "expected env keys sorted");

        let lookup: BTreeMap<&str, &str> = merged
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(lookup.get("A"), Some(&"new"));
        assert_eq!(lookup.get("B"), Some(&"keep"));
        assert_eq!(lookup.get("C"), Some(&"added"));
        assert!(!lookup.contains_key(""));
        assert!(!lookup.contains_key("   "));
    }

    #[test]
    fn empty_overlay_preserves_base() {
        let merged = merge_env(base(), &BTreeMap::new());
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn parses_key_value_pairs() {
        let overlay = parse_overlay(&[
            "FOO=bar".to_string(),
            "EMPTY=".to_string(),
            "novalue".to_string(),
            "=blank".to_string(),
        ]);
        assert_eq!(overlay.get("FOO").map(String::as_str), Some("bar"));
        assert_eq!(overlay.get("EMPTY").map(String::as_str), Some(""));
        assert_eq!(overlay.len(), 2);
    }
}
