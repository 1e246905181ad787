//! Heuristic summary extraction over free-form backend output.
//!
//! Backend output format is not a contract this dispatcher controls, so
//! these are deliberately isolated pure functions with no side effects.

const MIN_MEANINGFUL_LEN: usize = 20;

/// First non-noise line of a message, truncated to `max` characters.
///
/// Noise lines are blank lines, code-fence markers and horizontal rules /
/// pure punctuation. If every line is noise, the trimmed raw content is
/// returned instead: a non-empty input never produces an empty summary.
pub fn extract_message_summary(text: &str, max: usize) -> String {
    for line in text.lines() {
        let trimmed = line.trim();
        if is_noise_line(trimmed) {
            continue;
        }
        return truncate_chars(trimmed, max);
    }

    truncate_chars(text.trim(), max)
}

/// The line most worth showing in a result table.
///
/// A `Summary:` marker line (case-insensitive) wins and its remainder is
/// returned. Otherwise the first line longer than 20 characters that is
/// not a markdown heading. Cut lines get a `...` marker. Falls back to
/// [`extract_message_summary`] when nothing qualifies.
pub fn extract_key_output(text: &str, max: usize) -> String {
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(rest) = strip_summary_marker(trimmed) {
            return truncate_with_ellipsis(rest.trim(), max);
        }
    }

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.chars().count() > MIN_MEANINGFUL_LEN && !trimmed.starts_with('#') {
            return truncate_with_ellipsis(trimmed, max);
        }
    }

    extract_message_summary(text, max)
}

fn strip_summary_marker(line: &str) -> Option<&str> {
    if line.len() < 8 || !line.is_char_boundary(8) {
        return None;
    }
    let (head, rest) = line.split_at(8);
    if head.eq_ignore_ascii_case("summary:") {
        Some(rest)
    } else {
        None
    }
}

fn is_noise_line(trimmed: &str) -> bool {
    if trimmed.is_empty() {
        return true;
    }
    // Fences, rules, separators: nothing alphanumeric on the line.
    !trimmed.chars().any(|c| c.is_alphanumeric())
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}

fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn summary_skips_noise_lines() {
        let msg = "\n```\n---\n   \nFirst meaningful line\nSecond line\n";
        assert_eq!(extract_message_summary(msg, 200), "First meaningful line");
    }

    #[test]
    fn summary_falls_back_to_raw_noise() {
        let noise_only = "\n```\n---\n";
        assert_eq!(extract_message_summary(noise_only, 200), "```\n---");
    }

    #[test]
    fn summary_of_empty_input_is_empty() {
        assert_eq!(extract_message_summary("", 200), "");
        assert_eq!(extract_message_summary("   \n", 200), "");
    }

    #[test]
    fn summary_truncates_to_max() {
        let msg = "abcdefghij";
        assert_eq!(extract_message_summary(msg, 4), "abcd");
    }

    #[test]
    fn key_output_prefers_summary_marker() {
        let with_summary = "Summary: Added JWT middleware and tests\nother line";
        assert_eq!(
            extract_key_output(with_summary, 200),
            "Added JWT middleware and tests"
        );
    }

    #[test]
    fn key_output_marker_is_case_insensitive() {
        let msg = "noise\nSUMMARY: did the thing\n";
        assert_eq!(extract_key_output(msg, 200), "did the thing");
    }

    #[test]
    fn key_output_falls_back_to_meaningful_line() {
        let msg = "# Header\nshort\nThis is a meaningful line with more than twenty characters.\n";
        assert_eq!(
            extract_key_output(msg, 200),
            "This is a meaningful line with more than twenty characters."
        );
    }

    #[test]
    fn key_output_marks_truncation() {
        let msg = "Summary: this remainder is fairly long and will be cut";
        let out = extract_key_output(msg, 20);
        assert!(out.ends_with("..."), "got: {out}");
        assert_eq!(out.chars().count(), 20);
    }

    #[test]
    fn key_output_degrades_to_summary() {
        let msg = "short\nlines\nonly";
        assert_eq!(extract_key_output(msg, 200), "short");
    }
}
