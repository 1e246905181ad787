//! Coverage percentage extraction.
//!
//! Inherently heuristic: backends self-report coverage in free text, and
//! when several percentages appear there is no designed way to know which
//! one is "the" coverage figure. The rule here: a percentage on a
//! coverage-labeled line wins; otherwise the first plausible percentage in
//! the text is taken; no match means unset, never zero.

use std::sync::OnceLock;

use regex::Regex;

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,3}(?:\.\d+)?)\s*%").unwrap())
}

pub fn extract_coverage(text: &str) -> Option<f64> {
    // Pass 1: percentages adjacent to a coverage-labeled context.
    for line in text.lines() {
        if !line.to_ascii_lowercase().contains("coverage") {
            continue;
        }
        if let Some(v) = first_percent(line) {
            return Some(v);
        }
    }

    // Pass 2: any percentage at all.
    first_percent(text)
}

fn first_percent(text: &str) -> Option<f64> {
    for caps in percent_re().captures_iter(text) {
        if let Ok(v) = caps[1].parse::<f64>() {
            if (0.0..=100.0).contains(&v) {
                return Some(v);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_context_wins_over_earlier_percentages() {
        let text = "Progress: 50%\nTotal coverage: 87.5%\nDone.";
        assert_eq!(extract_coverage(text), Some(87.5));
    }

    #[test]
    fn label_after_number_still_matches() {
        let text = "tests passed\n92% statement coverage achieved\n";
        assert_eq!(extract_coverage(text), Some(92.0));
    }

    #[test]
    fn bare_percentage_used_when_unlabeled() {
        assert_eq!(extract_coverage("finished at 73%"), Some(73.0));
    }

    #[test]
    fn absent_match_is_unset_not_zero() {
        assert_eq!(extract_coverage("all tests green"), None);
        assert_eq!(extract_coverage(""), None);
    }

    #[test]
    fn out_of_range_values_are_ignored() {
        assert_eq!(extract_coverage("weird 250% spike"), None);
        assert_eq!(extract_coverage("250% spike, coverage 81%"), Some(81.0));
    }

    #[test]
    fn go_style_report_line() {
        let text = "ok \texample.com/pkg\t0.31s\tcoverage: 85.2% of statements";
        assert_eq!(extract_coverage(text), Some(85.2));
    }
}
