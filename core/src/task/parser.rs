//! Task descriptor parser.
//!
//! Input is a sequence of records framed by fixed delimiters:
//!
//! ```text
//! ---TASK---
//! id: build
//! backend: codex
//! workdir: services/api
//! dependencies: proto, schema
//! ---CONTENT---
//! Prompt body, any number of lines.
//! ---END---
//! ```
//!
//! Parsing is pure: no side effects, all structural errors surface before
//! any subprocess is considered.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::backend::Backend;
use crate::error::TaskError;

use super::types::TaskSpec;

pub const TASK_MARKER: &str = "---TASK---";
pub const CONTENT_MARKER: &str = "---CONTENT---";
pub const END_MARKER: &str = "---END---";

/// Parse task records from input text. `default_backend` fills in records
/// that omit the `backend` field.
pub fn parse_tasks(input: &str, default_backend: Backend) -> Result<Vec<TaskSpec>, TaskError> {
    let mut lines = input.lines();
    let mut tasks: Vec<TaskSpec> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut record = 0usize;

    while let Some(line) = lines.next() {
        if line.trim() != TASK_MARKER {
            continue;
        }
        record += 1;

        let mut metadata: HashMap<String, String> = HashMap::new();
        let mut saw_content_marker = false;

        for line in lines.by_ref() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed == CONTENT_MARKER {
                saw_content_marker = true;
                break;
            }
            let Some((k, v)) = trimmed.split_once(':') else {
                return Err(TaskError::InvalidMetadataLine {
                    record,
                    line: trimmed.to_string(),
                });
            };
            metadata.insert(k.trim().to_lowercase(), v.trim().to_string());
        }

        if !saw_content_marker {
            return Err(TaskError::MissingContentMarker { record });
        }

        let mut content_lines: Vec<&str> = Vec::new();
        let mut ended = false;
        for line in lines.by_ref() {
            if line.trim() == END_MARKER {
                ended = true;
                break;
            }
            content_lines.push(line);
        }

        if !ended {
            return Err(TaskError::MissingEndMarker { record });
        }

        let id = metadata.get("id").map(String::as_str).unwrap_or("");
        if id.is_empty() {
            return Err(TaskError::EmptyId { record });
        }
        validate_id(record, id)?;
        if !seen.insert(id.to_string()) {
            return Err(TaskError::DuplicateId {
                record,
                id: id.to_string(),
            });
        }

        let backend = match metadata.get("backend").map(String::as_str) {
            None | Some("") => default_backend,
            Some(value) => Backend::parse(value).ok_or_else(|| TaskError::UnknownBackend {
                record,
                value: value.to_string(),
            })?,
        };

        let workdir = match metadata.get("workdir").map(String::as_str) {
            None | Some("") => ".".to_string(),
            Some(value) => value.to_string(),
        };

        let dependencies = metadata
            .get("dependencies")
            .map(|s| split_csv(s))
            .unwrap_or_default();

        let timeout = parse_u64(record, metadata.get("timeout").map(String::as_str), "timeout")?;

        tasks.push(TaskSpec {
            id: id.to_string(),
            backend,
            workdir,
            dependencies,
            timeout,
            content: content_lines.join("\n"),
        });
    }

    if tasks.is_empty() {
        return Err(TaskError::NoTasks);
    }

    Ok(tasks)
}

fn split_csv(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_u64(
    record: usize,
    value: Option<&str>,
    field: &'static str,
) -> Result<Option<u64>, TaskError> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| TaskError::InvalidNumber {
                record,
                field,
                value: v.to_string(),
            }),
    }
}

fn validate_id(record: usize, id: &str) -> Result<(), TaskError> {
    static ID_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = ID_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_][a-zA-Z0-9_\-\.]{0,127}$").unwrap());
    if !re.is_match(id) {
        return Err(TaskError::InvalidId {
            record,
            id: id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Result<Vec<TaskSpec>, TaskError> {
        parse_tasks(input, Backend::Codex)
    }

    #[test]
    fn single_task_preserves_multiline_content() {
        let input = "\n---TASK---\nid: t1\nbackend: codex\nworkdir: .\n---CONTENT---\nline1\nline2\n---END---\n";
        let tasks = parse(input).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].content, "line1\nline2");
        assert_eq!(tasks[0].backend, Backend::Codex);
    }

    #[test]
    fn backend_and_workdir_default_when_omitted() {
        let input = "---TASK---\nid: t1\n---CONTENT---\nhello\n---END---\n";
        let tasks = parse_tasks(input, Backend::Claude).unwrap();
        assert_eq!(tasks[0].backend, Backend::Claude);
        assert_eq!(tasks[0].workdir, ".");
        assert!(tasks[0].dependencies.is_empty());
    }

    #[test]
    fn dependencies_split_on_commas_and_trim() {
        let input =
            "---TASK---\nid: t2\ndependencies: a , b,\n---CONTENT---\nx\n---END---\n";
        let tasks = parse(input).unwrap();
        assert_eq!(tasks[0].dependencies, vec!["a", "b"]);
    }

    #[test]
    fn empty_dependencies_means_none() {
        let input = "---TASK---\nid: t3\ndependencies:\n---CONTENT---\nx\n---END---\n";
        let tasks = parse(input).unwrap();
        assert!(tasks[0].dependencies.is_empty());
    }

    #[test]
    fn missing_id_is_rejected() {
        let input = "---TASK---\nbackend: codex\n---CONTENT---\nx\n---END---\n";
        let err = parse(input).unwrap_err();
        assert!(matches!(err, TaskError::EmptyId { record: 1 }));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let input = "---TASK---\nid: t\n---CONTENT---\na\n---END---\n\
                     ---TASK---\nid: t\n---CONTENT---\nb\n---END---\n";
        let err = parse(input).unwrap_err();
        assert!(matches!(err, TaskError::DuplicateId { record: 2, .. }));
    }

    #[test]
    fn missing_content_marker_is_rejected() {
        let input = "---TASK---\nid: t\nbody without markers\n---END---\n";
        let err = parse(input).unwrap_err();
        assert!(matches!(err, TaskError::InvalidMetadataLine { .. }));

        let input = "---TASK---\nid: t\n";
        let err = parse(input).unwrap_err();
        assert!(matches!(err, TaskError::MissingContentMarker { record: 1 }));
    }

    #[test]
    fn missing_end_marker_is_rejected() {
        let input = "---TASK---\nid: t\n---CONTENT---\nno end\n";
        let err = parse(input).unwrap_err();
        assert!(matches!(err, TaskError::MissingEndMarker { record: 1 }));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let input = "---TASK---\nid: t\nbackend: cursor\n---CONTENT---\nx\n---END---\n";
        let err = parse(input).unwrap_err();
        assert!(matches!(err, TaskError::UnknownBackend { .. }));
    }

    #[test]
    fn empty_input_has_no_tasks() {
        assert!(matches!(parse("just text\n"), Err(TaskError::NoTasks)));
    }

    #[test]
    fn timeout_field_is_parsed() {
        let input = "---TASK---\nid: t\ntimeout: 30\n---CONTENT---\nx\n---END---\n";
        let tasks = parse(input).unwrap();
        assert_eq!(tasks[0].timeout, Some(30));

        let input = "---TASK---\nid: t\ntimeout: soon\n---CONTENT---\nx\n---END---\n";
        assert!(matches!(
            parse(input),
            Err(TaskError::InvalidNumber { field: "timeout", .. })
        ));
    }
}
