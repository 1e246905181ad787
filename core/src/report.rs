//! Run results: per-task outcomes, the session registry, and rendering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Terminal state of one task. Every declared task ends in exactly one of
/// these, even when the run partially aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Passed,
    Failed,
    Skipped,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Outcome of one task execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: String,
    pub status: TaskStatus,

    /// Self-reported test coverage percentage, when the output contained
    /// a recognizable figure. Absent, not zero, when unreported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<f64>,

    /// Files the backend reported touching, sorted and deduplicated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,

    /// Populated only when status is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Full captured transcript on disk. Absent for tasks that never
    /// launched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub duration_ms: u64,
}

impl TaskResult {
    pub fn skipped(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::Skipped,
            coverage: None,
            files: Vec::new(),
            error: None,
            log_path: None,
            session_id: None,
            summary: String::new(),
            duration_ms: 0,
        }
    }
}

/// Everything one invocation produced, in task declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,

    /// RFC 3339 timestamp of run start.
    #[serde(default)]
    pub started_at: String,

    pub results: Vec<TaskResult>,

    /// Task id -> backend session id, for resume operations.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sessions: BTreeMap<String, String>,
}

impl RunReport {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: chrono::Utc::now().to_rfc3339(),
            results: Vec::new(),
            sessions: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, result: TaskResult) {
        if let Some(session) = result.session_id.as_deref() {
            self.sessions
                .insert(result.id.clone(), session.to_string());
        }
        self.results.push(result);
    }

    pub fn all_passed(&self) -> bool {
        self.results
            .iter()
            .all(|r| r.status == TaskStatus::Passed)
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == TaskStatus::Failed)
            .count()
    }

    /// Overlay a resumed task's fresh result over its previous entry.
    /// Declaration position is preserved; status, coverage, files, error
    /// and session data are replaced.
    pub fn merge_resumed(&mut self, new: TaskResult) {
        if let Some(session) = new.session_id.as_deref() {
            self.sessions.insert(new.id.clone(), session.to_string());
        }
        match self.results.iter_mut().find(|r| r.id == new.id) {
            Some(slot) => *slot = new,
            None => self.results.push(new),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Compact table for human review: id, status, coverage, log path.
    /// Full error detail is appended only for failed tasks.
    pub fn render_table(&self) -> String {
        let id_width = self
            .results
            .iter()
            .map(|r| r.id.len())
            .chain(std::iter::once("TASK".len()))
            .max()
            .unwrap_or(4);

        let mut out = String::new();
        out.push_str(&format!(
            "{:<id_width$}  {:<7}  {:>8}  LOG\n",
            "TASK", "STATUS", "COVER"
        ));

        for r in &self.results {
            let coverage = r
                .coverage
                .map(|c| format!("{c:.1}%"))
                .unwrap_or_else(|| "-".to_string());
            let log = r.log_path.as_deref().unwrap_or("-");
            out.push_str(&format!(
                "{:<id_width$}  {:<7}  {:>8}  {}\n",
                r.id, r.status, coverage, log
            ));
        }

        let failed: Vec<&TaskResult> = self
            .results
            .iter()
            .filter(|r| r.status == TaskStatus::Failed)
            .collect();
        if !failed.is_empty() {
            out.push('\n');
            for r in failed {
                out.push_str(&format!("{} failed", r.id));
                if let Some(err) = r.error.as_deref() {
                    out.push_str(&format!(": {err}"));
                }
                out.push('\n');
                if !r.summary.is_empty() {
                    out.push_str(&format!("  last output: {}\n", r.summary));
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> RunReport {
        let mut report = RunReport::new("run-42");
        report.push(TaskResult {
            id: "build".into(),
            status: TaskStatus::Passed,
            coverage: Some(91.5),
            files: vec!["src/lib.rs".into(), "tests/api.rs".into()],
            error: None,
            log_path: Some("/tmp/agentmux/run-42/build.log".into()),
            session_id: Some("sess-build".into()),
            summary: "Implemented the endpoint".into(),
            duration_ms: 1234,
        });
        report.push(TaskResult {
            id: "verify".into(),
            status: TaskStatus::Failed,
            coverage: None,
            files: vec![],
            error: Some("exit code 2".into()),
            log_path: Some("/tmp/agentmux/run-42/verify.log".into()),
            session_id: None,
            summary: "tests failed to compile".into(),
            duration_ms: 80,
        });
        report.push(TaskResult::skipped("deploy"));
        report
    }

    #[test]
    fn json_round_trip_preserves_result_tuples() {
        let report = sample();
        let json = report.to_json().unwrap();
        let parsed = RunReport::from_json(&json).unwrap();

        let tuples = |r: &RunReport| -> Vec<_> {
            r.results
                .iter()
                .map(|t| {
                    (
                        t.id.clone(),
                        t.status,
                        t.coverage,
                        t.files.clone(),
                        t.error.clone(),
                    )
                })
                .collect()
        };
        assert_eq!(tuples(&report), tuples(&parsed));
        assert_eq!(report.sessions, parsed.sessions);
    }

    #[test]
    fn session_registry_tracks_reported_sessions() {
        let report = sample();
        assert_eq!(
            report.sessions.get("build").map(String::as_str),
            Some("sess-build")
        );
        assert!(!report.sessions.contains_key("verify"));
    }

    #[test]
    fn table_lists_every_task_once_with_failure_detail() {
        let report = sample();
        let table = report.render_table();
        assert!(table.contains("build"));
        assert!(table.contains("skipped"));
        assert!(table.contains("verify failed: exit code 2"));
        assert!(table.contains("91.5%"));
        assert!(!table.contains("deploy failed"));
    }

    #[test]
    fn merge_resumed_overlays_in_place() {
        let mut report = sample();
        report.merge_resumed(TaskResult {
            id: "verify".into(),
            status: TaskStatus::Passed,
            coverage: Some(95.0),
            files: vec!["tests/api.rs".into()],
            error: None,
            log_path: Some("/tmp/agentmux/run-42/verify.retry.log".into()),
            session_id: Some("sess-verify-2".into()),
            summary: "all green".into(),
            duration_ms: 50,
        });

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results[1].id, "verify");
        assert_eq!(report.results[1].status, TaskStatus::Passed);
        assert_eq!(report.results[1].coverage, Some(95.0));
        assert_eq!(
            report.sessions.get("verify").map(String::as_str),
            Some("sess-verify-2")
        );
        // deploy is still skipped, so the run as a whole has not passed
        assert!(!report.all_passed());
    }
}
