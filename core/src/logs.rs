//! Per-task transcript log lifecycle.
//!
//! Every task writes its full captured output to a uniquely named file
//! under `<root>/<run_id>/`. Logs are transient by default: the run
//! directory is removed when the run finishes unless retention was
//! requested. Cleanup is a resource contract, not a correctness one, so a
//! file that is already gone never fails the run.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LogManager {
    run_dir: PathBuf,
    keep: bool,
}

impl LogManager {
    pub fn new(root: Option<&str>, run_id: &str, keep: bool) -> Self {
        let root = match root.map(str::trim).filter(|s| !s.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => std::env::temp_dir().join("agentmux"),
        };
        Self {
            run_dir: root.join(run_id),
            keep,
        }
    }

    /// Directory holding this run's logs.
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn keep_logs(&self) -> bool {
        self.keep
    }

    /// Log path for one task. Ids are unique within a run, so no file is
    /// ever written by more than one task.
    pub fn task_log_path(&self, task_id: &str) -> PathBuf {
        self.run_dir.join(format!("{task_id}.log"))
    }

    pub fn prepare(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.run_dir)
    }

    /// Remove the run directory unless retention was requested. Failures
    /// are ignored: the logs may already be gone.
    pub fn cleanup(&self) {
        if self.keep {
            tracing::debug!(dir = %self.run_dir.display(), "retaining run logs");
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.run_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(dir = %self.run_dir.display(), error = %e, "log cleanup skipped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_paths_are_unique_per_task() {
        let mgr = LogManager::new(Some("/tmp/agentmux-test"), "run-1", false);
        let a = mgr.task_log_path("a");
        let b = mgr.task_log_path("b");
        assert_ne!(a, b);
        assert!(a.ends_with("run-1/a.log"));
    }

    #[test]
    fn cleanup_removes_dir_unless_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_string_lossy().to_string();

        let mgr = LogManager::new(Some(&root), "run-x", false);
        mgr.prepare().unwrap();
        std::fs::write(mgr.task_log_path("t"), "hello").unwrap();
        mgr.cleanup();
        assert!(!mgr.run_dir().exists());

        let mgr = LogManager::new(Some(&root), "run-y", true);
        mgr.prepare().unwrap();
        std::fs::write(mgr.task_log_path("t"), "hello").unwrap();
        mgr.cleanup();
        assert!(mgr.run_dir().exists());
    }

    #[test]
    fn cleanup_tolerates_missing_dir() {
        let mgr = LogManager::new(Some("/tmp/agentmux-test-nonexistent"), "gone", false);
        mgr.cleanup();
    }
}
