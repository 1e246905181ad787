//! Production wiring: compose a backend invocation per task, supervise the
//! child, and interpret its transcript into a `TaskResult`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::backend::{resolve_executable, Backend, ComposeOpts};
use crate::config::AppConfig;
use crate::env_overlay::merge_env;
use crate::error::DispatchError;
use crate::interpret::{
    extract_coverage, extract_key_output, fallback_session_id, SUMMARY_MAX_CHARS,
};
use crate::logs::LogManager;
use crate::report::{RunReport, TaskResult, TaskStatus};
use crate::runner::{run_session, ProcessSession, RunRequest, Termination};
use crate::task::TaskSpec;

use super::engine::WaveEngine;

struct ExecContext {
    timeout_secs: u64,
    capture_bytes: usize,
    claude_skip_permissions: bool,
    env: Vec<(String, String)>,
    logs: LogManager,
    cancel: watch::Receiver<bool>,
    launched_any: AtomicBool,
}

pub struct Dispatcher {
    cfg: AppConfig,
    overlay: BTreeMap<String, String>,
    run_id: String,
    logs: LogManager,
    cancel: watch::Receiver<bool>,
}

impl Dispatcher {
    pub fn new(
        cfg: AppConfig,
        overlay: BTreeMap<String, String>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self::with_run_id(cfg, uuid::Uuid::new_v4().to_string(), overlay, cancel)
    }

    pub fn with_run_id(
        cfg: AppConfig,
        run_id: impl Into<String>,
        overlay: BTreeMap<String, String>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        let run_id = run_id.into();
        let logs = LogManager::new(
            cfg.runner.log_dir.as_deref(),
            &run_id,
            cfg.runner.keep_logs,
        );
        Self {
            cfg,
            overlay,
            run_id,
            logs,
            cancel,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn logs(&self) -> &LogManager {
        &self.logs
    }

    /// Dispatch a full task set: validate the graph, run waves until every
    /// task is terminal, and report in declaration order.
    pub async fn run_tasks(&self, tasks: Vec<TaskSpec>) -> Result<RunReport, DispatchError> {
        self.logs
            .prepare()
            .map_err(|e| DispatchError::Internal(format!("create log dir: {e}")))?;

        let ctx = self.exec_context();
        let engine = WaveEngine::new(self.cfg.dispatch.max_parallel, self.cancel.clone());

        engine
            .execute(&self.run_id, tasks, move |task| {
                let ctx = ctx.clone();
                async move { execute_task(&ctx, task, None).await }
            })
            .await
    }

    /// Resume entry point: re-invoke one backend against a prior session
    /// with a follow-up instruction. One resume call per invocation; how
    /// many times to retry is the caller's policy, not ours.
    pub async fn resume(
        &self,
        task_id: &str,
        backend: Backend,
        session_id: &str,
        instruction: &str,
    ) -> Result<TaskResult, DispatchError> {
        self.logs
            .prepare()
            .map_err(|e| DispatchError::Internal(format!("create log dir: {e}")))?;

        let ctx = self.exec_context();
        let task = TaskSpec::new(task_id, backend, instruction);
        Ok(execute_task(&ctx, task, Some(session_id.to_string())).await)
    }

    fn exec_context(&self) -> Arc<ExecContext> {
        Arc::new(ExecContext {
            timeout_secs: self.cfg.runner.timeout_secs,
            capture_bytes: self.cfg.runner.capture_bytes,
            claude_skip_permissions: self.cfg.runner.claude_skip_permissions,
            env: merge_env(std::env::vars(), &self.overlay),
            logs: self.logs.clone(),
            cancel: self.cancel.clone(),
            launched_any: AtomicBool::new(false),
        })
    }
}

async fn execute_task(
    ctx: &ExecContext,
    task: TaskSpec,
    resume_session: Option<String>,
) -> TaskResult {
    let dialect = task.backend.dialect();
    let compose_opts = ComposeOpts {
        claude_skip_permissions: ctx.claude_skip_permissions,
        resume_session,
    };
    let mut invocation = dialect.compose(&task.content, &task.workdir, &compose_opts);
    invocation.env = ctx.env.clone();

    invocation.program = match resolve_executable(&invocation.program) {
        Ok(p) => p,
        Err(e) => {
            report_unavailable(ctx, &task, &e.to_string());
            return failed_early(&task.id, None, e.to_string());
        }
    };

    let log_path = ctx.logs.task_log_path(&task.id);
    let timeout_secs = task.timeout.unwrap_or(ctx.timeout_secs).max(1);

    let session = match ProcessSession::spawn(&invocation) {
        Ok(s) => s,
        Err(e) => {
            report_unavailable(ctx, &task, &e.to_string());
            return failed_early(&task.id, None, e.to_string());
        }
    };
    ctx.launched_any.store(true, Ordering::Relaxed);
    tracing::debug!(task = %task.id, backend = %task.backend, "backend process started");

    let outcome = run_session(
        Box::new(session),
        RunRequest {
            timeout: Duration::from_secs(timeout_secs),
            capture_bytes: ctx.capture_bytes,
            log_path: log_path.clone(),
            cancel: ctx.cancel.clone(),
        },
    )
    .await;

    let out = match outcome {
        Ok(o) => o,
        Err(e) => return failed_early(&task.id, Some(log_path), e.to_string()),
    };

    let session_id = out.session_id.clone().unwrap_or_else(fallback_session_id);
    let text = if out.text.trim().is_empty() {
        out.stdout_tail.clone()
    } else {
        out.text.clone()
    };
    let summary = extract_key_output(&text, SUMMARY_MAX_CHARS);
    let coverage_haystack = format!("{}\n{}\n{}", out.text, out.stdout_tail, out.stderr_tail);
    let coverage = extract_coverage(&coverage_haystack);

    let (status, error) = match out.termination {
        Termination::Exited if out.exit_code == 0 => (TaskStatus::Passed, None),
        Termination::Exited => {
            let detail = last_meaningful_line(&out.stderr_tail)
                .or_else(|| last_meaningful_line(&out.stdout_tail));
            let msg = match detail {
                Some(d) => format!("exit code {}: {d}", out.exit_code),
                None => format!("exit code {}", out.exit_code),
            };
            (TaskStatus::Failed, Some(msg))
        }
        Termination::TimedOut => (
            TaskStatus::Failed,
            Some(format!(
                "timeout after {}s (limit {}s)",
                out.duration.as_secs(),
                timeout_secs
            )),
        ),
        Termination::Cancelled => (
            TaskStatus::Failed,
            Some("cancelled before completion".to_string()),
        ),
    };

    if status == TaskStatus::Failed {
        tracing::warn!(task = %task.id, error = ?error, "task failed");
    } else {
        tracing::info!(task = %task.id, coverage = ?coverage, "task passed");
    }

    TaskResult {
        id: task.id,
        status,
        coverage,
        files: out.files,
        error,
        log_path: Some(log_path.display().to_string()),
        session_id: Some(session_id),
        summary,
        duration_ms: out.duration.as_millis() as u64,
    }
}

fn report_unavailable(ctx: &ExecContext, task: &TaskSpec, detail: &str) {
    if ctx.launched_any.load(Ordering::Relaxed) {
        tracing::warn!(task = %task.id, backend = %task.backend, "backend unavailable: {detail}");
    } else {
        // Nothing has launched yet: this smells like a systemic
        // misconfiguration, not a one-off.
        tracing::error!(
            task = %task.id,
            backend = %task.backend,
            "backend unavailable on the run's first launch (is it installed and on PATH?): {detail}"
        );
    }
}

fn failed_early(task_id: &str, log_path: Option<PathBuf>, error: String) -> TaskResult {
    TaskResult {
        id: task_id.to_string(),
        status: TaskStatus::Failed,
        coverage: None,
        files: Vec::new(),
        error: Some(error),
        log_path: log_path.map(|p| p.display().to_string()),
        session_id: None,
        summary: String::new(),
        duration_ms: 0,
    }
}

fn last_meaningful_line(tail: &str) -> Option<String> {
    tail.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty() && l.chars().any(|c| c.is_alphanumeric()))
        .map(|l| {
            if l.chars().count() > SUMMARY_MAX_CHARS {
                l.chars().take(SUMMARY_MAX_CHARS).collect()
            } else {
                l.to_string()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_meaningful_line_skips_noise() {
        let tail = "real diagnostic here\n---\n\n```\n";
        assert_eq!(
            last_meaningful_line(tail).as_deref(),
            Some("real diagnostic here")
        );
        assert_eq!(last_meaningful_line("\n---\n"), None);
    }
}
