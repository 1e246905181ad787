//! Flat facade over the core modules for downstream crates.

pub use crate::backend::{
    resolve_executable, Backend, ComposeOpts, Dialect, Invocation, ResumeStyle,
};
pub use crate::config::{
    apply_env_overrides, data_dir, load_default, AppConfig, DispatchConfig, LoggingConfig,
    RunnerConfig, DEFAULT_TIMEOUT_SECS,
};
pub use crate::dispatch::{Dispatcher, WaveEngine};
pub use crate::env_overlay::{merge_env, parse_overlay};
pub use crate::error::{CliError, DispatchError, ErrorCode, RunnerError, TaskError};
pub use crate::graph::{TaskGraph, TaskLike};
pub use crate::interpret::{
    extract_coverage, extract_key_output, extract_message_summary, extract_session_id,
    fallback_session_id, SUMMARY_MAX_CHARS,
};
pub use crate::logs::LogManager;
pub use crate::report::{RunReport, TaskResult, TaskStatus};
pub use crate::runner::{run_session, ProcessSession, RunRequest, RunnerSession, Termination};
pub use crate::task::{parse_tasks, TaskSpec};
