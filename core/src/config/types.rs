use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "agentmux_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum tasks launched concurrently within a wave. 0 means
    /// effectively unbounded; tasks are I/O-bound subprocesses, so the
    /// useful bound is external process cost, not CPU.
    #[serde(default)]
    pub max_parallel: usize,

    /// Backend used when a task block omits the `backend` field.
    #[serde(default = "default_backend")]
    pub default_backend: String,
}

fn default_backend() -> String {
    "codex".to_string()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_parallel: 0,
            default_backend: default_backend(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Default per-task timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retain per-task transcript logs after the run completes.
    #[serde(default)]
    pub keep_logs: bool,

    /// Root directory for transcript logs. Unset means `$TMPDIR/agentmux`.
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Pass the claude CLI its permission-bypass flag. Off by default:
    /// elevation must be an explicit opt-in.
    #[serde(default)]
    pub claude_skip_permissions: bool,

    /// Bytes of stdout/stderr tail retained in memory per task.
    #[serde(default = "default_capture_bytes")]
    pub capture_bytes: usize,
}

pub const DEFAULT_TIMEOUT_SECS: u64 = 2 * 60 * 60;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_capture_bytes() -> usize {
    64 * 1024
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            keep_logs: false,
            log_dir: None,
            claude_skip_permissions: false,
            capture_bytes: default_capture_bytes(),
        }
    }
}
