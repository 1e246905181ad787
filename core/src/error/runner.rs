use thiserror::Error;

use super::codes::ErrorCode;

/// Per-task runner failures. These never abort the run: the failing task
/// is reported `failed` and only its dependency subtree is pruned.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("backend executable not found: {0}")]
    BackendUnavailable(String),

    #[error("spawn failed: {0}")]
    Spawn(String),

    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        source: std::io::Error,
    },

    #[error("log file error: {0}")]
    Log(String),
}

impl RunnerError {
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::BackendError
    }
}
