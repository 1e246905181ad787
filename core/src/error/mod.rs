mod codes;
mod dispatch;
mod runner;
mod task;

pub use codes::ErrorCode;
pub use dispatch::DispatchError;
pub use runner::RunnerError;
pub use task::TaskError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("task input error: {0}")]
    Task(#[from] TaskError),
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("runner failed: {0}")]
    Runner(#[from] RunnerError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Task(e) => e.error_code(),
            Self::Dispatch(e) => e.error_code(),
            Self::Runner(e) => e.error_code(),
            Self::Command(_) => ErrorCode::GeneralError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::GeneralError,
            Self::Anyhow(_) => ErrorCode::GeneralError,
        }
    }
}
