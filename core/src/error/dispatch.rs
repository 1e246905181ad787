use thiserror::Error;

use super::codes::ErrorCode;
use super::task::TaskError;

/// Graph validation and scheduling errors. The first two are structural:
/// they fail the whole run before any task is launched.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("unknown dependency '{dep}' on task '{task}'")]
    UnknownDependency { task: String, dep: String },

    #[error("circular dependency detected: {0}")]
    CyclicDependency(String),

    #[error("duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("scheduler internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnknownDependency { .. } => ErrorCode::DependencyError,
            Self::CyclicDependency(_) => ErrorCode::CircularDependency,
            Self::DuplicateTaskId(_) => ErrorCode::ValidationError,
            Self::Task(e) => e.error_code(),
            Self::Internal(_) => ErrorCode::GeneralError,
        }
    }
}
