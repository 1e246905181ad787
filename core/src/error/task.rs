use thiserror::Error;

use super::codes::ErrorCode;

/// Task-descriptor parse failures. All of these abort the run before any
/// subprocess is launched; `record` is the 1-based position of the
/// offending task block in the input.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("no task blocks found in input")]
    NoTasks,

    #[error("task {record}: missing ---CONTENT--- marker")]
    MissingContentMarker { record: usize },

    #[error("task {record}: missing ---END--- marker")]
    MissingEndMarker { record: usize },

    #[error("task {record}: metadata line is invalid: {line}")]
    InvalidMetadataLine { record: usize, line: String },

    #[error("task {record}: id is empty")]
    EmptyId { record: usize },

    #[error("task {record}: invalid task id: {id}")]
    InvalidId { record: usize, id: String },

    #[error("task {record}: duplicate task id: {id}")]
    DuplicateId { record: usize, id: String },

    #[error("task {record}: unknown backend: {value}")]
    UnknownBackend { record: usize, value: String },

    #[error("task {record}: invalid number for {field}: {value}")]
    InvalidNumber {
        record: usize,
        field: &'static str,
        value: String,
    },
}

impl TaskError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NoTasks
            | Self::MissingContentMarker { .. }
            | Self::MissingEndMarker { .. }
            | Self::InvalidMetadataLine { .. } => ErrorCode::ParseError,
            Self::EmptyId { .. }
            | Self::InvalidId { .. }
            | Self::DuplicateId { .. }
            | Self::UnknownBackend { .. }
            | Self::InvalidNumber { .. } => ErrorCode::ValidationError,
        }
    }
}
