/// Process exit codes reported by the dispatcher.
///
/// Structural failures (parse, graph validation) map to distinct codes so
/// callers can tell "your input is broken" from "a task failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    Success = 0,
    GeneralError = 1,
    ParseError = 2,
    ValidationError = 3,
    ConfigError = 4,
    DependencyError = 11,
    CircularDependency = 12,
    BackendError = 20,
    Timeout = 30,
    Cancelled = 31,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn as_i32(self) -> i32 {
        self as u16 as i32
    }
}
