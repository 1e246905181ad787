mod parser;
mod types;

pub use parser::{parse_tasks, CONTENT_MARKER, END_MARKER, TASK_MARKER};
pub use types::TaskSpec;
