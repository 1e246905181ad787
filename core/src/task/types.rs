use crate::backend::Backend;

/// One unit of work: a prompt bound to a backend, a working directory and
/// zero or more dependencies on other tasks.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub id: String,
    pub backend: Backend,
    pub workdir: String,
    pub dependencies: Vec<String>,
    /// Per-task timeout override in seconds.
    pub timeout: Option<u64>,
    pub content: String,
}

impl TaskSpec {
    pub fn new(id: impl Into<String>, backend: Backend, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            backend,
            workdir: ".".to_string(),
            dependencies: Vec::new(),
            timeout: None,
            content: content.into(),
        }
    }
}
