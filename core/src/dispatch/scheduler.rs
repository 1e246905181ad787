use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Semaphore;

use crate::error::DispatchError;
use crate::graph::TaskGraph;
use crate::report::TaskResult;
use crate::task::TaskSpec;

/// Execute one wave of ready tasks concurrently, bounded by
/// `max_parallel` (0 = effectively unbounded).
///
/// Each task runs as an independently-failing unit; failures come back as
/// `TaskResult`s, never as errors, so one bad task cannot sink its wave.
pub async fn execute_wave<F, Fut>(
    task_ids: &[String],
    graph: &TaskGraph<TaskSpec>,
    max_parallel: usize,
    executor_fn: F,
) -> Result<HashMap<String, TaskResult>, DispatchError>
where
    F: Fn(TaskSpec) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = TaskResult> + Send,
{
    let permits = if max_parallel == 0 {
        Semaphore::MAX_PERMITS
    } else {
        max_parallel
    };
    let sem = Arc::new(Semaphore::new(permits));
    let mut futs: FuturesUnordered<_> = FuturesUnordered::new();

    for id in task_ids {
        let Some(task) = graph.nodes.get(id) else {
            continue;
        };

        let task = task.clone();
        let sem = sem.clone();
        let executor = executor_fn.clone();

        futs.push(async move {
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(|_| DispatchError::Internal("semaphore closed unexpectedly".into()))?;

            Ok::<TaskResult, DispatchError>(executor(task).await)
        });
    }

    let mut results: HashMap<String, TaskResult> = HashMap::new();

    while let Some(res) = futs.next().await {
        let task_result = res?;
        results.insert(task_result.id.clone(), task_result);
    }

    Ok(results)
}
