//! Greedy wave scheduling over the task graph.
//!
//! Per-task lifecycle: pending -> ready -> running -> passed | failed,
//! with `skipped` propagated to the transitive dependents of every failed
//! task before the next wave is computed. Each round launches every task
//! whose dependencies have all passed and waits for the whole wave; later
//! waves may depend on the slowest member, so the barrier is the point.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use tokio::sync::watch;

use crate::error::DispatchError;
use crate::graph::TaskGraph;
use crate::report::{RunReport, TaskResult, TaskStatus};
use crate::task::TaskSpec;

use super::scheduler;

pub struct WaveEngine {
    max_parallel: usize,
    cancel: watch::Receiver<bool>,
}

impl WaveEngine {
    pub fn new(max_parallel: usize, cancel: watch::Receiver<bool>) -> Self {
        Self {
            max_parallel,
            cancel,
        }
    }

    /// Run every task to a terminal state and report in declaration order.
    ///
    /// Graph validation happens up front: an unknown dependency or a cycle
    /// aborts the run before a single subprocess is spawned.
    pub async fn execute<F, Fut>(
        &self,
        run_id: &str,
        tasks: Vec<TaskSpec>,
        executor_fn: F,
    ) -> Result<RunReport, DispatchError>
    where
        F: Fn(TaskSpec) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send,
    {
        let graph = TaskGraph::from_tasks(&tasks)?;
        graph.validate()?;

        let mut results: HashMap<String, TaskResult> = HashMap::new();
        let mut passed: HashSet<String> = HashSet::new();
        let mut wave_no = 0usize;

        loop {
            if *self.cancel.borrow() {
                tracing::warn!(run_id, "run cancelled; skipping remaining tasks");
                break;
            }

            let ready: Vec<String> = graph
                .order()
                .iter()
                .filter(|id| !results.contains_key(*id))
                .filter(|id| {
                    graph
                        .edges
                        .get(*id)
                        .map(|deps| deps.iter().all(|d| passed.contains(d)))
                        .unwrap_or(true)
                })
                .cloned()
                .collect();

            if ready.is_empty() {
                break;
            }

            wave_no += 1;
            tracing::info!(run_id, wave = wave_no, tasks = ?ready, "launching wave");

            let wave_results = scheduler::execute_wave(
                &ready,
                &graph,
                self.max_parallel,
                executor_fn.clone(),
            )
            .await?;

            for id in &ready {
                let Some(result) = wave_results.get(id) else {
                    // A launched task must land in exactly one terminal
                    // state, or the ready set would re-offer it forever.
                    let mut lost = TaskResult::skipped(id.clone());
                    lost.status = TaskStatus::Failed;
                    lost.error = Some("executor returned no result".to_string());
                    results.insert(id.clone(), lost);
                    continue;
                };
                let failed = result.status == TaskStatus::Failed;
                if result.status == TaskStatus::Passed {
                    passed.insert(id.clone());
                }
                results.insert(id.clone(), result.clone());

                if failed {
                    // Prune the whole subtree before the next wave is
                    // computed; none of these may launch.
                    for dependent in graph.transitive_dependents(id) {
                        results
                            .entry(dependent.clone())
                            .or_insert_with(|| TaskResult::skipped(dependent));
                    }
                }
            }
        }

        // Whatever is left never became ready: a dependency did not pass,
        // or the run was cancelled before its wave.
        let mut report = RunReport::new(run_id);
        for id in graph.order() {
            let result = results
                .remove(id)
                .unwrap_or_else(|| TaskResult::skipped(id.clone()));
            report.push(result);
        }

        Ok(report)
    }
}
