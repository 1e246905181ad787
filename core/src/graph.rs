//! Task dependency graph (DAG).

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::DispatchError;

/// Common task interface for graph handling.
pub trait TaskLike: Clone + Send + Sync {
    fn id(&self) -> &str;
    fn dependencies(&self) -> &[String];
}

impl TaskLike for crate::task::TaskSpec {
    fn id(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

#[derive(Debug, Clone)]
pub struct TaskGraph<T: TaskLike> {
    /// Task nodes: task_id -> task
    pub nodes: HashMap<String, T>,

    /// Dependency edges: task_id -> its dependencies
    pub edges: HashMap<String, Vec<String>>,

    /// Reverse edges: task_id -> tasks that depend on it
    pub reverse_edges: HashMap<String, Vec<String>>,

    /// Original declaration order (for stable reporting)
    insertion_order: Vec<String>,
}

impl<T: TaskLike> TaskGraph<T> {
    pub fn from_tasks(tasks: &[T]) -> Result<Self, DispatchError> {
        let mut nodes = HashMap::new();
        let mut edges = HashMap::new();
        let mut reverse_edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut insertion_order = Vec::new();

        for task in tasks {
            if nodes.contains_key(task.id()) {
                return Err(DispatchError::DuplicateTaskId(task.id().to_string()));
            }

            let task_id = task.id().to_string();
            let dependencies = task.dependencies().to_vec();

            nodes.insert(task_id.clone(), task.clone());
            edges.insert(task_id.clone(), dependencies.clone());
            insertion_order.push(task_id.clone());

            for dep in dependencies {
                reverse_edges.entry(dep).or_default().push(task_id.clone());
            }
        }

        Ok(Self {
            nodes,
            edges,
            reverse_edges,
            insertion_order,
        })
    }

    /// Validate the dependency relationships: every referenced dependency
    /// must exist, and the graph must be acyclic. Runs before anything is
    /// launched; failure aborts the whole run.
    pub fn validate(&self) -> Result<(), DispatchError> {
        for id in &self.insertion_order {
            if let Some(dependencies) = self.edges.get(id) {
                for dep in dependencies {
                    if !self.nodes.contains_key(dep) {
                        return Err(DispatchError::UnknownDependency {
                            task: id.clone(),
                            dep: dep.clone(),
                        });
                    }
                }
            }
        }

        if let Some(cycle) = self.detect_cycle() {
            return Err(DispatchError::CyclicDependency(cycle));
        }

        Ok(())
    }

    /// Declaration order of all task ids.
    pub fn order(&self) -> &[String] {
        &self.insertion_order
    }

    /// All transitive dependents of `id`, i.e. every task whose execution
    /// would (directly or indirectly) require `id` to pass first.
    pub fn transitive_dependents(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(id);

        while let Some(current) = queue.pop_front() {
            if let Some(dependents) = self.reverse_edges.get(current) {
                for dep in dependents {
                    if seen.insert(dep) {
                        out.push(dep.clone());
                        queue.push_back(dep);
                    }
                }
            }
        }

        out
    }

    /// Detect circular dependencies using DFS. Returns one cycle path.
    fn detect_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for task_id in &self.insertion_order {
            if !visited.contains(task_id) && self.dfs_cycle(task_id, &mut visited, &mut stack) {
                return Some(stack.join(" -> "));
            }
        }

        None
    }

    fn dfs_cycle(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> bool {
        visited.insert(node.to_string());
        stack.push(node.to_string());

        if let Some(dependencies) = self.edges.get(node) {
            for dep in dependencies {
                if let Some(pos) = stack.iter().position(|x| x == dep) {
                    stack.push(dep.clone());
                    *stack = stack[pos..].to_vec();
                    return true;
                }

                if !visited.contains(dep) && self.dfs_cycle(dep, visited, stack) {
                    return true;
                }
            }
        }

        stack.pop();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct Node {
        id: String,
        deps: Vec<String>,
    }

    impl TaskLike for Node {
        fn id(&self) -> &str {
            &self.id
        }

        fn dependencies(&self) -> &[String] {
            &self.deps
        }
    }

    fn node(id: &str, deps: &[&str]) -> Node {
        Node {
            id: id.to_string(),
            deps: deps.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn validates_clean_graph() {
        let graph =
            TaskGraph::from_tasks(&[node("a", &[]), node("b", &["a"]), node("c", &["a", "b"])])
                .unwrap();
        graph.validate().unwrap();
        assert_eq!(graph.order(), &["a", "b", "c"]);
    }

    #[test]
    fn rejects_unknown_dependency() {
        let graph = TaskGraph::from_tasks(&[node("a", &["ghost"])]).unwrap();
        let err = graph.validate().unwrap_err();
        match err {
            DispatchError::UnknownDependency { task, dep } => {
                assert_eq!(task, "a");
                assert_eq!(dep, "ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_two_node_cycle() {
        let graph = TaskGraph::from_tasks(&[node("a", &["b"]), node("b", &["a"])]).unwrap();
        let err = graph.validate().unwrap_err();
        match err {
            DispatchError::CyclicDependency(path) => {
                assert!(path.contains("a") && path.contains("b"), "path: {path}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_self_cycle() {
        let graph = TaskGraph::from_tasks(&[node("a", &["a"])]).unwrap();
        assert!(matches!(
            graph.validate(),
            Err(DispatchError::CyclicDependency(_))
        ));
    }

    #[test]
    fn transitive_dependents_follow_reverse_edges() {
        let graph = TaskGraph::from_tasks(&[
            node("a", &[]),
            node("b", &["a"]),
            node("c", &["b"]),
            node("d", &[]),
        ])
        .unwrap();
        let mut deps = graph.transitive_dependents("a");
        deps.sort();
        assert_eq!(deps, vec!["b", "c"]);
        assert!(graph.transitive_dependents("d").is_empty());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = TaskGraph::from_tasks(&[node("a", &[]), node("a", &[])]).unwrap_err();
        assert!(matches!(err, DispatchError::DuplicateTaskId(_)));
    }
}
