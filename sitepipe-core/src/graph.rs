//! Task graph with dependency-ordered concurrent execution.
//!
//! Pipelines are declared as an explicit directed graph: nodes are tasks,
//! an edge `a -> b` means `b` must not start before `a` has finished.
//! Execution is edge-driven: a task starts the moment its last
//! prerequisite finishes, so independent tasks overlap and nothing waits
//! on work it does not depend on.
//!
//! Tasks run as futures on the current runtime, they are not spawned onto
//! worker threads. A task that fails aborts the run: in-flight peers are
//! dropped and nothing downstream starts.

use anyhow::Context;
use futures::stream::{FuturesUnordered, StreamExt};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors detected while validating a task graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("task graph contains a cycle through '{0}'")]
    Cycle(String),
}

/// Timing record for one completed task.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub name: String,
    pub duration: Duration,
}

/// Outcome of a full graph run: which tasks completed and how long
/// the whole pipeline took wall-clock.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub tasks: Vec<TaskReport>,
    pub total: Duration,
}

/// A directed acyclic graph of tasks.
///
/// `T` is the task identifier, typically a small enum. Adding the same
/// task twice is a no-op, and dependencies may reference tasks that have
/// not been added yet (they are inserted on demand).
pub struct TaskGraph<T> {
    graph: DiGraph<T, ()>,
    nodes: HashMap<T, NodeIndex>,
}

impl<T> TaskGraph<T>
where
    T: Copy + Eq + Hash + Display,
{
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            nodes: HashMap::new(),
        }
    }

    /// Add a task with no dependencies. Idempotent.
    pub fn add_task(&mut self, task: T) -> &mut Self {
        self.index_of(task);
        self
    }

    /// Declare that `after` must wait for `before`.
    ///
    /// Both tasks are added to the graph if missing.
    pub fn add_dependency(&mut self, before: T, after: T) -> &mut Self {
        let a = self.index_of(before);
        let b = self.index_of(after);
        self.graph.update_edge(a, b, ());
        self
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    fn index_of(&mut self, task: T) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&task) {
            return idx;
        }
        let idx = self.graph.add_node(task);
        self.nodes.insert(task, idx);
        idx
    }

    /// Check that the graph is acyclic.
    pub fn validate(&self) -> Result<(), GraphError> {
        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(GraphError::Cycle(
                self.graph[cycle.node_id()].to_string(),
            )),
        }
    }

    /// Run all tasks in dependency order.
    ///
    /// `runner` is called once per task. Each task is dispatched the
    /// moment all of its prerequisites have completed, concurrently with
    /// whatever else is in flight. The first task error aborts the run;
    /// tasks that were not yet started never run. Completed tasks are
    /// reported in completion order.
    pub async fn run<F, Fut>(&self, runner: F) -> anyhow::Result<PipelineReport>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        self.validate()?;

        let started = Instant::now();
        let mut report = PipelineReport::default();

        let mut indegree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                let count = self
                    .graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count();
                (idx, count)
            })
            .collect();

        let launch = |idx: NodeIndex| {
            let task = self.graph[idx];
            let fut = runner(task);
            async move {
                let task_started = Instant::now();
                fut.await.with_context(|| format!("task {task} failed"))?;
                Ok::<_, anyhow::Error>((idx, task, task_started.elapsed()))
            }
        };

        // node_indices() yields in insertion order, which keeps the
        // initial dispatch deterministic for a given graph construction.
        let mut running: FuturesUnordered<_> = self
            .graph
            .node_indices()
            .filter(|idx| indegree[idx] == 0)
            .map(&launch)
            .collect();

        while let Some(completed) = running.next().await {
            let (idx, task, duration) = completed?;
            report.tasks.push(TaskReport {
                name: task.to_string(),
                duration,
            });

            for dependent in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(remaining) = indegree.get_mut(&dependent) {
                    *remaining -= 1;
                    if *remaining == 0 {
                        running.push(launch(dependent));
                    }
                }
            }
        }

        report.total = started.elapsed();
        Ok(report)
    }
}

impl<T> Default for TaskGraph<T>
where
    T: Copy + Eq + Hash + Display,
{
    fn default() -> Self {
        Self::new()
    }
}
