use crate::stream::{ResultEvent, ResultStream};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use screencore::{
    EventBus, ExecutionEvent, ExecutionId, FlowError, NodeContext, NodeError, State, StateDelta,
    Workflow, WorkflowError,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

/// What the executor does when a node function fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandling {
    /// Replace the node's output with a diagnostic entry and carry on.
    #[default]
    Substitute,
    /// As `Substitute`, but flag the event and the run as degraded.
    MarkDegraded,
    /// Yield the failure on the result stream and end the run.
    StopWorkflow,
}

/// Executes validated workflows as DAGs, running independent branches
/// concurrently.
pub struct WorkflowExecutor {
    max_parallel: Option<usize>,
    node_timeout: Option<Duration>,
    on_error: ErrorHandling,
    event_bus: Arc<EventBus>,
}

impl WorkflowExecutor {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            max_parallel: None,
            node_timeout: None,
            on_error: ErrorHandling::default(),
            event_bus,
        }
    }

    /// Cap the number of nodes running at once. Unbounded by default.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = Some(max_parallel.max(1));
        self
    }

    pub fn with_node_timeout(mut self, node_timeout: Duration) -> Self {
        self.node_timeout = Some(node_timeout);
        self
    }

    pub fn with_error_handling(mut self, on_error: ErrorHandling) -> Self {
        self.on_error = on_error;
        self
    }

    pub fn error_handling(&self) -> ErrorHandling {
        self.on_error
    }

    /// Start a run and return its result stream.
    ///
    /// Nothing is dispatched until the stream is first polled. The stream
    /// yields one event per node, in completion order, and then ends.
    pub fn execute(&self, workflow: Arc<Workflow>, seed: State) -> Result<ResultStream, FlowError> {
        if !workflow.is_validated() {
            return Err(WorkflowError::NotValidated.into());
        }

        let scheduler = Scheduler::new(
            workflow,
            seed,
            SchedulerSettings {
                max_parallel: self.max_parallel.unwrap_or(usize::MAX),
                node_timeout: self.node_timeout,
                on_error: self.on_error,
            },
            Arc::clone(&self.event_bus),
        );
        Ok(ResultStream::new(scheduler))
    }
}

struct SchedulerSettings {
    max_parallel: usize,
    node_timeout: Option<Duration>,
    on_error: ErrorHandling,
}

/// Outcome of one node task.
struct NodeRun {
    node: String,
    result: Result<StateDelta, NodeError>,
    duration_ms: u64,
}

/// Execution record of a single run.
///
/// Owns the only mutable copy of the state. Merges happen one completion at a
/// time inside `complete`, so concurrent branches never interleave entries.
pub(crate) struct Scheduler {
    execution_id: ExecutionId,
    workflow: Arc<Workflow>,
    settings: SchedulerSettings,
    event_bus: Arc<EventBus>,
    state: State,
    in_degree: HashMap<String, usize>,
    /// Ready nodes with the state they became ready against
    ready: VecDeque<(String, Arc<State>)>,
    running: HashSet<String>,
    completed: HashSet<String>,
    tasks: FuturesUnordered<JoinHandle<NodeRun>>,
    started_at: Option<Instant>,
    degraded: bool,
    finished: bool,
}

impl Scheduler {
    fn new(
        workflow: Arc<Workflow>,
        seed: State,
        settings: SchedulerSettings,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let mut in_degree: HashMap<String, usize> =
            workflow.node_names().map(|name| (name.to_string(), 0)).collect();
        for edge in workflow.edges() {
            if let Some(count) = in_degree.get_mut(&edge.to) {
                *count += 1;
            }
        }

        // registration order keeps dispatch order stable for roots
        let seed_snapshot = Arc::new(seed.clone());
        let ready = workflow
            .node_names()
            .filter(|name| in_degree.get(*name) == Some(&0))
            .map(|name| (name.to_string(), Arc::clone(&seed_snapshot)))
            .collect();

        Self {
            execution_id: ExecutionId::new_v4(),
            workflow,
            settings,
            event_bus,
            state: seed,
            in_degree,
            ready,
            running: HashSet::new(),
            completed: HashSet::new(),
            tasks: FuturesUnordered::new(),
            started_at: None,
            degraded: false,
            finished: false,
        }
    }

    pub(crate) fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    pub(crate) fn state(&self) -> &State {
        &self.state
    }

    pub(crate) fn take_state(&mut self) -> State {
        std::mem::take(&mut self.state)
    }

    pub(crate) fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Drive the run until the next node completes.
    pub(crate) fn poll_next_event(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<ResultEvent, FlowError>>> {
        if self.finished {
            return Poll::Ready(None);
        }
        if self.started_at.is_none() {
            self.start();
        }

        self.dispatch_ready();

        if self.completed.len() == self.workflow.len() {
            self.finish(true);
            return Poll::Ready(None);
        }

        if self.tasks.is_empty() {
            self.finish(false);
            return Poll::Ready(Some(Err(FlowError::Scheduler(format!(
                "{} node(s) incomplete but none running or ready",
                self.workflow.len() - self.completed.len()
            )))));
        }

        match self.tasks.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => {
                self.finish(false);
                Poll::Ready(Some(Err(FlowError::Scheduler(
                    "task set drained unexpectedly".to_string(),
                ))))
            }
            Poll::Ready(Some(joined)) => {
                let outcome = joined
                    .map_err(|e| FlowError::Scheduler(format!("Task join error: {}", e)))
                    .and_then(|run| self.complete(run));
                if outcome.is_err() {
                    self.finish(false);
                }
                Poll::Ready(Some(outcome))
            }
        }
    }

    fn start(&mut self) {
        self.started_at = Some(Instant::now());
        tracing::info!(
            execution_id = %self.execution_id,
            workflow = %self.workflow.name(),
            nodes = self.workflow.len(),
            "Starting workflow execution"
        );
        self.event_bus.emit(ExecutionEvent::WorkflowStarted {
            execution_id: self.execution_id,
            workflow: self.workflow.name().to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Spawn ready nodes up to the parallel limit. Each runs against the
    /// snapshot taken when it became ready, not the state at spawn time.
    fn dispatch_ready(&mut self) {
        while self.tasks.len() < self.settings.max_parallel {
            let Some((name, snapshot)) = self.ready.pop_front() else {
                break;
            };
            let Some(node) = self.workflow.node(&name).cloned() else {
                tracing::error!(node = %name, "Ready node missing from workflow");
                continue;
            };

            tracing::debug!(
                execution_id = %self.execution_id,
                node = %name,
                snapshot_len = snapshot.len(),
                "Dispatching node"
            );
            self.event_bus.emit(ExecutionEvent::NodeStarted {
                execution_id: self.execution_id,
                node: name.clone(),
                snapshot_len: snapshot.len(),
                timestamp: Utc::now(),
            });

            let ctx = NodeContext::new(
                name.clone(),
                snapshot,
                self.event_bus.create_emitter(self.execution_id, &name),
            );
            let node_timeout = self.settings.node_timeout;
            let task_name = name.clone();

            let task = async move {
                let start = Instant::now();
                let guarded = AssertUnwindSafe(node.execute(ctx)).catch_unwind();

                let result = match node_timeout {
                    Some(limit) => match timeout(limit, guarded).await {
                        Ok(caught) => caught,
                        Err(_) => Ok(Err(NodeError::Timeout {
                            millis: limit.as_millis() as u64,
                        })),
                    },
                    None => guarded.await,
                };
                let result =
                    result.unwrap_or_else(|panic| Err(NodeError::Panicked(panic_message(panic))));

                NodeRun {
                    node: task_name,
                    result,
                    duration_ms: start.elapsed().as_millis() as u64,
                }
            };

            self.running.insert(name);
            self.tasks.push(tokio::spawn(task));
        }
    }

    /// Merge a finished node's delta and advance readiness of its successors.
    fn complete(&mut self, run: NodeRun) -> Result<ResultEvent, FlowError> {
        let NodeRun {
            node: name,
            result,
            duration_ms,
        } = run;

        if !self.running.remove(&name) {
            return Err(FlowError::Scheduler(format!(
                "completion reported for node '{}' which is not running",
                name
            )));
        }
        let node = self.workflow.node(&name).cloned().ok_or_else(|| {
            FlowError::Scheduler(format!("completed node '{}' is not in the workflow", name))
        })?;

        let (delta, degraded) = match result {
            Ok(delta) => {
                tracing::info!(
                    execution_id = %self.execution_id,
                    node = %name,
                    duration_ms,
                    "Node completed"
                );
                self.event_bus.emit(ExecutionEvent::NodeCompleted {
                    execution_id: self.execution_id,
                    node: name.clone(),
                    entries: delta.entries.len(),
                    duration_ms,
                    timestamp: Utc::now(),
                });
                (delta, false)
            }
            Err(error) => {
                tracing::warn!(
                    execution_id = %self.execution_id,
                    node = %name,
                    error = %error,
                    "Node failed"
                );
                self.event_bus.emit(ExecutionEvent::NodeFailed {
                    execution_id: self.execution_id,
                    node: name.clone(),
                    error: error.to_string(),
                    timestamp: Utc::now(),
                });

                match self.settings.on_error {
                    ErrorHandling::StopWorkflow => {
                        return Err(FlowError::NodeFailed {
                            node: name,
                            source: error,
                        });
                    }
                    ErrorHandling::Substitute => (StateDelta::entry(node.diagnostic(&error)), false),
                    ErrorHandling::MarkDegraded => {
                        (StateDelta::entry(node.diagnostic(&error)), true)
                    }
                }
            }
        };

        self.state.merge(&delta);
        self.degraded |= degraded;
        self.completed.insert(name.clone());

        // successors released by this completion share one snapshot
        let mut released: Option<Arc<State>> = None;
        for successor in self.workflow.successors(&name) {
            let count = self.in_degree.get_mut(successor).ok_or_else(|| {
                FlowError::Scheduler(format!("edge target '{}' has no in-degree entry", successor))
            })?;
            *count = count.checked_sub(1).ok_or_else(|| {
                FlowError::Scheduler(format!("in-degree underflow for '{}'", successor))
            })?;
            if *count == 0 {
                let snapshot = released
                    .get_or_insert_with(|| Arc::new(self.state.clone()))
                    .clone();
                self.ready.push_back((successor.to_string(), snapshot));
            }
        }

        // successors start before the consumer sees this event
        self.dispatch_ready();

        Ok(ResultEvent {
            node: name,
            delta,
            duration_ms,
            degraded,
        })
    }

    fn finish(&mut self, success: bool) {
        if self.finished {
            return;
        }
        self.finished = true;

        let duration_ms = self
            .started_at
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or_default();
        tracing::info!(
            execution_id = %self.execution_id,
            success,
            degraded = self.degraded,
            duration_ms,
            "Workflow execution finished"
        );
        self.event_bus.emit(ExecutionEvent::WorkflowCompleted {
            execution_id: self.execution_id,
            success,
            degraded: self.degraded,
            duration_ms,
            timestamp: Utc::now(),
        });

        for task in self.tasks.iter() {
            task.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if !self.finished && !self.running.is_empty() {
            tracing::debug!(
                execution_id = %self.execution_id,
                running = self.running.len(),
                "Result stream dropped early, aborting running nodes"
            );
        }
        for task in self.tasks.iter() {
            task.abort();
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
