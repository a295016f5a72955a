use crate::{
    loader::WorkflowSpec, registry::NodeRegistry, ErrorHandling, ResultStream, RunReport,
    WorkflowExecutor,
};
use screencore::{EventBus, ExecutionEvent, FlowError, State, Workflow, WorkflowError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Main runtime for executing workflows
pub struct FlowRuntime {
    registry: Arc<NodeRegistry>,
    executor: Arc<WorkflowExecutor>,
    event_bus: Arc<EventBus>,
    workflows: Arc<RwLock<HashMap<String, Arc<Workflow>>>>,
}

impl FlowRuntime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::with_registry(Arc::new(NodeRegistry::new()), config)
    }

    pub fn with_registry(registry: Arc<NodeRegistry>, config: RuntimeConfig) -> Self {
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));

        let mut executor =
            WorkflowExecutor::new(Arc::clone(&event_bus)).with_error_handling(config.on_error);
        if let Some(max_parallel) = config.max_parallel_nodes {
            executor = executor.with_max_parallel(max_parallel);
        }
        if let Some(timeout_ms) = config.node_timeout_ms {
            executor = executor.with_node_timeout(Duration::from_millis(timeout_ms));
        }

        Self {
            registry,
            executor: Arc::new(executor),
            event_bus,
            workflows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Validate and register a workflow under its name.
    pub async fn register_workflow(&self, mut workflow: Workflow) -> Result<Arc<Workflow>, FlowError> {
        workflow.validate()?;
        let workflow = Arc::new(workflow);
        let mut workflows = self.workflows.write().await;
        workflows.insert(workflow.name().to_string(), Arc::clone(&workflow));
        Ok(workflow)
    }

    /// Build a workflow from a spec through this runtime's registry and
    /// register it.
    pub async fn load_workflow(&self, spec: &WorkflowSpec) -> Result<Arc<Workflow>, FlowError> {
        let workflow = spec.build(&self.registry)?;
        self.register_workflow(workflow).await
    }

    pub async fn execute_workflow(&self, name: &str, seed: State) -> Result<ResultStream, FlowError> {
        let workflow = {
            let workflows = self.workflows.read().await;
            workflows
                .get(name)
                .cloned()
                .ok_or_else(|| WorkflowError::Invalid(format!("workflow not registered: {}", name)))?
        };

        self.executor.execute(workflow, seed)
    }

    /// Execute a validated workflow directly (without registration)
    pub fn execute(&self, workflow: Arc<Workflow>, seed: State) -> Result<ResultStream, FlowError> {
        self.executor.execute(workflow, seed)
    }

    /// Execute and drain the result stream.
    pub async fn run(&self, workflow: Arc<Workflow>, seed: State) -> Result<RunReport, FlowError> {
        self.execute(workflow, seed)?.collect_report().await
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }
}

impl Default for FlowRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Unbounded when unset
    pub max_parallel_nodes: Option<usize>,
    pub node_timeout_ms: Option<u64>,
    pub on_error: ErrorHandling,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_parallel_nodes: None,
            node_timeout_ms: None,
            on_error: ErrorHandling::Substitute,
            event_buffer_size: 1000,
        }
    }
}
