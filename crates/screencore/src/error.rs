use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Node '{node}' failed: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: NodeError,
    },

    #[error("Scheduler invariant violated: {0}")]
    Scheduler(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures raised inside a node function.
///
/// These never abort a run under the default error handling; the executor
/// turns them into a diagnostic state entry.
#[derive(Error, Debug, Clone)]
pub enum NodeError {
    #[error("Document unavailable: {0}")]
    DocumentUnavailable(String),

    #[error("Text generation failed: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Timeout after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Node panicked: {0}")]
    Panicked(String),
}

/// Failures reported by a text-generation backend.
#[derive(Error, Debug, Clone)]
pub enum CapabilityError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("quota exceeded: {0}")]
    Quota(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// Structural problems with a workflow definition, raised before any run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Node already registered: {0}")]
    DuplicateNode(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Cyclic dependency detected at node: {0}")]
    CyclicGraph(String),

    #[error("Node not reachable from entry: {0}")]
    UnreachableNode(String),

    #[error("Node '{found}' has no incoming edges but entry is '{entry}'")]
    MultipleEntries { entry: String, found: String },

    #[error("No entry node set")]
    MissingEntry,

    #[error("Workflow is sealed after validation")]
    Sealed,

    #[error("Workflow has not been validated")]
    NotValidated,

    #[error("Unknown node kind: {0}")]
    UnknownNodeKind(String),

    #[error("Invalid workflow: {0}")]
    Invalid(String),
}
