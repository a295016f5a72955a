use crate::{events::EventEmitter, NodeError, State, StateDelta};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Core trait that all workflow nodes implement
#[async_trait]
pub trait Node: Send + Sync {
    /// Unique name within a workflow (e.g. "documentAgent")
    fn name(&self) -> &str;

    /// Run against a state snapshot and return this node's contribution.
    async fn execute(&self, ctx: NodeContext) -> Result<StateDelta, NodeError>;

    /// Text that stands in for this node's output when it fails.
    fn diagnostic(&self, error: &NodeError) -> String {
        format!("Error in {}: {}", self.name(), error)
    }
}

/// Execution context passed to each node
#[derive(Clone)]
pub struct NodeContext {
    pub node: String,

    /// State as it stood when the node was dispatched. Read-only.
    pub state: Arc<State>,

    /// Event emitter for progress messages
    pub events: EventEmitter,
}

impl NodeContext {
    pub fn new(node: impl Into<String>, state: Arc<State>, events: EventEmitter) -> Self {
        Self {
            node: node.into(),
            state,
            events,
        }
    }

    /// Context with no event subscribers, for running a node outside a workflow.
    pub fn detached(node: impl Into<String>, state: State) -> Self {
        let node = node.into();
        Self {
            events: EventEmitter::detached(node.clone()),
            node,
            state: Arc::new(state),
        }
    }

    pub fn messages(&self) -> &[String] {
        self.state.messages()
    }
}

/// Node backed by an async closure.
pub struct FnNode<F> {
    name: String,
    func: F,
}

impl<F, Fut> FnNode<F>
where
    F: Fn(NodeContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StateDelta, NodeError>> + Send,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F, Fut> Node for FnNode<F>
where
    F: Fn(NodeContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StateDelta, NodeError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: NodeContext) -> Result<StateDelta, NodeError> {
        (self.func)(ctx).await
    }
}
