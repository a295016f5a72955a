use screencore::{Node, WorkflowError};
use std::collections::HashMap;
use std::sync::Arc;

/// Factory trait for creating node instances by kind
pub trait NodeFactory: Send + Sync {
    /// Create a node registered under `name`
    fn create(&self, name: &str) -> Result<Arc<dyn Node>, WorkflowError>;

    /// Kind identifier used in workflow files
    fn kind(&self) -> &str;

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::default()
    }
}

/// Metadata about a node kind
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub description: String,
    pub category: String,
}

impl Default for NodeMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            category: "general".to_string(),
        }
    }
}

/// Registry of available node kinds
pub struct NodeRegistry {
    factories: HashMap<String, Arc<dyn NodeFactory>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory; a later factory for the same kind replaces the
    /// earlier one.
    pub fn register(&mut self, factory: Arc<dyn NodeFactory>) {
        let kind = factory.kind().to_string();
        tracing::debug!(kind = %kind, "Registering node kind");
        if self.factories.insert(kind.clone(), factory).is_some() {
            tracing::warn!(kind = %kind, "Node kind registered twice, keeping the latest");
        }
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn create_node(&self, kind: &str, name: &str) -> Result<Arc<dyn Node>, WorkflowError> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| WorkflowError::UnknownNodeKind(kind.to_string()))?;

        factory.create(name)
    }

    /// Registered kinds, sorted
    pub fn list_node_kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.factories.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    pub fn get_metadata(&self, kind: &str) -> Option<NodeMetadata> {
        self.factories.get(kind).map(|f| f.metadata())
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
