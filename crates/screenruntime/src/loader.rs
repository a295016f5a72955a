use crate::registry::NodeRegistry;
use screencore::{Edge, EntryPolicy, FlowError, Workflow};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serializable description of a workflow: node kinds by name plus edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    #[serde(default)]
    pub entry_policy: EntryPolicy,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// A node in a workflow file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    pub kind: String,
}

impl WorkflowSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            entry: None,
            entry_policy: EntryPolicy::Single,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn with_node(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.nodes.push(NodeSpec {
            name: name.into(),
            kind: kind.into(),
        });
        self
    }

    pub fn with_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push(Edge {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FlowError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, FlowError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Instantiate every node through the registry, wire the edges and
    /// validate. The returned workflow is sealed.
    pub fn build(&self, registry: &NodeRegistry) -> Result<Workflow, FlowError> {
        let mut workflow = Workflow::new(&self.name).with_entry_policy(self.entry_policy);

        for spec in &self.nodes {
            let node = registry.create_node(&spec.kind, &spec.name)?;
            workflow.register_arc(node)?;
        }
        for edge in &self.edges {
            workflow.connect(&edge.from, &edge.to)?;
        }
        if let Some(entry) = &self.entry {
            workflow.set_entry(entry)?;
        }

        workflow.validate()?;
        Ok(workflow)
    }
}
