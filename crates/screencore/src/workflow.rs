use crate::{Node, WorkflowError};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Directed dependency: `to` may not run until `from` has completed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// How many zero-in-degree nodes a workflow may have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPolicy {
    /// Exactly one entry node; every other node needs an incoming edge.
    #[default]
    Single,
    /// Every node without incoming edges is a root and starts immediately.
    Multiple,
}

/// A named set of nodes, their dependency edges and an entry node.
///
/// Structural changes are accepted until the first successful `validate()`;
/// after that the definition is sealed and only an executor may use it.
pub struct Workflow {
    name: String,
    nodes: Vec<Arc<dyn Node>>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    entry: Option<String>,
    entry_policy: EntryPolicy,
    validated: bool,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            entry: None,
            entry_policy: EntryPolicy::Single,
            validated: false,
        }
    }

    pub fn with_entry_policy(mut self, policy: EntryPolicy) -> Self {
        self.entry_policy = policy;
        self
    }

    /// Register a node under its own name.
    pub fn register(&mut self, node: impl Node + 'static) -> Result<(), WorkflowError> {
        self.register_arc(Arc::new(node))
    }

    pub fn register_arc(&mut self, node: Arc<dyn Node>) -> Result<(), WorkflowError> {
        self.ensure_open()?;
        let name = node.name().to_string();
        if self.index.contains_key(&name) {
            return Err(WorkflowError::DuplicateNode(name));
        }
        tracing::debug!(workflow = %self.name, node = %name, "Registering node");
        self.index.insert(name, self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    pub fn connect(&mut self, from: &str, to: &str) -> Result<(), WorkflowError> {
        self.ensure_open()?;
        for endpoint in [from, to] {
            if !self.index.contains_key(endpoint) {
                return Err(WorkflowError::UnknownNode(endpoint.to_string()));
            }
        }
        self.edges.push(Edge {
            from: from.to_string(),
            to: to.to_string(),
        });
        Ok(())
    }

    pub fn set_entry(&mut self, node: &str) -> Result<(), WorkflowError> {
        self.ensure_open()?;
        if !self.index.contains_key(node) {
            return Err(WorkflowError::UnknownNode(node.to_string()));
        }
        self.entry = Some(node.to_string());
        Ok(())
    }

    /// Check the graph structure and seal the definition.
    ///
    /// Checks run in this order: entry present, no cycles, no competing
    /// roots, every node reachable. Calling this again after success is a
    /// no-op.
    pub fn validate(&mut self) -> Result<(), WorkflowError> {
        if self.validated {
            return Ok(());
        }

        if self.entry_policy == EntryPolicy::Single && self.entry.is_none() {
            return Err(WorkflowError::MissingEntry);
        }
        if self.nodes.is_empty() {
            return Err(WorkflowError::Invalid("workflow has no nodes".to_string()));
        }

        let graph = self.build_graph();

        if let Err(cycle) = toposort(&graph, None) {
            let name = self.nodes[graph[cycle.node_id()]].name().to_string();
            return Err(WorkflowError::CyclicGraph(name));
        }

        let roots = match (self.entry_policy, &self.entry) {
            (EntryPolicy::Single, Some(entry)) => {
                for idx in graph.node_indices() {
                    let name = self.nodes[graph[idx]].name();
                    let incoming = graph.neighbors_directed(idx, Direction::Incoming).count();
                    let outgoing = graph.neighbors_directed(idx, Direction::Outgoing).count();
                    if incoming == 0 && outgoing > 0 && name != entry {
                        return Err(WorkflowError::MultipleEntries {
                            entry: entry.clone(),
                            found: name.to_string(),
                        });
                    }
                }
                vec![NodeIndex::new(self.index[entry])]
            }
            _ => graph
                .node_indices()
                .filter(|idx| {
                    graph
                        .neighbors_directed(*idx, Direction::Incoming)
                        .next()
                        .is_none()
                })
                .collect(),
        };

        let mut reached = HashSet::new();
        let mut dfs = Dfs::empty(&graph);
        for root in roots {
            dfs.move_to(root);
            while let Some(idx) = dfs.next(&graph) {
                reached.insert(idx);
            }
        }
        if let Some(idx) = graph.node_indices().find(|idx| !reached.contains(idx)) {
            let name = self.nodes[graph[idx]].name().to_string();
            return Err(WorkflowError::UnreachableNode(name));
        }

        self.validated = true;
        tracing::info!(
            workflow = %self.name,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "Workflow validated"
        );
        Ok(())
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> Option<&str> {
        self.entry.as_deref()
    }

    pub fn entry_policy(&self) -> EntryPolicy {
        self.entry_policy
    }

    /// Nodes in registration order
    pub fn nodes(&self) -> &[Arc<dyn Node>] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&Arc<dyn Node>> {
        self.index.get(name).map(|i| &self.nodes[*i])
    }

    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.name())
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Targets of edges leaving `node`, one per edge.
    pub fn successors<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.from == node)
            .map(|e| e.to.as_str())
    }

    pub fn predecessors<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.to == node)
            .map(|e| e.from.as_str())
    }

    /// Nodes with no outgoing edges
    pub fn terminal_nodes(&self) -> Vec<&str> {
        self.node_names()
            .filter(|name| !self.edges.iter().any(|e| e.from == *name))
            .collect()
    }

    /// Render as a Mermaid flowchart.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("flowchart TD\n");
        for (i, node) in self.nodes.iter().enumerate() {
            if self.entry.as_deref() == Some(node.name()) {
                out.push_str(&format!("    n{}([\"{}\"])\n", i, node.name()));
            } else {
                out.push_str(&format!("    n{}[\"{}\"]\n", i, node.name()));
            }
        }
        for edge in &self.edges {
            out.push_str(&format!(
                "    n{} --> n{}\n",
                self.index[&edge.from], self.index[&edge.to]
            ));
        }
        out
    }

    fn ensure_open(&self) -> Result<(), WorkflowError> {
        if self.validated {
            Err(WorkflowError::Sealed)
        } else {
            Ok(())
        }
    }

    /// Graph whose weights are indices into `self.nodes`.
    fn build_graph(&self) -> DiGraph<usize, ()> {
        let mut graph = DiGraph::new();
        for i in 0..self.nodes.len() {
            graph.add_node(i);
        }
        for edge in &self.edges {
            graph.add_edge(
                NodeIndex::new(self.index[&edge.from]),
                NodeIndex::new(self.index[&edge.to]),
                (),
            );
        }
        graph
    }
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("nodes", &self.node_names().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .field("entry", &self.entry)
            .field("entry_policy", &self.entry_policy)
            .field("validated", &self.validated)
            .finish()
    }
}
