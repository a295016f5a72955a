//! Screening agents
//!
//! The four agents of the reference screening topology, plus the
//! capabilities they run against: document stores, an OpenAI-compatible
//! text generator, evaluation parsing and invitation notifiers.

mod aggregator;
mod document;
mod documents;
mod evaluation;
mod llm;
mod notify;
mod redflag;
mod role;

pub use aggregator::{AggregatorAgent, AggregatorAgentFactory, AGGREGATOR_AGENT_KIND};
pub use document::{DocumentAgent, DocumentAgentFactory, DOCUMENT_AGENT_KIND};
pub use documents::{FileDocumentStore, InMemoryDocumentStore};
pub use evaluation::{extract_score, CategoryScores, Evaluation, Verdict, MAX_SCORE};
pub use llm::{LlmConfig, OpenAiCompatClient};
pub use notify::{
    notify_if_shortlisted, Invitation, LogNotifier, NotificationOutcome, Notifier, WebhookNotifier,
};
pub use redflag::{RedFlagAgent, RedFlagAgentFactory, RED_FLAG_AGENT_KIND};
pub use role::{RoleAgent, RoleAgentFactory, ROLE_AGENT_KIND};

use screencore::{DocumentStore, TextGenerator, Workflow, WorkflowError};
use screenruntime::{NodeRegistry, WorkflowSpec};
use std::sync::Arc;

pub const DOCUMENT_AGENT: &str = "documentAgent";
pub const ROLE_AGENT: &str = "roleAgent";
pub const RED_FLAG_AGENT: &str = "redFlagAgent";
pub const AGGREGATOR_AGENT: &str = "aggregatorAgent";

/// First message of every screening run.
pub const SEED_PROMPT: &str = "You are a recruitment expert and your role is to match a candidate's profile with a given job description.";

/// Capabilities shared by every agent.
#[derive(Clone)]
pub struct AgentDeps {
    pub documents: Arc<dyn DocumentStore>,
    pub generator: Arc<dyn TextGenerator>,
}

impl AgentDeps {
    pub fn new(documents: Arc<dyn DocumentStore>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            documents,
            generator,
        }
    }
}

/// Register the agent factories with a registry
pub fn register_all(registry: &mut NodeRegistry, deps: &AgentDeps) {
    registry.register(Arc::new(DocumentAgentFactory::new(deps.clone())));
    registry.register(Arc::new(RoleAgentFactory::new(deps.clone())));
    registry.register(Arc::new(RedFlagAgentFactory::new(deps.clone())));
    registry.register(Arc::new(AggregatorAgentFactory::new(deps.clone())));
}

/// The reference diamond: document first, role and red flags in parallel,
/// aggregator last.
pub fn screening_spec() -> WorkflowSpec {
    let mut spec = WorkflowSpec::new("candidate-screening")
        .with_node(DOCUMENT_AGENT, DOCUMENT_AGENT_KIND)
        .with_node(ROLE_AGENT, ROLE_AGENT_KIND)
        .with_node(RED_FLAG_AGENT, RED_FLAG_AGENT_KIND)
        .with_node(AGGREGATOR_AGENT, AGGREGATOR_AGENT_KIND)
        .with_edge(DOCUMENT_AGENT, ROLE_AGENT)
        .with_edge(DOCUMENT_AGENT, RED_FLAG_AGENT)
        .with_edge(ROLE_AGENT, AGGREGATOR_AGENT)
        .with_edge(RED_FLAG_AGENT, AGGREGATOR_AGENT)
        .with_entry(DOCUMENT_AGENT);
    spec.description = Some("Match a candidate document against a role description".to_string());
    spec
}

/// Build and validate the reference topology without going through a registry.
pub fn screening_workflow(deps: &AgentDeps) -> Result<Workflow, WorkflowError> {
    let mut workflow = Workflow::new("candidate-screening");
    workflow.register(DocumentAgent::new(DOCUMENT_AGENT, deps.clone()))?;
    workflow.register(RoleAgent::new(ROLE_AGENT, deps.clone()))?;
    workflow.register(RedFlagAgent::new(RED_FLAG_AGENT, deps.clone()))?;
    workflow.register(AggregatorAgent::new(AGGREGATOR_AGENT, deps.clone()))?;

    workflow.connect(DOCUMENT_AGENT, ROLE_AGENT)?;
    workflow.connect(DOCUMENT_AGENT, RED_FLAG_AGENT)?;
    workflow.connect(ROLE_AGENT, AGGREGATOR_AGENT)?;
    workflow.connect(RED_FLAG_AGENT, AGGREGATOR_AGENT)?;
    workflow.set_entry(DOCUMENT_AGENT)?;

    workflow.validate()?;
    Ok(workflow)
}
