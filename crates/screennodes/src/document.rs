use crate::AgentDeps;
use async_trait::async_trait;
use screencore::{DocumentKind, Node, NodeContext, NodeError, StateDelta, WorkflowError};
use screenruntime::{NodeFactory, NodeMetadata};
use std::sync::Arc;

pub const DOCUMENT_AGENT_KIND: &str = "agent.document";

/// Extracts the candidate's name and contact details from their document.
pub struct DocumentAgent {
    name: String,
    deps: AgentDeps,
}

impl DocumentAgent {
    pub fn new(name: impl Into<String>, deps: AgentDeps) -> Self {
        Self {
            name: name.into(),
            deps,
        }
    }
}

#[async_trait]
impl Node for DocumentAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: NodeContext) -> Result<StateDelta, NodeError> {
        let resume = self
            .deps
            .documents
            .read_document(DocumentKind::CandidateDocument)
            .await?;
        ctx.events
            .info(format!("Read candidate document ({} chars)", resume.len()));

        let prompt = format!(
            "Your task is to extract the candidate name and contact details from the resume data. \
             Only respond with the candidate name, contact details and nothing else.\n\n\
             Resume Data: {}",
            resume
        );
        let answer = self.deps.generator.generate(&prompt).await?;

        Ok(StateDelta::entry(answer))
    }

    fn diagnostic(&self, error: &NodeError) -> String {
        format!("Error extracting name: {}", error)
    }
}

pub struct DocumentAgentFactory {
    deps: AgentDeps,
}

impl DocumentAgentFactory {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

impl NodeFactory for DocumentAgentFactory {
    fn create(&self, name: &str) -> Result<Arc<dyn Node>, WorkflowError> {
        Ok(Arc::new(DocumentAgent::new(name, self.deps.clone())))
    }

    fn kind(&self) -> &str {
        DOCUMENT_AGENT_KIND
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Extract candidate name and contact details".to_string(),
            category: "analysis".to_string(),
        }
    }
}
