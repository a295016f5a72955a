use crate::AgentDeps;
use async_trait::async_trait;
use screencore::{DocumentKind, Node, NodeContext, NodeError, StateDelta, WorkflowError};
use screenruntime::{NodeFactory, NodeMetadata};
use std::sync::Arc;

pub const ROLE_AGENT_KIND: &str = "agent.role";

/// Extracts the requirements from the role description.
pub struct RoleAgent {
    name: String,
    deps: AgentDeps,
}

impl RoleAgent {
    pub fn new(name: impl Into<String>, deps: AgentDeps) -> Self {
        Self {
            name: name.into(),
            deps,
        }
    }
}

#[async_trait]
impl Node for RoleAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: NodeContext) -> Result<StateDelta, NodeError> {
        let role = self
            .deps
            .documents
            .read_document(DocumentKind::RoleDescription)
            .await?;
        ctx.events
            .info(format!("Read role description ({} chars)", role.len()));

        let prompt = format!(
            "Your task is to extract the exact job requirements from the given data. \
             Only respond with the job requirements and nothing else.\n\n\
             Data: {}",
            role
        );
        let answer = self.deps.generator.generate(&prompt).await?;

        // kept on one line so the aggregator prompt stays compact
        Ok(StateDelta::entry(answer.replace('\n', " ")))
    }

    fn diagnostic(&self, error: &NodeError) -> String {
        format!("Error extracting job description: {}", error)
    }
}

pub struct RoleAgentFactory {
    deps: AgentDeps,
}

impl RoleAgentFactory {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

impl NodeFactory for RoleAgentFactory {
    fn create(&self, name: &str) -> Result<Arc<dyn Node>, WorkflowError> {
        Ok(Arc::new(RoleAgent::new(name, self.deps.clone())))
    }

    fn kind(&self) -> &str {
        ROLE_AGENT_KIND
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Extract requirements from the role description".to_string(),
            category: "analysis".to_string(),
        }
    }
}
