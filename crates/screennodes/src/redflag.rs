use crate::AgentDeps;
use async_trait::async_trait;
use screencore::{DocumentKind, Node, NodeContext, NodeError, StateDelta, WorkflowError};
use screenruntime::{NodeFactory, NodeMetadata};
use std::sync::Arc;

pub const RED_FLAG_AGENT_KIND: &str = "agent.red_flag";

const RED_FLAG_PROMPT: &str = "You are a Resume Screening Assistant.

Your task is to analyze the candidate's resume and identify any potential red flags or concerns a recruiter might have.

Look for the following:
- Frequent job switching (e.g., jobs lasting <1 year repeatedly)
- Unexplained employment gaps
- Lack of relevant experience for technical claims
- Missing education details
- Irrelevant experience
- Spelling or grammar issues

Return a list of clear points like:
- \"Employment gap between 2020-2022\"
- \"Mentions Python skills but no project or job experience using it\"
- \"No education information found\"";

/// Lists concerns a recruiter would raise about the candidate document.
pub struct RedFlagAgent {
    name: String,
    deps: AgentDeps,
}

impl RedFlagAgent {
    pub fn new(name: impl Into<String>, deps: AgentDeps) -> Self {
        Self {
            name: name.into(),
            deps,
        }
    }
}

#[async_trait]
impl Node for RedFlagAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: NodeContext) -> Result<StateDelta, NodeError> {
        let resume = self
            .deps
            .documents
            .read_document(DocumentKind::CandidateDocument)
            .await?;

        let prompt = format!("{}\n\nResume Data:\n{}", RED_FLAG_PROMPT, resume);
        let answer = self.deps.generator.generate(&prompt).await?;

        let flagged = answer.lines().filter(|l| l.trim_start().starts_with('-')).count();
        if flagged > 0 {
            ctx.events.info(format!("{} concerns listed", flagged));
        }

        Ok(StateDelta::entry(answer))
    }

    fn diagnostic(&self, error: &NodeError) -> String {
        format!("Error in redflag agent: {}", error)
    }
}

pub struct RedFlagAgentFactory {
    deps: AgentDeps,
}

impl RedFlagAgentFactory {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

impl NodeFactory for RedFlagAgentFactory {
    fn create(&self, name: &str) -> Result<Arc<dyn Node>, WorkflowError> {
        Ok(Arc::new(RedFlagAgent::new(name, self.deps.clone())))
    }

    fn kind(&self) -> &str {
        RED_FLAG_AGENT_KIND
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "List red flags in the candidate document".to_string(),
            category: "analysis".to_string(),
        }
    }
}
