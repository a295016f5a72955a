use crate::evaluation::Evaluation;
use crate::AgentDeps;
use async_trait::async_trait;
use screencore::{DocumentKind, Node, NodeContext, NodeError, StateDelta, WorkflowError};
use screenruntime::{NodeFactory, NodeMetadata};
use std::sync::Arc;

pub const AGGREGATOR_AGENT_KIND: &str = "agent.aggregator";

const SCORING_PROMPT: &str = "You are a Recruitment AI Assistant.

Your task is to evaluate how well a candidate's resume matches a given job description
and assign a score out of 100 based on the criteria below.

Scoring Criteria:
- Skills Match: 30 points
- Experience Match: 50 points
    - Do NOT award experience points for roles unrelated to the job description.
    - For freshers, evaluate relevant internships, academic projects or portfolio work.
    - For experienced candidates, award 0-30 points for years of relevant experience
      and 0-20 points for quality, relevance and impact of work.
- Education Match: 10 points
    - If education does NOT match required fields (e.g., CS, DS, AI or related), assign 0.
- Extras (Certifications, Awards, Side Projects): 10 points

Apply the scoring rules strictly. Do not award points for irrelevant experience.

Recommendation:
- score above 75 and key requirements met: \"I recommend this candidate for the job.\"
- score 50-75: \"I do not recommend this candidate for this specific job. However, I recommend this candidate for an internship or entry-level position.\"
- score below 50: \"I do not recommend this candidate for the job.\" followed by the reason.

Respond with a single JSON object and nothing else:
{\"score\": <0-100>, \"breakdown\": {\"skills\": <0-30>, \"experience\": <0-50>, \"education\": <0-10>, \"extras\": <0-10>}, \"summary\": \"<3-4 lines on strengths and gaps>\", \"recommendation\": \"<recommendation>\"}";

/// Scores the candidate against the role using everything upstream produced.
///
/// The entry is the rendered [`Evaluation`]; the structured form travels in
/// the delta payload.
pub struct AggregatorAgent {
    name: String,
    deps: AgentDeps,
}

impl AggregatorAgent {
    pub fn new(name: impl Into<String>, deps: AgentDeps) -> Self {
        Self {
            name: name.into(),
            deps,
        }
    }
}

#[async_trait]
impl Node for AggregatorAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: NodeContext) -> Result<StateDelta, NodeError> {
        let resume = self
            .deps
            .documents
            .read_document(DocumentKind::CandidateDocument)
            .await?;

        let findings = ctx.messages().join("\n\n");
        let prompt = format!(
            "{}\n\nResume Data:\n{}\n\nFindings from previous agents:\n{}",
            SCORING_PROMPT, resume, findings
        );
        let answer = self.deps.generator.generate(&prompt).await?;

        let evaluation = match Evaluation::from_json(&answer) {
            Some(evaluation) => evaluation,
            None => {
                ctx.events
                    .warn("Response was not structured, score taken from text");
                Evaluation::from_prose(&answer)
            }
        };
        tracing::debug!(node = %self.name, score = evaluation.score, "Candidate scored");

        Ok(StateDelta::entry(evaluation.to_string()).with_payload(evaluation.to_payload()))
    }

    fn diagnostic(&self, error: &NodeError) -> String {
        format!("Error in recruit agent: {}", error)
    }
}

pub struct AggregatorAgentFactory {
    deps: AgentDeps,
}

impl AggregatorAgentFactory {
    pub fn new(deps: AgentDeps) -> Self {
        Self { deps }
    }
}

impl NodeFactory for AggregatorAgentFactory {
    fn create(&self, name: &str) -> Result<Arc<dyn Node>, WorkflowError> {
        Ok(Arc::new(AggregatorAgent::new(name, self.deps.clone())))
    }

    fn kind(&self) -> &str {
        AGGREGATOR_AGENT_KIND
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Score the candidate against the role".to_string(),
            category: "evaluation".to_string(),
        }
    }
}
