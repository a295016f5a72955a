// crates/screennodes/tests/agents_test.rs

use async_trait::async_trait;
use screencore::{CapabilityError, DocumentKind, ExecutionEvent, NodeEvent, State, TextGenerator};
use screennodes::{
    register_all, screening_spec, screening_workflow, AgentDeps, Evaluation,
    InMemoryDocumentStore, AGGREGATOR_AGENT, DOCUMENT_AGENT, RED_FLAG_AGENT, ROLE_AGENT,
    SEED_PROMPT,
};
use screenruntime::{FlowRuntime, NodeRegistry, RuntimeConfig};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::time::{sleep, Duration};

const AGGREGATOR_REPLY: &str = r#"Here is the evaluation:
{"score": 82, "breakdown": {"skills": 25, "experience": 40, "education": 10, "extras": 7},
 "summary": "Strong systems background.", "recommendation": "I recommend this candidate for the job."}"#;

/// Answers by recognising which agent wrote the prompt. The red-flag reply
/// is delayed so the role agent always completes first.
struct ScriptedGenerator {
    role_reply: Result<String, CapabilityError>,
    aggregator_reply: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new() -> Self {
        Self {
            role_reply: Ok("ROLE".to_string()),
            aggregator_reply: AGGREGATOR_REPLY.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn with_role_reply(mut self, reply: Result<String, CapabilityError>) -> Self {
        self.role_reply = reply;
        self
    }

    fn with_aggregator_reply(mut self, reply: &str) -> Self {
        self.aggregator_reply = reply.to_string();
        self
    }

    fn aggregator_prompt(&self) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.contains("Recruitment AI Assistant"))
            .cloned()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CapabilityError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if prompt.contains("Recruitment AI Assistant") {
            Ok(self.aggregator_reply.clone())
        } else if prompt.contains("red flags") {
            sleep(Duration::from_millis(30)).await;
            Ok("FLAGS".to_string())
        } else if prompt.contains("contact details") {
            Ok("DOC".to_string())
        } else if prompt.contains("job requirements") {
            self.role_reply.clone()
        } else {
            Err(CapabilityError::InvalidResponse("unexpected prompt".to_string()))
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

fn documents() -> InMemoryDocumentStore {
    InMemoryDocumentStore::new()
        .with_document(DocumentKind::CandidateDocument, "Jane Roe, jane@example.com, Rust engineer")
        .with_document(DocumentKind::RoleDescription, "Senior Rust engineer, 5+ years")
}

fn deps(store: InMemoryDocumentStore, generator: Arc<ScriptedGenerator>) -> AgentDeps {
    AgentDeps::new(Arc::new(store), generator)
}

/// Part of the aggregator prompt that carries the upstream messages.
fn findings(prompt: &str) -> &str {
    prompt
        .split("Findings from previous agents:")
        .nth(1)
        .unwrap_or_default()
}

#[tokio::test]
async fn test_screening_diamond_end_to_end() {
    init_tracing();
    let generator = Arc::new(ScriptedGenerator::new());
    let workflow = screening_workflow(&deps(documents(), Arc::clone(&generator))).unwrap();

    let report = FlowRuntime::new()
        .run(Arc::new(workflow), State::seeded(SEED_PROMPT))
        .await
        .unwrap();

    assert_eq!(
        report.completion_order(),
        vec![DOCUMENT_AGENT, ROLE_AGENT, RED_FLAG_AGENT, AGGREGATOR_AGENT]
    );
    assert_eq!(&report.state.messages()[..4], [SEED_PROMPT, "DOC", "ROLE", "FLAGS"]);
    assert_eq!(report.state.len(), 5);
    assert!(!report.degraded);

    let prompt = generator.aggregator_prompt().unwrap();
    let seen = findings(&prompt);
    let doc = seen.find("DOC").unwrap();
    let role = seen.find("ROLE").unwrap();
    let flags = seen.find("FLAGS").unwrap();
    assert!(doc < role && role < flags);
    assert_eq!(seen.matches("FLAGS").count(), 1);

    let event = report.event(AGGREGATOR_AGENT).unwrap();
    let evaluation = Evaluation::from_payload(event.delta.payload.as_ref().unwrap()).unwrap();
    assert_eq!(evaluation.score, 82);
    assert_eq!(evaluation.breakdown.unwrap().total(), 82);
    assert!(evaluation.verdict(75).shortlisted);
    assert!(report.entries(AGGREGATOR_AGENT)[0].starts_with("Score: 82/100"));
}

#[tokio::test]
async fn test_role_output_is_collapsed_to_one_line() {
    let generator = Arc::new(
        ScriptedGenerator::new().with_role_reply(Ok("Rust\nTokio\nPostgres".to_string())),
    );
    let workflow = screening_workflow(&deps(documents(), generator)).unwrap();

    let report = FlowRuntime::new()
        .run(Arc::new(workflow), State::seeded(SEED_PROMPT))
        .await
        .unwrap();

    assert_eq!(report.entries(ROLE_AGENT), ["Rust Tokio Postgres"]);
}

#[tokio::test]
async fn test_failing_role_agent_still_reaches_aggregator() {
    init_tracing();
    let generator = Arc::new(
        ScriptedGenerator::new()
            .with_role_reply(Err(CapabilityError::Quota("rate limited".to_string()))),
    );
    let workflow = screening_workflow(&deps(documents(), Arc::clone(&generator))).unwrap();

    let report = FlowRuntime::new()
        .run(Arc::new(workflow), State::seeded(SEED_PROMPT))
        .await
        .unwrap();

    assert_eq!(report.events.len(), 4);
    let diagnostic = &report.entries(ROLE_AGENT)[0];
    assert!(diagnostic.starts_with("Error extracting job description:"));
    assert!(diagnostic.contains("rate limited"));

    let prompt = generator.aggregator_prompt().unwrap();
    let seen = findings(&prompt);
    assert!(seen.contains("FLAGS"));
    assert!(seen.contains("Error extracting job description:"));
    assert!(report.event(AGGREGATOR_AGENT).unwrap().delta.payload.is_some());
}

#[tokio::test]
async fn test_missing_role_description_becomes_diagnostic() {
    let store = InMemoryDocumentStore::new()
        .with_document(DocumentKind::CandidateDocument, "Jane Roe, Rust engineer");
    let generator = Arc::new(ScriptedGenerator::new());
    let workflow = screening_workflow(&deps(store, generator)).unwrap();

    let report = FlowRuntime::new()
        .run(Arc::new(workflow), State::seeded(SEED_PROMPT))
        .await
        .unwrap();

    let diagnostic = &report.entries(ROLE_AGENT)[0];
    assert!(diagnostic.starts_with("Error extracting job description:"));
    assert!(diagnostic.contains("role description"));
    assert_eq!(report.entries(RED_FLAG_AGENT), ["FLAGS"]);
}

#[tokio::test]
async fn test_missing_candidate_document_hits_every_agent() {
    let store = InMemoryDocumentStore::new()
        .with_document(DocumentKind::RoleDescription, "Senior Rust engineer");
    let generator = Arc::new(ScriptedGenerator::new());
    let workflow = screening_workflow(&deps(store, Arc::clone(&generator))).unwrap();

    let report = FlowRuntime::new()
        .run(Arc::new(workflow), State::seeded(SEED_PROMPT))
        .await
        .unwrap();

    assert!(report.entries(DOCUMENT_AGENT)[0].starts_with("Error extracting name:"));
    assert!(report.entries(RED_FLAG_AGENT)[0].starts_with("Error in redflag agent:"));
    assert!(report.entries(AGGREGATOR_AGENT)[0].starts_with("Error in recruit agent:"));
    assert_eq!(report.entries(ROLE_AGENT), ["ROLE"]);
    assert!(generator.aggregator_prompt().is_none());
}

#[tokio::test]
async fn test_unstructured_aggregator_reply_falls_back_to_text() {
    let generator = Arc::new(
        ScriptedGenerator::new().with_aggregator_reply("Solid match overall, I'd put it at 64/100."),
    );
    let workflow = screening_workflow(&deps(documents(), generator)).unwrap();

    let report = FlowRuntime::new()
        .run(Arc::new(workflow), State::seeded(SEED_PROMPT))
        .await
        .unwrap();

    let event = report.event(AGGREGATOR_AGENT).unwrap();
    let evaluation = Evaluation::from_payload(event.delta.payload.as_ref().unwrap()).unwrap();
    assert_eq!(evaluation.score, 64);
    assert!(evaluation.breakdown.is_none());
    assert!(!evaluation.verdict(75).shortlisted);
    assert!(report.entries(AGGREGATOR_AGENT)[0].contains("Solid match overall"));
}

#[tokio::test]
async fn test_screening_spec_builds_through_registry() {
    let generator = Arc::new(ScriptedGenerator::new());
    let mut registry = NodeRegistry::new();
    register_all(&mut registry, &deps(documents(), generator));
    assert_eq!(registry.list_node_kinds().len(), 4);

    let runtime = FlowRuntime::with_registry(Arc::new(registry), RuntimeConfig::default());
    let workflow = runtime.load_workflow(&screening_spec()).await.unwrap();
    assert_eq!(workflow.entry(), Some(DOCUMENT_AGENT));
    assert_eq!(workflow.terminal_nodes(), vec![AGGREGATOR_AGENT]);

    let report = runtime
        .execute_workflow("candidate-screening", State::seeded(SEED_PROMPT))
        .await
        .unwrap()
        .collect_report()
        .await
        .unwrap();
    assert_eq!(report.events.len(), 4);
}

/// Warnings the aggregator emitted during a finished run.
fn aggregator_warnings(events: &mut broadcast::Receiver<ExecutionEvent>) -> Vec<String> {
    let mut warnings = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ExecutionEvent::NodeEvent {
            node,
            event: NodeEvent::Warning { message },
            ..
        } = event
        {
            if node == AGGREGATOR_AGENT {
                warnings.push(message);
            }
        }
    }
    warnings
}

#[tokio::test]
async fn test_json_without_breakdown_is_not_reported_as_unstructured() {
    let generator =
        Arc::new(ScriptedGenerator::new().with_aggregator_reply(r#"{"score": 70, "summary": "Fair"}"#));
    let workflow = screening_workflow(&deps(documents(), generator)).unwrap();
    let runtime = FlowRuntime::new();
    let mut events = runtime.subscribe_events();

    let report = runtime
        .run(Arc::new(workflow), State::seeded(SEED_PROMPT))
        .await
        .unwrap();

    let event = report.event(AGGREGATOR_AGENT).unwrap();
    let evaluation = Evaluation::from_payload(event.delta.payload.as_ref().unwrap()).unwrap();
    assert_eq!(evaluation.score, 70);
    assert!(evaluation.breakdown.is_none());
    assert!(aggregator_warnings(&mut events).is_empty());
}

#[tokio::test]
async fn test_prose_reply_is_reported_as_unstructured() {
    let generator = Arc::new(ScriptedGenerator::new().with_aggregator_reply("Roughly 40/100."));
    let workflow = screening_workflow(&deps(documents(), generator)).unwrap();
    let runtime = FlowRuntime::new();
    let mut events = runtime.subscribe_events();

    runtime
        .run(Arc::new(workflow), State::seeded(SEED_PROMPT))
        .await
        .unwrap();

    assert_eq!(aggregator_warnings(&mut events).len(), 1);
}
