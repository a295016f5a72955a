// crates/screennodes/tests/capabilities_test.rs

use async_trait::async_trait;
use screencore::{DocumentKind, DocumentStore, NodeError};
use screennodes::{
    extract_score, notify_if_shortlisted, CategoryScores, Evaluation, FileDocumentStore,
    InMemoryDocumentStore, Invitation, LlmConfig, LogNotifier, NotificationOutcome, Notifier, WebhookNotifier,
};
use std::sync::Mutex;

#[test]
fn test_evaluation_parses_json_inside_prose() {
    let response = "Sure!\n```json\n{\"score\": 71, \"breakdown\": {\"skills\": 20, \"experience\": 35, \"education\": 10, \"extras\": 6}, \"summary\": \"Good fit.\", \"recommendation\": \"Internship.\"}\n```";
    let evaluation = Evaluation::parse(response);

    assert_eq!(evaluation.score, 71);
    assert_eq!(evaluation.breakdown.unwrap().experience, 35);
    assert_eq!(evaluation.summary.as_deref(), Some("Good fit."));
    assert_eq!(evaluation.recommendation.as_deref(), Some("Internship."));
}

#[test]
fn test_evaluation_falls_back_to_prose() {
    let evaluation = Evaluation::parse("Total score: 58. Lacks production Rust.");
    assert_eq!(evaluation.score, 58);
    assert!(evaluation.breakdown.is_none());
    assert_eq!(
        evaluation.summary.as_deref(),
        Some("Total score: 58. Lacks production Rust.")
    );
}

#[test]
fn test_evaluation_clamps_score() {
    assert_eq!(Evaluation::parse(r#"{"score": 140}"#).score, 100);
}

#[test]
fn test_oversized_breakdown_is_capped_per_category() {
    let evaluation = Evaluation::parse(
        r#"{"score": 90, "breakdown": {"skills": 4294967295, "experience": 1, "education": 99, "extras": 4294967295}}"#,
    );
    let breakdown = evaluation.breakdown.unwrap();

    assert_eq!(breakdown.skills, 30);
    assert_eq!(breakdown.education, 10);
    assert_eq!(breakdown.extras, 10);
    assert_eq!(breakdown.total(), 51);
}

#[test]
fn test_category_total_saturates() {
    let scores = CategoryScores {
        skills: u32::MAX,
        experience: 1,
        education: 0,
        extras: 0,
    };
    assert_eq!(scores.total(), u32::MAX);
}

#[test]
fn test_json_and_prose_readers_are_distinct() {
    assert!(Evaluation::from_json(r#"{"score": 70}"#).is_some());
    assert!(Evaluation::from_json("Score: 70").is_none());
    assert_eq!(Evaluation::from_prose("Score: 70").score, 70);
}

#[test]
fn test_evaluation_payload_round_trip() {
    let evaluation = Evaluation::parse(r#"{"score": 90, "summary": "Great"}"#);
    assert_eq!(Evaluation::from_payload(&evaluation.to_payload()), Some(evaluation));
}

#[test]
fn test_evaluation_display() {
    let evaluation = Evaluation::parse(
        r#"{"score": 82, "breakdown": {"skills": 25, "experience": 40, "education": 10, "extras": 7}}"#,
    );
    assert_eq!(
        evaluation.to_string(),
        "Score: 82/100 (skills 25/30, experience 40/50, education 10/10, extras 7/10)"
    );
}

#[test]
fn test_extract_score_patterns() {
    assert_eq!(extract_score("Overall: 77 / 100 with good skills"), 77);
    assert_eq!(extract_score("Score - 45 points"), 45);
    // the out-of-100 form wins over a labelled one
    assert_eq!(extract_score("score 3 ... final 88/100"), 88);
    assert_eq!(extract_score("no numbers here"), 0);
}

#[test]
fn test_verdict_threshold_is_inclusive() {
    let evaluation = Evaluation::parse(r#"{"score": 75}"#);
    assert!(evaluation.verdict(75).shortlisted);
    assert!(!evaluation.verdict(76).shortlisted);
    assert_eq!(evaluation.verdict(75).threshold, 75);
}

#[test]
fn test_llm_config_defaults() {
    let config: LlmConfig = serde_json::from_str(r#"{"model": "llama3"}"#).unwrap();
    assert_eq!(config.model, "llama3");
    assert_eq!(config.api_key_env, "GROQ_API_KEY");
    assert_eq!(config.base_url, "https://api.groq.com/openai/v1");
}

#[tokio::test]
async fn test_in_memory_store_rejects_blank_documents() {
    let store = InMemoryDocumentStore::new()
        .with_document(DocumentKind::CandidateDocument, "Jane Roe")
        .with_document(DocumentKind::RoleDescription, "   ");

    assert_eq!(
        store.read_document(DocumentKind::CandidateDocument).await.unwrap(),
        "Jane Roe"
    );
    match store.read_document(DocumentKind::RoleDescription).await {
        Err(NodeError::DocumentUnavailable(kind)) => assert_eq!(kind, "role description"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn test_file_store_reads_and_reports_missing() {
    let dir = tempfile::tempdir().unwrap();
    let resume = dir.path().join("resume.txt");
    let empty = dir.path().join("role.txt");
    std::fs::write(&resume, "Jane Roe\nRust engineer").unwrap();
    std::fs::write(&empty, "").unwrap();

    let store = FileDocumentStore::new()
        .with_path(DocumentKind::CandidateDocument, &resume)
        .with_path(DocumentKind::RoleDescription, &empty);

    assert_eq!(
        store.read_document(DocumentKind::CandidateDocument).await.unwrap(),
        "Jane Roe\nRust engineer"
    );
    assert!(matches!(
        store.read_document(DocumentKind::RoleDescription).await,
        Err(NodeError::DocumentUnavailable(_))
    ));

    let unconfigured = FileDocumentStore::new();
    assert!(matches!(
        unconfigured.read_document(DocumentKind::CandidateDocument).await,
        Err(NodeError::DocumentUnavailable(_))
    ));
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Invitation>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, invitation: &Invitation) -> NotificationOutcome {
        self.sent.lock().unwrap().push(invitation.clone());
        NotificationOutcome::Sent
    }
}

#[tokio::test]
async fn test_notification_only_for_shortlisted_with_recipient() {
    let notifier = RecordingNotifier::default();
    let strong = Evaluation::parse(r#"{"score": 82}"#).verdict(75);
    let weak = Evaluation::parse(r#"{"score": 60}"#).verdict(75);

    assert!(notify_if_shortlisted(&notifier, &weak, Some("jane@example.com"), "Jane")
        .await
        .is_none());
    assert!(notify_if_shortlisted(&notifier, &strong, None, "Jane").await.is_none());
    assert!(notify_if_shortlisted(&notifier, &strong, Some(" "), "Jane").await.is_none());

    let outcome = notify_if_shortlisted(&notifier, &strong, Some("jane@example.com"), "Jane")
        .await
        .unwrap();
    assert!(outcome.is_sent());

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "jane@example.com");
    assert!(sent[0].body().starts_with("Hi Jane,"));
    assert!(sent[0].body().contains("match score of 82/100"));
}

#[tokio::test]
async fn test_log_notifier_always_sends() {
    let invitation = Invitation::new("jane@example.com", "Jane", 90);
    assert_eq!(LogNotifier.notify(&invitation).await, NotificationOutcome::Sent);
    assert_eq!(invitation.subject(), "Interview Invitation - Shortlisted for the Role");
}

#[tokio::test]
async fn test_webhook_notifier_requires_recipient() {
    let notifier = WebhookNotifier::new("http://127.0.0.1:9/hook");
    let outcome = notifier.notify(&Invitation::new("", "Jane", 90)).await;
    assert_eq!(
        outcome,
        NotificationOutcome::Failed("Candidate email is missing.".to_string())
    );
}
