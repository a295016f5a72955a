//! One screening run: stream node results, derive the verdict, invite.

use anyhow::Result;
use futures::StreamExt;
use screencore::{ExecutionEvent, NodeEvent, State, Workflow};
use screennodes::{
    notify_if_shortlisted, Evaluation, NotificationOutcome, Notifier, Verdict, AGGREGATOR_AGENT,
    DOCUMENT_AGENT, SEED_PROMPT,
};
use screenruntime::{FlowRuntime, ResultEvent};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

#[derive(Debug, Clone)]
pub struct ScreeningOptions {
    pub threshold: u32,
    pub recipient: Option<String>,
    /// Overrides the name extracted by the document agent
    pub candidate_name: Option<String>,
}

#[derive(Debug)]
pub struct ScreeningOutcome {
    pub events: Vec<ResultEvent>,
    pub evaluation: Evaluation,
    /// False when the score had to be recovered from text
    pub structured: bool,
    pub verdict: Verdict,
    pub candidate_name: String,
    /// `None` when no invitation was attempted
    pub notification: Option<NotificationOutcome>,
}

/// Run `workflow` to completion, calling `on_event` for each node result as
/// it arrives.
///
/// A failed aggregator does not fail the run: its diagnostic text is scored
/// like any unstructured reply, which normally yields 0.
pub async fn screen<F>(
    runtime: &FlowRuntime,
    workflow: Arc<Workflow>,
    options: &ScreeningOptions,
    notifier: &dyn Notifier,
    mut on_event: F,
) -> Result<ScreeningOutcome>
where
    F: FnMut(&ResultEvent),
{
    let mut stream = runtime.execute(workflow, State::seeded(SEED_PROMPT))?;
    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        let event = event?;
        on_event(&event);
        events.push(event);
    }

    let (evaluation, structured) = evaluate_events(&events);
    if !structured {
        tracing::warn!(score = evaluation.score, "No structured evaluation, score taken from text");
    }
    let verdict = evaluation.verdict(options.threshold);

    let candidate_name = options
        .candidate_name
        .clone()
        .or_else(|| extracted_name(&events))
        .unwrap_or_else(|| "Candidate".to_string());
    let notification =
        notify_if_shortlisted(notifier, &verdict, options.recipient.as_deref(), &candidate_name)
            .await;

    Ok(ScreeningOutcome {
        events,
        evaluation,
        structured,
        verdict,
        candidate_name,
        notification,
    })
}

/// The run's evaluation and whether it came from a structured payload.
///
/// Without a payload the aggregator's entry (or, for workflows without an
/// aggregator, the last node's) is parsed as text.
pub fn evaluate_events(events: &[ResultEvent]) -> (Evaluation, bool) {
    if let Some(evaluation) = events
        .iter()
        .rev()
        .find_map(|e| e.delta.payload.as_ref().and_then(Evaluation::from_payload))
    {
        return (evaluation, true);
    }

    let text = events
        .iter()
        .find(|e| e.node == AGGREGATOR_AGENT)
        .or_else(|| events.last())
        .map(|e| e.delta.entries.join("\n"))
        .unwrap_or_default();
    (Evaluation::parse(&text), false)
}

/// First line of the document agent's output, unless that agent failed.
pub fn extracted_name(events: &[ResultEvent]) -> Option<String> {
    events
        .iter()
        .find(|e| e.node == DOCUMENT_AGENT)
        .and_then(|e| e.delta.first())
        .filter(|text| !text.starts_with("Error extracting name"))
        .and_then(|text| text.lines().find(|l| !l.trim().is_empty()))
        .map(|l| l.trim().to_string())
}

/// Log node progress from the event bus until the run completes or the bus
/// closes. Returns the number of events handled.
pub async fn log_progress(mut events: broadcast::Receiver<ExecutionEvent>) -> usize {
    let mut handled = 0;
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Progress log lagged behind");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        handled += 1;

        let node = event.node().unwrap_or_default();
        match &event {
            ExecutionEvent::NodeStarted { .. } => tracing::debug!(node, "Node started"),
            ExecutionEvent::NodeFailed { error, .. } => {
                tracing::warn!(node, "Node failed: {}", error)
            }
            ExecutionEvent::NodeEvent { event: progress, .. } => match progress {
                NodeEvent::Info { .. } => tracing::info!(node, "{}", progress.message()),
                NodeEvent::Warning { .. } => tracing::warn!(node, "{}", progress.message()),
            },
            _ => {}
        }
        if event.is_terminal() {
            break;
        }
    }
    handled
}
