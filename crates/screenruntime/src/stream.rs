use crate::executor::Scheduler;
use futures::stream::{Stream, StreamExt};
use screencore::{ExecutionId, FlowError, State, StateDelta};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};

/// One node's completion, as seen by the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEvent {
    pub node: String,
    pub delta: StateDelta,
    pub duration_ms: u64,
    /// Set when the node failed and the run is configured to mark degradation.
    pub degraded: bool,
}

/// Single-pass sequence of result events for one run.
///
/// Dropping the stream before it ends is allowed: running nodes are aborted
/// and nothing further is dispatched.
pub struct ResultStream {
    execution_id: ExecutionId,
    scheduler: Option<Scheduler>,
    final_state: Option<State>,
    degraded: bool,
}

impl ResultStream {
    pub(crate) fn new(scheduler: Scheduler) -> Self {
        Self {
            execution_id: scheduler.execution_id(),
            scheduler: Some(scheduler),
            final_state: None,
            degraded: false,
        }
    }

    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    /// Current state of the run; the final state once the stream has ended.
    pub fn state(&self) -> Option<&State> {
        match &self.scheduler {
            Some(scheduler) => Some(scheduler.state()),
            None => self.final_state.as_ref(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.scheduler.is_none()
    }

    /// Drain the stream into a report.
    pub async fn collect_report(mut self) -> Result<RunReport, FlowError> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event?);
        }

        Ok(RunReport {
            execution_id: self.execution_id,
            events,
            state: self.final_state.take().unwrap_or_default(),
            degraded: self.degraded,
        })
    }

    fn close(&mut self) {
        if let Some(mut scheduler) = self.scheduler.take() {
            self.degraded = scheduler.is_degraded();
            self.final_state = Some(scheduler.take_state());
        }
    }
}

impl Stream for ResultStream {
    type Item = Result<ResultEvent, FlowError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(scheduler) = this.scheduler.as_mut() else {
            return Poll::Ready(None);
        };

        match scheduler.poll_next_event(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(event))) => Poll::Ready(Some(Ok(event))),
            Poll::Ready(Some(Err(error))) => {
                this.close();
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                this.close();
                Poll::Ready(None)
            }
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub execution_id: ExecutionId,
    /// Events in emission order
    pub events: Vec<ResultEvent>,
    pub state: State,
    pub degraded: bool,
}

impl RunReport {
    pub fn event(&self, node: &str) -> Option<&ResultEvent> {
        self.events.iter().find(|e| e.node == node)
    }

    /// Node names in the order their events were emitted.
    pub fn completion_order(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.node.as_str()).collect()
    }

    pub fn entries(&self, node: &str) -> &[String] {
        self.event(node)
            .map(|e| e.delta.entries.as_slice())
            .unwrap_or(&[])
    }
}
