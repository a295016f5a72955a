use serde::{Deserialize, Serialize};

/// Key under which the accumulated entries are serialized.
pub const MESSAGES_KEY: &str = "messages";

/// Shared accumulator carried across a workflow run.
///
/// State only ever grows: entries contributed by a node are appended and never
/// rewritten. The executor owns the only mutable copy; nodes receive snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub messages: Vec<String>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed state holding a single entry.
    pub fn seeded(entry: impl Into<String>) -> Self {
        Self {
            messages: vec![entry.into()],
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }

    /// Append a delta's entries in the delta's own order. Only the executor
    /// merges; nodes return deltas instead.
    pub fn merge(&mut self, delta: &StateDelta) {
        self.messages.extend(delta.entries.iter().cloned());
    }
}

impl From<Vec<String>> for State {
    fn from(messages: Vec<String>) -> Self {
        Self { messages }
    }
}

/// Contribution a node makes to the state when it completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    /// Entries appended to `State::messages`.
    pub entries: Vec<String>,

    /// Structured result attached to the event only; never merged into state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl StateDelta {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entry(text: impl Into<String>) -> Self {
        Self {
            entries: vec![text.into()],
            payload: None,
        }
    }

    pub fn with_entry(mut self, text: impl Into<String>) -> Self {
        self.entries.push(text.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn first(&self) -> Option<&str> {
        self.entries.first().map(String::as_str)
    }
}
