use crate::{CapabilityError, NodeError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which document a node asks the store for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    CandidateDocument,
    RoleDescription,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::CandidateDocument => write!(f, "candidate document"),
            DocumentKind::RoleDescription => write!(f, "role description"),
        }
    }
}

/// Source of raw document text.
///
/// Reads are expected to be fast and local. A missing document is reported as
/// `NodeError::DocumentUnavailable`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read_document(&self, kind: DocumentKind) -> Result<String, NodeError>;
}

/// Opaque text-generation backend.
///
/// One call per invocation; callers do not retry. Any timeout is the
/// backend's own concern.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CapabilityError>;
}
