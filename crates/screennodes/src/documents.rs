use async_trait::async_trait;
use screencore::{DocumentKind, DocumentStore, NodeError};
use std::collections::HashMap;
use std::path::PathBuf;

/// Documents held in memory, e.g. pasted text.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: HashMap<DocumentKind, String>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, kind: DocumentKind, text: impl Into<String>) -> Self {
        self.insert(kind, text);
        self
    }

    pub fn insert(&mut self, kind: DocumentKind, text: impl Into<String>) {
        self.documents.insert(kind, text.into());
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn read_document(&self, kind: DocumentKind) -> Result<String, NodeError> {
        self.documents
            .get(&kind)
            .filter(|text| !text.trim().is_empty())
            .cloned()
            .ok_or_else(|| NodeError::DocumentUnavailable(kind.to_string()))
    }
}

/// Documents read from plain-text files on each request.
#[derive(Debug, Clone, Default)]
pub struct FileDocumentStore {
    paths: HashMap<DocumentKind, PathBuf>,
}

impl FileDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, kind: DocumentKind, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(kind, path.into());
        self
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn read_document(&self, kind: DocumentKind) -> Result<String, NodeError> {
        let path = self
            .paths
            .get(&kind)
            .ok_or_else(|| NodeError::DocumentUnavailable(format!("no path configured for {}", kind)))?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            NodeError::DocumentUnavailable(format!("{} at {}: {}", kind, path.display(), e))
        })?;

        // invalid UTF-8 is replaced rather than rejected
        let text = String::from_utf8_lossy(&bytes).into_owned();
        if text.trim().is_empty() {
            return Err(NodeError::DocumentUnavailable(format!(
                "{} at {} is empty",
                kind,
                path.display()
            )));
        }

        tracing::debug!(kind = %kind, path = %path.display(), chars = text.len(), "Read document");
        Ok(text)
    }
}
