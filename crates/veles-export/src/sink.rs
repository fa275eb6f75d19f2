//! Artifact persistence interface.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;

/// Reference to a stored artifact, as reported back to the invoker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// Artifact name as passed to `save`.
    pub name: String,
    /// Collaborator-specific location (a path, a blob hash, ...).
    pub location: String,
}

/// Persistence collaborator: stores one serialized document per call.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Store `content` under `name`, returning a reference to the stored
    /// artifact.
    async fn save(&self, name: &str, content: &str) -> Result<ArtifactRef>;
}

/// In-memory sink for tests and embedders that post-process the documents
/// themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored artifacts, in save order.
    pub fn artifacts(&self) -> Vec<(String, String)> {
        self.artifacts.lock().expect("sink lock poisoned").clone()
    }

    /// Whether nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.artifacts.lock().expect("sink lock poisoned").is_empty()
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn save(&self, name: &str, content: &str) -> Result<ArtifactRef> {
        self.artifacts
            .lock()
            .expect("sink lock poisoned")
            .push((name.to_string(), content.to_string()));
        Ok(ArtifactRef {
            name: name.to_string(),
            location: format!("memory://{}", name),
        })
    }
}
