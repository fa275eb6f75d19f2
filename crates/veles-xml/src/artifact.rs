//! Filesystem artifact persistence.

use std::path::PathBuf;

use async_trait::async_trait;
use veles_export::{ArtifactRef, ArtifactSink, ExportError};

/// Persists artifacts as files in one output directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Sink writing into `dir`, which is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactSink for FileSink {
    async fn save(&self, name: &str, content: &str) -> veles_export::Result<ArtifactRef> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ExportError::Persistence(format!("{}: {}", self.dir.display(), e)))?;

        let path = self.dir.join(name);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ExportError::Persistence(format!("{}: {}", path.display(), e)))?;

        Ok(ArtifactRef {
            name: name.to_string(),
            location: path.display().to_string(),
        })
    }
}
