//! Export sinks: where rendered files go.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{PexError, Result};

/// A rendered file handed to a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub file_name: String,
    pub content: Vec<u8>,
    pub mime_type: String,
    pub metadata: Option<Value>,
}

/// What a sink reports back. `success == false` fails the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub location_url: String,
    pub success: bool,
}

/// Storage collaborator for finished exports.
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt>;
}

/// Keeps uploads in memory. Used by tests and the dry-run CLI path.
#[derive(Debug, Default)]
pub struct MemorySink {
    uploads: Mutex<Vec<UploadRequest>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything uploaded so far.
    #[must_use]
    pub fn uploads(&self) -> Vec<UploadRequest> {
        self.uploads.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.uploads.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uploads.lock().is_empty()
    }
}

#[async_trait]
impl ExportSink for MemorySink {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt> {
        let location_url = format!("memory://exports/{}", request.file_name);
        self.uploads.lock().push(request);
        Ok(UploadReceipt {
            location_url,
            success: true,
        })
    }
}

/// Writes uploads into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ExportSink for FileSink {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt> {
        let file_name = Path::new(&request.file_name)
            .file_name()
            .ok_or_else(|| PexError::InvalidInput(format!("invalid file name '{}'", request.file_name)))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, &request.content).await?;
        debug!(path = %path.display(), bytes = request.content.len(), "wrote export file");

        let absolute = std::path::absolute(&path)?;
        Ok(UploadReceipt {
            location_url: format!("file://{}", absolute.display()),
            success: true,
        })
    }
}
