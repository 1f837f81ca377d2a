use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use crate::error::{PexError, Result};
use crate::pipeline::{
    DetailLevel, Enhancer, ExportSink, StructuredPrompt, UploadReceipt, UploadRequest,
};
use crate::rules::Platform;

/// 2024-01-15T10:30:00Z, the clock used by deterministic rendering tests.
#[must_use]
pub fn fixed_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
        .single()
        .unwrap_or_default()
}

/// Isolated directory tree for batch source tests.
pub struct SourceFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl SourceFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {:?}", root);

        Self { temp_dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a file (and its parent directories) under the root.
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }
}

impl Default for SourceFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SourceFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.root);
    }
}

/// Enhancer that always errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingEnhancer;

#[async_trait]
impl Enhancer for FailingEnhancer {
    fn name(&self) -> &str {
        "failing"
    }

    async fn enhance(
        &self,
        _prompt: &StructuredPrompt,
        _platform: Platform,
        _level: DetailLevel,
    ) -> Result<StructuredPrompt> {
        Err(PexError::EnhancementFailed("service unavailable".to_string()))
    }
}

/// Enhancer that sleeps before answering, for timeout tests.
#[derive(Debug, Clone, Copy)]
pub struct SlowEnhancer {
    pub delay: Duration,
}

#[async_trait]
impl Enhancer for SlowEnhancer {
    fn name(&self) -> &str {
        "slow"
    }

    async fn enhance(
        &self,
        prompt: &StructuredPrompt,
        _platform: Platform,
        _level: DetailLevel,
    ) -> Result<StructuredPrompt> {
        tokio::time::sleep(self.delay).await;
        Ok(prompt.clone())
    }
}

/// Sink that errors on every upload.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSink;

#[async_trait]
impl ExportSink for FailingSink {
    async fn upload(&self, _request: UploadRequest) -> Result<UploadReceipt> {
        Err(PexError::SinkFailed("storage offline".to_string()))
    }
}

/// Sink that answers but reports `success: false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectingSink;

#[async_trait]
impl ExportSink for RejectingSink {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt> {
        Ok(UploadReceipt {
            location_url: format!("rejected://{}", request.file_name),
            success: false,
        })
    }
}
