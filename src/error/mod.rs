//! Error handling for promptex.
//!
//! This module provides:
//! - [`PexError`]: The main error enum for all pipeline operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Serializable error with code, category and suggestion

mod codes;
mod suggestions;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;
pub use suggestions::{suggest_for_error, suggest_similar};

/// Main error type for promptex operations.
#[derive(Error, Debug)]
pub enum PexError {
    #[error("Content is empty")]
    EmptyContent,

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Enhancement failed: {0}")]
    EnhancementFailed(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Export sink failed: {0}")]
    SinkFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PexError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyContent => ErrorCode::EmptyContent,
            Self::UnsupportedPlatform(_) => ErrorCode::UnsupportedPlatform,
            Self::UnsupportedFormat(_) => ErrorCode::UnsupportedFormat,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::EnhancementFailed(_) => ErrorCode::EnhancementFailed,
            Self::Render(_) => ErrorCode::RenderFailed,
            Self::SinkFailed(_) => ErrorCode::SinkFailed,
            Self::Timeout(_) => ErrorCode::Timeout,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) | Self::Yaml(_) => ErrorCode::SerializationError,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::UnsupportedPlatform(id) => Some(serde_json::json!({ "platform": id })),
            Self::UnsupportedFormat(id) => Some(serde_json::json!({ "format": id })),
            Self::NotFound(what) => Some(serde_json::json!({ "resource": what })),
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_pex_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
///
/// Printed by the CLI in JSON output mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "EMPTY_CONTENT")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 101)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the user
    pub recoverable: bool,

    /// Error category (e.g., "input", "config", "external")
    pub category: String,
}

impl StructuredError {
    /// Create a new structured error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    /// Create a structured error from a [`PexError`].
    #[must_use]
    pub fn from_pex_error(err: &PexError) -> Self {
        let code = err.code();
        let context = err.context();
        let mut structured = Self::new(code, err.to_string());
        structured.suggestion = suggest_for_error(code, context.as_ref());
        structured.context = context;
        structured
    }

    /// Add context to this error.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<PexError> for StructuredError {
    fn from(err: PexError) -> Self {
        Self::from_pex_error(&err)
    }
}

impl From<&PexError> for StructuredError {
    fn from(err: &PexError) -> Self {
        Self::from_pex_error(err)
    }
}

/// Result type alias using [`PexError`].
pub type Result<T> = std::result::Result<T, PexError>;
