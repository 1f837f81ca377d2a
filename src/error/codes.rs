//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Input errors (rejected before or at pipeline entry)
//! - 2xx: Pipeline stage errors
//! - 3xx: Config errors
//! - 5xx: External collaborator errors (enhancer, sink, document source)
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for JSON output and HTTP error mapping.
///
/// Each variant maps to a numeric code (e.g., `EmptyContent` -> E101).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Input errors (1xx)
    // ========================================
    /// E101: Source content is empty after trimming
    EmptyContent,
    /// E102: Platform identifier is not in the rule tables
    UnsupportedPlatform,
    /// E103: Export format identifier is not supported
    UnsupportedFormat,
    /// E104: Request shape or field value is invalid
    InvalidInput,

    // ========================================
    // Pipeline errors (2xx)
    // ========================================
    /// E201: Enhancement failed (recoverable, pipeline continues)
    EnhancementFailed,
    /// E202: Rendering a prompt into the export format failed
    RenderFailed,
    /// E203: Serialization/deserialization failed
    SerializationError,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E301: Config file has invalid syntax or values
    ConfigInvalid,
    /// E302: Config directory could not be located
    ConfigNotFound,

    // ========================================
    // External errors (5xx)
    // ========================================
    /// E501: Export sink rejected or failed the upload
    SinkFailed,
    /// E502: A bounded external call timed out
    Timeout,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E901: Unexpected internal error
    InternalError,
    /// E902: Requested resource was not found
    NotFound,
    /// E903: IO operation failed
    IoError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `EmptyContent` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::EmptyContent => 101,
            Self::UnsupportedPlatform => 102,
            Self::UnsupportedFormat => 103,
            Self::InvalidInput => 104,

            Self::EnhancementFailed => 201,
            Self::RenderFailed => 202,
            Self::SerializationError => 203,

            Self::ConfigInvalid => 301,
            Self::ConfigNotFound => 302,

            Self::SinkFailed => 501,
            Self::Timeout => 502,

            Self::InternalError => 901,
            Self::NotFound => 902,
            Self::IoError => 903,
        }
    }

    /// Get the error code as a formatted string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::EmptyContent => "Provide non-empty source content to export",
            Self::UnsupportedPlatform => {
                "Run `promptex platforms` to list supported platform identifiers"
            }
            Self::UnsupportedFormat => "Run `promptex formats` to list supported export formats",
            Self::InvalidInput => "Check the request fields against the documented shape",
            Self::EnhancementFailed => {
                "Enhancement is optional; retry later or export without --enhance"
            }
            Self::RenderFailed => "The prompt could not be rendered. Try another export format",
            Self::SerializationError => "The data format may be corrupted. Check input data for validity",
            Self::ConfigInvalid => "Check TOML syntax in the config file and PROMPTEX_* variables",
            Self::ConfigNotFound => "Pass --config <path> or set PROMPTEX_CONFIG",
            Self::SinkFailed => "Check that the export destination is writable and reachable",
            Self::Timeout => "Operation timed out. Try again or increase the timeout settings",
            Self::InternalError => "An unexpected error occurred. Please report this issue with full error output",
            Self::NotFound => "The requested resource was not found. Check the path or identifier",
            Self::IoError => "File operation failed. Check path exists and permissions are correct",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::EmptyContent
            | Self::UnsupportedPlatform
            | Self::UnsupportedFormat
            | Self::InvalidInput
            | Self::EnhancementFailed
            | Self::ConfigInvalid
            | Self::ConfigNotFound
            | Self::SinkFailed
            | Self::Timeout
            | Self::NotFound
            | Self::IoError => true,

            Self::RenderFailed | Self::SerializationError | Self::InternalError => false,
        }
    }

    /// Whether the caller sent something the pipeline refuses to process.
    ///
    /// The HTTP layer answers these with 400.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        self.numeric() / 100 == 1
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "input",
            2 => "pipeline",
            3 => "config",
            5 => "external",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::EmptyContent,
            Self::UnsupportedPlatform,
            Self::UnsupportedFormat,
            Self::InvalidInput,
            Self::EnhancementFailed,
            Self::RenderFailed,
            Self::SerializationError,
            Self::ConfigInvalid,
            Self::ConfigNotFound,
            Self::SinkFailed,
            Self::Timeout,
            Self::InternalError,
            Self::NotFound,
            Self::IoError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
