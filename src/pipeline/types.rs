//! Data model shared by the pipeline stages.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PexError;
use crate::rules::{ExportFormat, Platform};

/// Free-form metadata attached to a prompt: scalars, sequences or nested
/// mappings, keyed by name.
pub type Metadata = serde_json::Map<String, Value>;

/// How raw source content should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Text,
    Document,
    Structured,
}

impl SourceKind {
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Document => "document",
            Self::Structured => "structured",
        }
    }
}

impl FromStr for SourceKind {
    type Err = PexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "document" | "doc" | "markdown" => Ok(Self::Document),
            "structured" | "json" | "yaml" => Ok(Self::Structured),
            other => Err(PexError::InvalidInput(format!("unknown source type '{other}'"))),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Unprocessed input as received from a caller or document source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInput {
    pub content: String,
    pub source_kind: SourceKind,
}

impl RawInput {
    pub fn new(content: impl Into<String>, source_kind: SourceKind) -> Self {
        Self {
            content: content.into(),
            source_kind,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(content, SourceKind::Text)
    }
}

/// Keyword hits extracted from a prompt, one set per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Components {
    pub subjects: BTreeSet<String>,
    pub styles: BTreeSet<String>,
    pub qualities: BTreeSet<String>,
    pub settings: BTreeSet<String>,
}

impl Components {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
            && self.styles.is_empty()
            && self.qualities.is_empty()
            && self.settings.is_empty()
    }

    /// Write each category into `metadata` as an array under its own key.
    pub fn write_into(&self, metadata: &mut Metadata) {
        for (key, set) in [
            ("styles", &self.styles),
            ("qualities", &self.qualities),
            ("subjects", &self.subjects),
            ("settings", &self.settings),
        ] {
            metadata.insert(
                key.to_string(),
                Value::Array(set.iter().cloned().map(Value::String).collect()),
            );
        }
    }
}

/// A prompt after parsing (and optionally enhancement).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredPrompt {
    pub content: String,
    pub components: Components,
    pub metadata: Metadata,
}

/// A prompt rewritten for one platform, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapedPrompt {
    pub content: String,
    pub metadata: Metadata,
    pub platform: Platform,
}

/// Enhancement intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Basic,
    #[default]
    Standard,
    Detailed,
}

impl DetailLevel {
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Standard => "standard",
            Self::Detailed => "detailed",
        }
    }
}

impl FromStr for DetailLevel {
    type Err = PexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "standard" => Ok(Self::Standard),
            "detailed" => Ok(Self::Detailed),
            other => Err(PexError::InvalidInput(format!("unknown detail level '{other}'"))),
        }
    }
}

/// Tri-state validation outcome, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    #[default]
    Valid,
    Warning,
    Error,
}

/// Result of checking a prompt against a platform profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub status: ValidationStatus,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub message: String,
}

/// One serialized export file, ready for a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedExport {
    pub file_name: String,
    pub mime_type: String,
    pub content: String,
    pub size_bytes: usize,
    pub format: ExportFormat,
    pub platform: Platform,
}

/// Per-item result reported back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedPrompt {
    pub id: String,
    pub original_content: String,
    pub content: String,
    pub platform: Platform,
    pub format: ExportFormat,
    pub validation: ValidationVerdict,
    pub metadata: Metadata,
    pub enhanced: bool,
}

/// Status counts across all items of one export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub total_prompts: usize,
    pub valid_prompts: usize,
    pub warning_prompts: usize,
    pub error_prompts: usize,
}

impl ExportSummary {
    pub fn record(&mut self, status: ValidationStatus) {
        self.total_prompts += 1;
        match status {
            ValidationStatus::Valid => self.valid_prompts += 1,
            ValidationStatus::Warning => self.warning_prompts += 1,
            ValidationStatus::Error => self.error_prompts += 1,
        }
    }
}

/// Everything an export call produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub exported_prompts: Vec<ProcessedPrompt>,
    pub summary: ExportSummary,
    pub export_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_status_orders_by_severity() {
        assert!(ValidationStatus::Valid < ValidationStatus::Warning);
        assert!(ValidationStatus::Warning < ValidationStatus::Error);
        assert_eq!(
            ValidationStatus::Error.max(ValidationStatus::Warning),
            ValidationStatus::Error
        );
    }

    #[test]
    fn summary_counts_every_status() {
        let mut summary = ExportSummary::default();
        for status in [
            ValidationStatus::Valid,
            ValidationStatus::Error,
            ValidationStatus::Warning,
            ValidationStatus::Valid,
        ] {
            summary.record(status);
        }
        assert_eq!(summary.total_prompts, 4);
        assert_eq!(summary.valid_prompts, 2);
        assert_eq!(summary.warning_prompts, 1);
        assert_eq!(summary.error_prompts, 1);
    }

    #[test]
    fn summary_serializes_camel_case() {
        let json = serde_json::to_value(ExportSummary::default()).unwrap();
        assert!(json.get("totalPrompts").is_some());
        assert!(json.get("errorPrompts").is_some());
    }

    #[test]
    fn source_kind_parses_aliases() {
        assert_eq!("JSON".parse::<SourceKind>().unwrap(), SourceKind::Structured);
        assert_eq!("markdown".parse::<SourceKind>().unwrap(), SourceKind::Document);
        assert!("spreadsheet".parse::<SourceKind>().is_err());
    }

    #[test]
    fn components_write_into_metadata() {
        let mut components = Components::default();
        components.styles.insert("cinematic".into());
        let mut metadata = Metadata::new();
        components.write_into(&mut metadata);

        assert_eq!(metadata["styles"], serde_json::json!(["cinematic"]));
        assert_eq!(metadata["settings"], serde_json::json!([]));
    }
}
