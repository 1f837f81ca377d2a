//! Runs the stages in order and hands the result to the sink.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{Config, ParserConfig};
use crate::error::{PexError, Result};
use crate::rules::{ExportFormat, Platform, resolve_platform};

use super::enhancer::Enhancer;
use super::parser::PromptParser;
use super::sink::{ExportSink, UploadRequest};
use super::source::{DocumentSource, split_source};
use super::transformer::PromptTransformer;
use super::types::{
    DetailLevel, ExportOutcome, ExportSummary, ProcessedPrompt, RawInput, ShapedPrompt,
    SourceKind, StructuredPrompt,
};
use super::validator::PromptValidator;

/// Settings the pipeline needs, extracted from [`Config`] once.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub parser: ParserConfig,
    pub enhance_by_default: bool,
    pub default_detail_level: DetailLevel,
    pub enhancement_timeout: Duration,
    pub default_platform: String,
    pub default_format: String,
    pub strict_platforms: bool,
    pub upload_timeout: Duration,
}

impl PipelineConfig {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            parser: config.parser.clone(),
            enhance_by_default: config.enhancement.enabled,
            default_detail_level: config.enhancement.default_detail_level,
            enhancement_timeout: Duration::from_millis(config.enhancement.timeout_ms),
            default_platform: config.export.default_platform.clone(),
            default_format: config.export.default_format.clone(),
            strict_platforms: config.export.strict_platforms,
            upload_timeout: Duration::from_millis(config.export.upload_timeout_ms),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Whether and how hard to enhance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancementOptions {
    pub enabled: bool,
    pub detail_level: DetailLevel,
}

/// Fully resolved per-request options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub platform: Platform,
    pub format: ExportFormat,
    pub enhancement: EnhancementOptions,
}

/// Caller-supplied enhancement switches; unset fields use config defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementRequest {
    pub enabled: Option<bool>,
    pub detail_level: Option<String>,
}

/// An export of one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub source_content: String,
    #[serde(rename = "sourceType")]
    pub source_kind: Option<String>,
    pub target_platform: Option<String>,
    pub export_format: Option<String>,
    pub enhancement_options: Option<EnhancementRequest>,
}

/// An export of every document in a source folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub folder_id: String,
    pub target_platform: Option<String>,
    pub export_format: Option<String>,
    pub enhancement_options: Option<EnhancementRequest>,
}

#[derive(Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    parser: PromptParser,
    validator: PromptValidator,
    transformer: PromptTransformer,
    enhancer: Arc<dyn Enhancer>,
    sink: Arc<dyn ExportSink>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("enhancer", &self.enhancer.name())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(config: PipelineConfig, enhancer: Arc<dyn Enhancer>, sink: Arc<dyn ExportSink>) -> Self {
        Self {
            parser: PromptParser::new(&config.parser),
            validator: PromptValidator,
            transformer: PromptTransformer,
            config,
            enhancer,
            sink,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolve caller ids against config defaults.
    ///
    /// Unknown platforms fall back to `custom` unless strict mode is on.
    /// Unknown formats and detail levels are always rejected.
    pub fn resolve_options(
        &self,
        platform: Option<&str>,
        format: Option<&str>,
        enhancement: Option<&EnhancementRequest>,
    ) -> Result<ExportOptions> {
        let platform_id = non_blank(platform).unwrap_or(self.config.default_platform.as_str());
        let format_id = non_blank(format).unwrap_or(self.config.default_format.as_str());

        let platform = resolve_platform(platform_id, self.config.strict_platforms)?;
        let format = format_id.parse::<ExportFormat>()?;

        let enabled = enhancement
            .and_then(|request| request.enabled)
            .unwrap_or(self.config.enhance_by_default);
        let detail_level = match enhancement.and_then(|request| non_blank(request.detail_level.as_deref())) {
            Some(level) => level.parse()?,
            None => self.config.default_detail_level,
        };

        Ok(ExportOptions {
            platform,
            format,
            enhancement: EnhancementOptions {
                enabled,
                detail_level,
            },
        })
    }

    /// Run one item through parse, enhance, validate and shape.
    pub async fn process(
        &self,
        raw: &RawInput,
        options: &ExportOptions,
        now: DateTime<Utc>,
    ) -> Result<ProcessedPrompt> {
        let parsed = self.parser.parse_at(raw, now)?;
        debug!(words = parsed.content.split(' ').count(), "parsed prompt");

        let (prompt, enhanced) = if options.enhancement.enabled {
            self.enhance(parsed, options).await
        } else {
            (parsed, false)
        };

        let validation = self.validator.validate(&prompt, options.platform);
        let shaped = self.transformer.shape(&prompt, options.platform);

        Ok(ProcessedPrompt {
            id: Uuid::new_v4().to_string(),
            original_content: raw.content.clone(),
            content: shaped.content,
            platform: options.platform,
            format: options.format,
            validation,
            metadata: shaped.metadata,
            enhanced,
        })
    }

    async fn enhance(&self, parsed: StructuredPrompt, options: &ExportOptions) -> (StructuredPrompt, bool) {
        let timeout = self.config.enhancement_timeout;
        let call = self
            .enhancer
            .enhance(&parsed, options.platform, options.enhancement.detail_level);

        let failure = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(enhanced)) => {
                debug!(enhancer = self.enhancer.name(), "enhanced prompt");
                return (enhanced, true);
            }
            Ok(Err(err)) => err.to_string(),
            Err(_) => format!("no response within {}ms", timeout.as_millis()),
        };

        warn!(
            enhancer = self.enhancer.name(),
            reason = %failure,
            "enhancement failed, continuing with parsed prompt"
        );
        (parsed, false)
    }

    /// Export one source: resolve options, split, process, render, upload.
    pub async fn export(&self, request: ExportRequest) -> Result<ExportOutcome> {
        let options = self.resolve_options(
            request.target_platform.as_deref(),
            request.export_format.as_deref(),
            request.enhancement_options.as_ref(),
        )?;
        let kind = match non_blank(request.source_kind.as_deref()) {
            Some(kind) => kind.parse::<SourceKind>()?,
            None => SourceKind::Text,
        };

        let raw = RawInput::new(request.source_content, kind);
        self.export_items(split_source(&raw), &options).await
    }

    /// Export every document of a folder from `source`.
    pub async fn export_batch(
        &self,
        source: &dyn DocumentSource,
        request: BatchRequest,
    ) -> Result<ExportOutcome> {
        let options = self.resolve_options(
            request.target_platform.as_deref(),
            request.export_format.as_deref(),
            request.enhancement_options.as_ref(),
        )?;
        let documents = source.fetch(&request.folder_id).await?;
        let items: Vec<RawInput> = documents.iter().flat_map(split_source).collect();
        self.export_items(items, &options).await
    }

    /// Process `items` in order and upload them as one export file.
    pub async fn export_items(&self, items: Vec<RawInput>, options: &ExportOptions) -> Result<ExportOutcome> {
        if items.is_empty() {
            return Err(PexError::EmptyContent);
        }

        let now = Utc::now();
        let mut summary = ExportSummary::default();
        let mut processed = Vec::with_capacity(items.len());
        for raw in &items {
            let prompt = self.process(raw, options, now).await?;
            summary.record(prompt.validation.status);
            processed.push(prompt);
        }

        let shaped: Vec<ShapedPrompt> = processed.iter().map(ShapedPrompt::from).collect();
        let export = self
            .transformer
            .transform_all(&shaped, options.platform, options.format, now)?;

        let request = UploadRequest {
            file_name: export.file_name.clone(),
            content: export.content.into_bytes(),
            mime_type: export.mime_type,
            metadata: Some(json!({
                "platform": options.platform.id(),
                "format": options.format.id(),
                "totalPrompts": summary.total_prompts,
            })),
        };
        let export_url = self.upload(request).await?;

        info!(
            platform = %options.platform,
            format = %options.format,
            total = summary.total_prompts,
            valid = summary.valid_prompts,
            warnings = summary.warning_prompts,
            errors = summary.error_prompts,
            url = %export_url,
            "export complete"
        );

        Ok(ExportOutcome {
            exported_prompts: processed,
            summary,
            export_url,
        })
    }

    async fn upload(&self, request: UploadRequest) -> Result<String> {
        let timeout = self.config.upload_timeout;
        let file_name = request.file_name.clone();

        let receipt = match tokio::time::timeout(timeout, self.sink.upload(request)).await {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(PexError::SinkFailed(reason))) => return Err(PexError::SinkFailed(reason)),
            Ok(Err(err)) => return Err(PexError::SinkFailed(err.to_string())),
            Err(_) => {
                return Err(PexError::SinkFailed(format!(
                    "upload of {file_name} timed out after {}ms",
                    timeout.as_millis()
                )));
            }
        };

        if !receipt.success {
            return Err(PexError::SinkFailed(format!(
                "sink rejected {file_name} ({})",
                receipt.location_url
            )));
        }
        Ok(receipt.location_url)
    }
}

impl From<&ProcessedPrompt> for ShapedPrompt {
    fn from(prompt: &ProcessedPrompt) -> Self {
        Self {
            content: prompt.content.clone(),
            metadata: prompt.metadata.clone(),
            platform: prompt.platform,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
