//! Transformer stage: platform shaping and rendering.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::error::{PexError, Result};
use crate::rules::{ExportFormat, Platform, PlatformProfile};

use super::parser::truncate_chars;
use super::render::{render_many, render_one};
use super::types::{RenderedExport, ShapedPrompt, StructuredPrompt};

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptTransformer;

impl PromptTransformer {
    /// Rewrite a prompt for `platform`.
    ///
    /// Style then quality tags are appended when the platform takes tags,
    /// using its weight syntax for tags with a numeric weight in
    /// `metadata.weights`. The result is always cut to the platform limit.
    #[must_use]
    pub fn shape(&self, prompt: &StructuredPrompt, platform: Platform) -> ShapedPrompt {
        let profile = platform.profile();
        let mut content = prompt.content.clone();

        if profile.supports_style_tags {
            let weights = prompt.metadata.get("weights").and_then(Value::as_object);
            let tags: Vec<String> = prompt
                .components
                .styles
                .iter()
                .chain(&prompt.components.qualities)
                .map(|tag| format_tag(tag, weights, profile))
                .collect();
            if !tags.is_empty() {
                content.push_str(profile.content_join_separator);
                content.push_str(&tags.join(profile.content_join_separator));
            }
        }

        let limit = profile.max_content_length;
        if content.chars().count() > limit {
            debug!(platform = %platform, limit, "truncating shaped prompt");
            content = truncate_chars(&content, limit);
        }

        let mut metadata = prompt.metadata.clone();
        metadata.insert("platform".to_string(), Value::from(platform.id()));

        ShapedPrompt {
            content,
            metadata,
            platform,
        }
    }

    /// Shape and render one prompt as a standalone export.
    pub fn transform(
        &self,
        prompt: &StructuredPrompt,
        platform: Platform,
        format: ExportFormat,
        at: DateTime<Utc>,
    ) -> Result<RenderedExport> {
        let shaped = self.shape(prompt, platform);
        let content = render_one(&shaped, format, at)?;
        Ok(rendered(content, export_file_name(platform, format, at, false), platform, format))
    }

    /// Render already-shaped prompts into one export file.
    ///
    /// A single prompt renders as a standalone document; more than one
    /// renders as a collection.
    pub fn transform_all(
        &self,
        prompts: &[ShapedPrompt],
        platform: Platform,
        format: ExportFormat,
        at: DateTime<Utc>,
    ) -> Result<RenderedExport> {
        let (content, collection) = match prompts {
            [] => return Err(PexError::InvalidInput("nothing to export".to_string())),
            [single] => (render_one(single, format, at)?, false),
            many => (render_many(many, format, at)?, true),
        };
        Ok(rendered(
            content,
            export_file_name(platform, format, at, collection),
            platform,
            format,
        ))
    }
}

fn format_tag(
    tag: &str,
    weights: Option<&serde_json::Map<String, Value>>,
    profile: &PlatformProfile,
) -> String {
    let weight = weights.and_then(|w| w.get(tag)).and_then(Value::as_f64);
    match (profile.weight_syntax, weight) {
        (Some(syntax), Some(weight)) => syntax.apply(tag, weight),
        _ => tag.to_string(),
    }
}

fn rendered(
    content: String,
    file_name: String,
    platform: Platform,
    format: ExportFormat,
) -> RenderedExport {
    RenderedExport {
        file_name,
        mime_type: format.profile().mime_type.to_string(),
        size_bytes: content.len(),
        content,
        format,
        platform,
    }
}

/// `prompt_<platform>_<YYYYmmdd_HHMMSS>.<ext>`, or `prompts_...` for a
/// collection.
#[must_use]
pub fn export_file_name(
    platform: Platform,
    format: ExportFormat,
    at: DateTime<Utc>,
    collection: bool,
) -> String {
    let stem = if collection { "prompts" } else { "prompt" };
    format!(
        "{stem}_{}_{}.{}",
        platform.id(),
        at.format("%Y%m%d_%H%M%S"),
        format.profile().extension
    )
}
