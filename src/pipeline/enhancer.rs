//! Enhancer stage: optional metadata inference.
//!
//! An enhancer receives a parsed prompt and returns a new one that supersedes
//! it. The orchestrator owns timeouts and the fallback to the un-enhanced
//! prompt, so implementations just report failure through `Err`.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::rules::Platform;

use super::types::{Components, DetailLevel, StructuredPrompt};

/// Pluggable enhancement service.
#[async_trait]
pub trait Enhancer: Send + Sync {
    /// Short identifier recorded in the prompt metadata.
    fn name(&self) -> &str;

    async fn enhance(
        &self,
        prompt: &StructuredPrompt,
        platform: Platform,
        level: DetailLevel,
    ) -> Result<StructuredPrompt>;
}

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnhancer;

#[async_trait]
impl Enhancer for NoopEnhancer {
    fn name(&self) -> &str {
        "noop"
    }

    async fn enhance(
        &self,
        prompt: &StructuredPrompt,
        _platform: Platform,
        _level: DetailLevel,
    ) -> Result<StructuredPrompt> {
        Ok(prompt.clone())
    }
}

// =============================================================================
// Keyword enhancer
// =============================================================================

/// Keyword-to-mood table, first match wins.
const MOOD_HINTS: &[(&str, &str)] = &[
    ("noir", "mysterious"),
    ("cyberpunk", "futuristic"),
    ("steampunk", "inventive"),
    ("surreal", "dreamlike"),
    ("fantasy", "whimsical"),
    ("vintage", "nostalgic"),
    ("retro", "nostalgic"),
    ("cinematic", "dramatic"),
    ("minimalist", "calm"),
    ("night", "moody"),
    ("fog", "moody"),
    ("rain", "melancholic"),
    ("sunset", "warm"),
    ("sunrise", "hopeful"),
];

/// Qualities that pair well with a detected style or subject.
const COMPLEMENTS: &[(&str, &str)] = &[
    ("cinematic", "dramatic lighting"),
    ("photorealistic", "sharp focus"),
    ("realistic", "sharp focus"),
    ("fantasy", "volumetric lighting"),
    ("portrait", "soft lighting"),
    ("landscape", "high resolution"),
    ("cityscape", "high resolution"),
];

const STYLE_WEIGHT: f64 = 1.2;
const QUALITY_WEIGHT: f64 = 1.1;

/// Local enhancer that infers tags, mood, lighting, composition and tag
/// weights from the extracted components.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordEnhancer;

impl KeywordEnhancer {
    /// Synchronous core, shared with callers that do not need the trait.
    #[must_use]
    pub fn enhance_now(
        &self,
        prompt: &StructuredPrompt,
        platform: Platform,
        level: DetailLevel,
    ) -> StructuredPrompt {
        let mut enhanced = prompt.clone();

        if level != DetailLevel::Basic {
            for (trigger, quality) in COMPLEMENTS {
                if enhanced.components.styles.contains(*trigger)
                    || enhanced.components.subjects.contains(*trigger)
                {
                    enhanced.components.qualities.insert((*quality).to_string());
                }
            }
        }

        let metadata = &mut enhanced.metadata;
        metadata.insert("tags".to_string(), tags(&enhanced.components));
        metadata.insert("mood".to_string(), Value::from(mood(&enhanced.components)));

        if level != DetailLevel::Basic {
            metadata.insert("lighting".to_string(), Value::from(lighting(&enhanced.components)));
            metadata.insert(
                "composition".to_string(),
                Value::from(composition(&enhanced.components)),
            );
        }

        if level == DetailLevel::Detailed {
            let mut weights = Map::new();
            for style in &enhanced.components.styles {
                weights.insert(style.clone(), Value::from(STYLE_WEIGHT));
            }
            for quality in &enhanced.components.qualities {
                weights.insert(quality.clone(), Value::from(QUALITY_WEIGHT));
            }
            metadata.insert("weights".to_string(), Value::Object(weights));
            metadata.insert("detail_level".to_string(), Value::from(level.id()));
        }

        metadata.insert("target_platform".to_string(), Value::from(platform.id()));
        metadata.insert("enhanced_by".to_string(), Value::from("keyword"));
        enhanced.components.write_into(metadata);

        enhanced
    }
}

#[async_trait]
impl Enhancer for KeywordEnhancer {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn enhance(
        &self,
        prompt: &StructuredPrompt,
        platform: Platform,
        level: DetailLevel,
    ) -> Result<StructuredPrompt> {
        Ok(self.enhance_now(prompt, platform, level))
    }
}

fn tags(components: &Components) -> Value {
    let mut tags: Vec<&String> = components
        .styles
        .iter()
        .chain(&components.qualities)
        .chain(&components.subjects)
        .chain(&components.settings)
        .collect();
    tags.sort();
    tags.dedup();
    Value::Array(tags.into_iter().cloned().map(Value::String).collect())
}

fn mood(components: &Components) -> &'static str {
    MOOD_HINTS
        .iter()
        .find(|(keyword, _)| {
            components.styles.contains(*keyword) || components.settings.contains(*keyword)
        })
        .map_or("neutral", |(_, mood)| *mood)
}

fn lighting(components: &Components) -> String {
    if let Some(explicit) = components.qualities.iter().find(|q| q.ends_with("lighting")) {
        return explicit.clone();
    }
    let settings = &components.settings;
    let hint = if settings.contains("night") {
        "low-key lighting"
    } else if settings.contains("sunset") || settings.contains("sunrise") {
        "golden hour"
    } else if settings.contains("studio") || settings.contains("indoor") {
        "studio lighting"
    } else {
        "natural lighting"
    };
    hint.to_string()
}

fn composition(components: &Components) -> &'static str {
    let subjects = &components.subjects;
    if subjects.contains("portrait") || subjects.contains("person") || subjects.contains("character")
    {
        "close-up"
    } else if subjects.contains("landscape")
        || subjects.contains("cityscape")
        || components.settings.contains("mountain")
        || components.settings.contains("ocean")
    {
        "wide shot"
    } else {
        "balanced composition"
    }
}
