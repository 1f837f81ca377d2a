//! Platform rule tables.
//!
//! Every target platform has one immutable [`PlatformProfile`] holding its
//! length limit, tag grammar, content policy and inline parameter rules.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PexError;

/// Target content-generation platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Midjourney,
    StableDiffusion,
    Dalle,
    Leonardo,
    Runway,
    Custom,
}

impl Platform {
    pub const ALL: [Self; 6] = [
        Self::Midjourney,
        Self::StableDiffusion,
        Self::Dalle,
        Self::Leonardo,
        Self::Runway,
        Self::Custom,
    ];

    /// Stable identifier used on the wire and in file names.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Midjourney => "midjourney",
            Self::StableDiffusion => "stable_diffusion",
            Self::Dalle => "dalle",
            Self::Leonardo => "leonardo",
            Self::Runway => "runway",
            Self::Custom => "custom",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Midjourney => 0,
            Self::StableDiffusion => 1,
            Self::Dalle => 2,
            Self::Leonardo => 3,
            Self::Runway => 4,
            Self::Custom => 5,
        }
    }

    /// Resolve an identifier, falling back to [`Platform::Custom`] for
    /// anything not in the rule tables.
    #[must_use]
    pub fn resolve(id: &str) -> Self {
        id.parse().unwrap_or_else(|_| {
            tracing::warn!(platform = id, "unknown platform, using custom profile");
            Self::Custom
        })
    }

    /// The rule profile for this platform.
    #[must_use]
    pub fn profile(self) -> &'static PlatformProfile {
        &PROFILES[self.index()]
    }
}

impl FromStr for Platform {
    type Err = PexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        match key.as_str() {
            "midjourney" | "mj" => Ok(Self::Midjourney),
            "stable_diffusion" | "stablediffusion" | "sd" => Ok(Self::StableDiffusion),
            "dalle" | "dall_e" | "dall_e_3" => Ok(Self::Dalle),
            "leonardo" | "leonardo_ai" => Ok(Self::Leonardo),
            "runway" => Ok(Self::Runway),
            "custom" => Ok(Self::Custom),
            _ => Err(PexError::UnsupportedPlatform(s.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// How a weight-based grammar attaches emphasis to a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightSyntax {
    /// `tag::1.5`
    DoubleColon,
    /// `(tag:1.5)`
    Parenthesized,
}

impl WeightSyntax {
    #[must_use]
    pub fn apply(self, tag: &str, weight: f64) -> String {
        match self {
            Self::DoubleColon => format!("{tag}::{weight}"),
            Self::Parenthesized => format!("({tag}:{weight})"),
        }
    }
}

/// Rule for one inline `name:value` parameter.
#[derive(Debug, Clone)]
pub struct ParameterConstraint {
    pub name: &'static str,
    pub pattern: Option<Regex>,
    pub numeric_range: Option<(f64, f64)>,
    /// Empty means any value is accepted.
    pub allowed_values: &'static [&'static str],
}

impl ParameterConstraint {
    fn pattern(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).ok(),
            numeric_range: None,
            allowed_values: &[],
        }
    }

    const fn range(name: &'static str, min: f64, max: f64) -> Self {
        Self {
            name,
            pattern: None,
            numeric_range: Some((min, max)),
            allowed_values: &[],
        }
    }

    const fn allowed(name: &'static str, values: &'static [&'static str]) -> Self {
        Self {
            name,
            pattern: None,
            numeric_range: None,
            allowed_values: values,
        }
    }

    /// Check a value, returning a description of every violated rule.
    #[must_use]
    pub fn check(&self, value: &str) -> Vec<String> {
        let mut violations = Vec::new();

        if let Some(pattern) = self.pattern.as_ref().filter(|p| !p.is_match(value)) {
            violations.push(format!(
                "Parameter '{}' value '{value}' does not match expected format {}",
                self.name,
                pattern.as_str()
            ));
        }

        if let Some((min, max)) = self.numeric_range {
            match value.parse::<f64>() {
                Ok(number) if number >= min && number <= max => {}
                Ok(_) => violations.push(format!(
                    "Parameter '{}' value {value} is outside the range {min}-{max}",
                    self.name
                )),
                Err(_) => violations.push(format!(
                    "Parameter '{}' value '{value}' is not a number",
                    self.name
                )),
            }
        }

        if !self.allowed_values.is_empty()
            && !self
                .allowed_values
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(value))
        {
            violations.push(format!(
                "Parameter '{}' value '{value}' is not one of: {}",
                self.name,
                self.allowed_values.join(", ")
            ));
        }

        violations
    }
}

/// Static rule profile for a platform.
#[derive(Debug, Clone)]
pub struct PlatformProfile {
    pub platform: Platform,
    pub display_name: &'static str,
    pub max_content_length: usize,
    pub content_join_separator: &'static str,
    pub supports_style_tags: bool,
    pub weight_syntax: Option<WeightSyntax>,
    pub forbidden_phrases: &'static [&'static str],
    pub required_elements: &'static [&'static str],
    pub parameter_constraints: Vec<ParameterConstraint>,
}

impl PlatformProfile {
    #[must_use]
    pub const fn supports_weights(&self) -> bool {
        self.weight_syntax.is_some()
    }

    #[must_use]
    pub fn constraint(&self, name: &str) -> Option<&ParameterConstraint> {
        self.parameter_constraints
            .iter()
            .find(|constraint| constraint.name.eq_ignore_ascii_case(name))
    }
}

const BASE_FORBIDDEN: &[&str] = &["nsfw", "nude", "gore", "explicit"];

static PROFILES: LazyLock<[PlatformProfile; 6]> = LazyLock::new(|| {
    [
        PlatformProfile {
            platform: Platform::Midjourney,
            display_name: "Midjourney",
            max_content_length: 4000,
            content_join_separator: ", ",
            supports_style_tags: true,
            weight_syntax: Some(WeightSyntax::DoubleColon),
            forbidden_phrases: BASE_FORBIDDEN,
            required_elements: &[],
            parameter_constraints: vec![
                ParameterConstraint::pattern("ar", r"^\d+:\d+$"),
                ParameterConstraint::allowed("v", &["5", "5.1", "5.2", "6", "6.1"]),
                ParameterConstraint::range("stylize", 0.0, 1000.0),
                ParameterConstraint::range("chaos", 0.0, 100.0),
                ParameterConstraint::allowed("q", &[".25", ".5", "1", "2"]),
            ],
        },
        PlatformProfile {
            platform: Platform::StableDiffusion,
            display_name: "Stable Diffusion",
            max_content_length: 1000,
            content_join_separator: ", ",
            supports_style_tags: true,
            weight_syntax: Some(WeightSyntax::Parenthesized),
            forbidden_phrases: BASE_FORBIDDEN,
            required_elements: &[],
            parameter_constraints: vec![
                ParameterConstraint::range("steps", 1.0, 150.0),
                ParameterConstraint::range("cfg_scale", 1.0, 30.0),
                ParameterConstraint::pattern("seed", r"^\d+$"),
                ParameterConstraint::allowed("sampler", &["euler", "euler_a", "dpm++", "ddim", "lms"]),
            ],
        },
        PlatformProfile {
            platform: Platform::Dalle,
            display_name: "DALL-E",
            max_content_length: 4000,
            content_join_separator: ". ",
            supports_style_tags: false,
            weight_syntax: None,
            forbidden_phrases: &["nsfw", "nude", "gore", "explicit", "violence"],
            required_elements: &[],
            parameter_constraints: vec![
                ParameterConstraint::allowed(
                    "size",
                    &["256x256", "512x512", "1024x1024", "1792x1024", "1024x1792"],
                ),
                ParameterConstraint::allowed("quality", &["standard", "hd"]),
                ParameterConstraint::allowed("style", &["vivid", "natural"]),
            ],
        },
        PlatformProfile {
            platform: Platform::Leonardo,
            display_name: "Leonardo AI",
            max_content_length: 1000,
            content_join_separator: ", ",
            supports_style_tags: true,
            weight_syntax: None,
            forbidden_phrases: &["nsfw", "nude", "gore"],
            required_elements: &[],
            parameter_constraints: vec![
                ParameterConstraint::range("guidance", 1.0, 20.0),
                ParameterConstraint::allowed("alchemy", &["true", "false"]),
            ],
        },
        PlatformProfile {
            platform: Platform::Runway,
            display_name: "Runway",
            max_content_length: 500,
            content_join_separator: ", ",
            supports_style_tags: false,
            weight_syntax: None,
            forbidden_phrases: &["nsfw", "nude", "gore"],
            required_elements: &["camera", "motion"],
            parameter_constraints: vec![
                ParameterConstraint::range("duration", 1.0, 10.0),
                ParameterConstraint::range("motion", 1.0, 10.0),
            ],
        },
        PlatformProfile {
            platform: Platform::Custom,
            display_name: "Custom",
            max_content_length: 10_000,
            content_join_separator: ", ",
            supports_style_tags: true,
            weight_syntax: None,
            forbidden_phrases: &[],
            required_elements: &[],
            parameter_constraints: Vec::new(),
        },
    ]
});
