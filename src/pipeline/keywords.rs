//! Keyword pattern groups used by the parser.
//!
//! Matching is shallow on purpose: case-insensitive, word-bounded
//! alternations. Each hit yields the lowercase keyword as written in the
//! group, so "CINEMATIC" and "cinematic" land on the same entry.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::types::Components;

pub const STYLE_KEYWORDS: &[&str] = &[
    "cinematic",
    "photorealistic",
    "realistic",
    "anime",
    "cartoon",
    "watercolor",
    "oil painting",
    "digital art",
    "concept art",
    "illustration",
    "minimalist",
    "surreal",
    "abstract",
    "vintage",
    "retro",
    "cyberpunk",
    "steampunk",
    "fantasy",
    "noir",
    "impressionist",
    "3d render",
    "pixel art",
    "sketch",
];

pub const QUALITY_KEYWORDS: &[&str] = &[
    "4k",
    "8k",
    "hd",
    "uhd",
    "high quality",
    "high resolution",
    "highly detailed",
    "ultra detailed",
    "detailed",
    "masterpiece",
    "sharp focus",
    "dramatic lighting",
    "soft lighting",
    "volumetric lighting",
    "professional",
    "award winning",
];

pub const SUBJECT_KEYWORDS: &[&str] = &[
    "person",
    "woman",
    "man",
    "child",
    "portrait",
    "character",
    "warrior",
    "animal",
    "cat",
    "dog",
    "bird",
    "horse",
    "dragon",
    "robot",
    "car",
    "building",
    "castle",
    "tree",
    "flower",
    "landscape",
    "cityscape",
];

pub const SETTING_KEYWORDS: &[&str] = &[
    "urban",
    "city",
    "street",
    "forest",
    "mountain",
    "beach",
    "ocean",
    "desert",
    "space",
    "underwater",
    "indoor",
    "outdoor",
    "studio",
    "night",
    "sunset",
    "sunrise",
    "rain",
    "fog",
    "snow",
];

fn build_group(keywords: &[&str]) -> Regex {
    // Longer alternatives first so "highly detailed" wins over "detailed".
    let mut sorted: Vec<&str> = keywords.to_vec();
    sorted.sort_by_key(|keyword| std::cmp::Reverse(keyword.len()));
    let alternation = sorted
        .iter()
        .map(|keyword| regex::escape(keyword))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).unwrap()
}

static STYLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| build_group(STYLE_KEYWORDS));
static QUALITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| build_group(QUALITY_KEYWORDS));
static SUBJECT_PATTERN: LazyLock<Regex> = LazyLock::new(|| build_group(SUBJECT_KEYWORDS));
static SETTING_PATTERN: LazyLock<Regex> = LazyLock::new(|| build_group(SETTING_KEYWORDS));

fn hits(pattern: &Regex, text: &str) -> BTreeSet<String> {
    pattern
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Scan normalized text against all four groups.
#[must_use]
pub fn extract_components(text: &str) -> Components {
    Components {
        subjects: hits(&SUBJECT_PATTERN, text),
        styles: hits(&STYLE_PATTERN, text),
        qualities: hits(&QUALITY_PATTERN, text),
        settings: hits(&SETTING_PATTERN, text),
    }
}
