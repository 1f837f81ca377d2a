//! Context-aware error suggestions.
//!
//! Complements the static suggestions in the `codes` module with hints built
//! from the error context, such as the closest known platform id.

use serde_json::Value;

use super::codes::ErrorCode;
use crate::rules::{ExportFormat, Platform};

/// Generate a suggestion for an error, using `context` when it helps.
pub fn suggest_for_error(code: ErrorCode, context: Option<&Value>) -> String {
    match code {
        ErrorCode::UnsupportedPlatform => suggest_platform(context),
        ErrorCode::UnsupportedFormat => suggest_format(context),
        ErrorCode::NotFound => suggest_not_found(context),
        _ => code.suggestion().to_string(),
    }
}

fn context_str<'a>(context: Option<&'a Value>, key: &str) -> Option<&'a str> {
    context.and_then(|c| c.get(key)).and_then(Value::as_str)
}

fn suggest_platform(context: Option<&Value>) -> String {
    let known: Vec<&str> = Platform::ALL.iter().map(|p| p.id()).collect();
    let Some(requested) = context_str(context, "platform") else {
        return ErrorCode::UnsupportedPlatform.suggestion().to_string();
    };

    match suggest_similar(requested, &known, 1).first() {
        Some(closest) => format!(
            "Unknown platform '{requested}'. Did you mean '{closest}'? Supported: {}",
            known.join(", ")
        ),
        None => format!(
            "Unknown platform '{requested}'. Supported: {} (or disable strict_platforms to fall back to custom)",
            known.join(", ")
        ),
    }
}

fn suggest_format(context: Option<&Value>) -> String {
    let known: Vec<&str> = ExportFormat::ALL.iter().map(|f| f.id()).collect();
    let Some(requested) = context_str(context, "format") else {
        return ErrorCode::UnsupportedFormat.suggestion().to_string();
    };

    match suggest_similar(requested, &known, 1).first() {
        Some(closest) => format!("Unknown format '{requested}'. Did you mean '{closest}'?"),
        None => format!("Unknown format '{requested}'. Supported: {}", known.join(", ")),
    }
}

fn suggest_not_found(context: Option<&Value>) -> String {
    match context_str(context, "resource") {
        Some(resource) if resource.starts_with("folder") => format!(
            "The {resource} does not exist under the source root. Check the id, or point \
             --root / PROMPTEX_SOURCE_ROOT at the directory that contains it"
        ),
        _ => ErrorCode::NotFound.suggestion().to_string(),
    }
}

/// Known ids that look like `query`, best match first.
pub fn suggest_similar(query: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let query_lower = query.to_lowercase();
    let mut scored: Vec<_> = available
        .iter()
        .map(|s| (s, similarity_score(&query_lower, &s.to_lowercase())))
        .filter(|(_, score)| *score > 0.3)
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(s, _)| (*s).to_string())
        .collect()
}

/// Jaccard similarity on character trigrams, with a prefix check for
/// strings too short to have any.
#[allow(clippy::cast_precision_loss)]
fn similarity_score(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a_trigrams: std::collections::HashSet<_> = trigrams(a).collect();
    let b_trigrams: std::collections::HashSet<_> = trigrams(b).collect();

    if a_trigrams.is_empty() || b_trigrams.is_empty() {
        if a.starts_with(b) || b.starts_with(a) {
            return 0.8;
        }
        if a.contains(b) || b.contains(a) {
            return 0.5;
        }
        return 0.0;
    }

    let intersection = a_trigrams.intersection(&b_trigrams).count();
    let union = a_trigrams.union(&b_trigrams).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn trigrams(s: &str) -> impl Iterator<Item = &str> {
    (0..s.len().saturating_sub(2)).filter_map(move |i| s.get(i..i + 3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn misspelled_platform_gets_closest_match() {
        let context = json!({ "platform": "midjourny" });
        let suggestion = suggest_for_error(ErrorCode::UnsupportedPlatform, Some(&context));
        assert!(suggestion.contains("Did you mean 'midjourney'"));
    }

    #[test]
    fn unrelated_platform_lists_supported() {
        let context = json!({ "platform": "zzz" });
        let suggestion = suggest_for_error(ErrorCode::UnsupportedPlatform, Some(&context));
        assert!(suggestion.contains("stable_diffusion"));
        assert!(!suggestion.contains("Did you mean"));
    }

    #[test]
    fn format_suggestion_uses_context() {
        let context = json!({ "format": "jsn" });
        let suggestion = suggest_for_error(ErrorCode::UnsupportedFormat, Some(&context));
        assert!(suggestion.contains("jsn"));
    }

    #[test]
    fn missing_folder_mentions_source_root() {
        let context = json!({ "resource": "folder 'spring'" });
        let suggestion = suggest_for_error(ErrorCode::NotFound, Some(&context));
        assert!(suggestion.contains("PROMPTEX_SOURCE_ROOT"));
    }

    #[test]
    fn falls_back_to_static_suggestion() {
        assert_eq!(
            suggest_for_error(ErrorCode::EmptyContent, None),
            ErrorCode::EmptyContent.suggestion()
        );
    }

    #[test]
    fn similar_ids_rank_by_overlap() {
        let known = ["stable_diffusion", "midjourney", "dalle"];
        assert_eq!(suggest_similar("stable_difusion", &known, 2), vec!["stable_diffusion"]);
        assert!(suggest_similar("qqq", &known, 2).is_empty());
    }
}
