//! Validator stage: platform rule checks producing a tri-state verdict.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::rules::{Platform, PlatformProfile};

use super::types::{StructuredPrompt, ValidationStatus, ValidationVerdict};

/// Inline `name:value` parameter tokens.
static INLINE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([a-z_]+):([^\s,;]+)").unwrap());

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptValidator;

impl PromptValidator {
    /// Check a prompt against the rules of `platform`.
    ///
    /// Rules run in a fixed order and only ever escalate the status:
    /// length (warning), forbidden phrases (error), required elements
    /// (warning), inline parameters (warning).
    #[must_use]
    pub fn validate(&self, prompt: &StructuredPrompt, platform: Platform) -> ValidationVerdict {
        let profile = platform.profile();
        let mut check = Checks::default();

        check_length(&mut check, &prompt.content, profile);
        check_forbidden(&mut check, &prompt.content, profile);
        check_required(&mut check, &prompt.content, profile);
        check_parameters(&mut check, &prompt.content, profile);

        let message = match check.status {
            ValidationStatus::Valid => format!("Prompt is valid for {}", profile.display_name),
            ValidationStatus::Warning => {
                format!("Prompt is valid with {} warning(s)", check.warnings.len())
            }
            ValidationStatus::Error => format!(
                "Prompt has {} error(s) and {} warning(s)",
                check.errors.len(),
                check.warnings.len()
            ),
        };

        debug!(
            platform = %platform,
            status = ?check.status,
            warnings = check.warnings.len(),
            errors = check.errors.len(),
            "validated prompt"
        );

        ValidationVerdict {
            status: check.status,
            warnings: check.warnings,
            errors: check.errors,
            message,
        }
    }
}

#[derive(Default)]
struct Checks {
    status: ValidationStatus,
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl Checks {
    fn warn(&mut self, message: String) {
        self.warnings.push(message);
        self.status = self.status.max(ValidationStatus::Warning);
    }

    fn fail(&mut self, message: String) {
        self.errors.push(message);
        self.status = self.status.max(ValidationStatus::Error);
    }
}

fn check_length(check: &mut Checks, content: &str, profile: &PlatformProfile) {
    let length = content.chars().count();
    if length > profile.max_content_length {
        check.warn(format!(
            "Content length {length} exceeds {} limit of {} characters",
            profile.display_name, profile.max_content_length
        ));
    }
}

fn check_forbidden(check: &mut Checks, content: &str, profile: &PlatformProfile) {
    let lowered = content.to_lowercase();
    for phrase in profile.forbidden_phrases {
        if lowered.contains(&phrase.to_lowercase()) {
            check.fail(format!("Contains forbidden content: {phrase}"));
        }
    }
}

fn check_required(check: &mut Checks, content: &str, profile: &PlatformProfile) {
    let lowered = content.to_lowercase();
    for element in profile.required_elements {
        if !lowered.contains(&element.to_lowercase()) {
            check.warn(format!("Missing recommended element: {element}"));
        }
    }
}

fn check_parameters(check: &mut Checks, content: &str, profile: &PlatformProfile) {
    for capture in INLINE_PARAM.captures_iter(content) {
        let Some(constraint) = profile.constraint(&capture[1]) else {
            continue;
        };
        for violation in constraint.check(&capture[2]) {
            check.warn(violation);
        }
    }
}
