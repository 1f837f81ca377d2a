//! Parser stage: raw text to [`StructuredPrompt`].

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::debug;

use crate::config::ParserConfig;
use crate::error::{PexError, Result};

use super::keywords::extract_components;
use super::types::{Components, Metadata, RawInput, SourceKind, StructuredPrompt};

/// Document fields that may carry the prompt text itself.
const CONTENT_FIELDS: [&str; 2] = ["prompt", "content"];

#[derive(Debug, Clone)]
pub struct PromptParser {
    max_input_length: usize,
}

impl PromptParser {
    #[must_use]
    pub const fn new(config: &ParserConfig) -> Self {
        Self {
            max_input_length: config.max_input_length,
        }
    }

    /// Parse using the current time as the parse timestamp.
    pub fn parse(&self, raw: &RawInput) -> Result<StructuredPrompt> {
        self.parse_at(raw, Utc::now())
    }

    /// Parse with an explicit parse timestamp.
    ///
    /// Fails with [`PexError::EmptyContent`] when the input, or the prompt
    /// text found inside a structured document, is blank or normalizes to
    /// nothing.
    pub fn parse_at(&self, raw: &RawInput, parsed_at: DateTime<Utc>) -> Result<StructuredPrompt> {
        if raw.content.trim().is_empty() {
            return Err(PexError::EmptyContent);
        }

        let content = normalize(&raw.content, self.max_input_length);

        match raw.source_kind {
            SourceKind::Text | SourceKind::Document => {
                Ok(text_prompt(non_empty(content)?, raw.source_kind, parsed_at))
            }
            SourceKind::Structured => match interpret_document(&raw.content) {
                Some(document) => self.document_prompt(content, document, parsed_at),
                None => {
                    debug!("structured input is not a key-value document, parsing as text");
                    Ok(text_prompt(non_empty(content)?, SourceKind::Text, parsed_at))
                }
            },
        }
    }

    fn document_prompt(
        &self,
        fallback_content: String,
        document: Metadata,
        parsed_at: DateTime<Utc>,
    ) -> Result<StructuredPrompt> {
        let content_field = CONTENT_FIELDS
            .iter()
            .find(|field| document.get(**field).is_some_and(Value::is_string))
            .copied();

        let content = match content_field.and_then(|field| document[field].as_str()) {
            Some(text) => normalize(text, self.max_input_length),
            None => fallback_content,
        };

        let mut prompt = text_prompt(non_empty(content)?, SourceKind::Structured, parsed_at);
        for (key, value) in document {
            if Some(key.as_str()) == content_field {
                continue;
            }
            // Component keys only ever reach metadata through `components`.
            if let Some(set) = component_set(&mut prompt.components, &key) {
                if let Some(items) = component_items(&value) {
                    *set = items;
                }
                continue;
            }
            prompt.metadata.insert(key, value);
        }
        prompt.components.write_into(&mut prompt.metadata);

        Ok(prompt)
    }
}

/// Trim, collapse whitespace runs to single spaces, and cut off at
/// `max_chars` characters.
#[must_use]
pub fn normalize(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_chars)
}

/// Hard cutoff at a character count, never splitting a code point.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

fn non_empty(content: String) -> Result<String> {
    if content.is_empty() {
        return Err(PexError::EmptyContent);
    }
    Ok(content)
}

fn text_prompt(content: String, kind: SourceKind, parsed_at: DateTime<Utc>) -> StructuredPrompt {
    let components = extract_components(&content);

    let mut metadata = Metadata::new();
    metadata.insert("type".to_string(), Value::from(kind.id()));
    metadata.insert(
        "parsed_at".to_string(),
        Value::from(parsed_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    metadata.insert(
        "word_count".to_string(),
        Value::from(content.split(' ').count()),
    );
    components.write_into(&mut metadata);

    StructuredPrompt {
        content,
        components,
        metadata,
    }
}

fn component_set<'a>(
    components: &'a mut Components,
    key: &str,
) -> Option<&'a mut BTreeSet<String>> {
    match key {
        "styles" => Some(&mut components.styles),
        "qualities" => Some(&mut components.qualities),
        "subjects" => Some(&mut components.subjects),
        "settings" => Some(&mut components.settings),
        _ => None,
    }
}

/// A document's component value: one string or an array of strings,
/// lowercased. Anything else leaves the extracted set alone.
fn component_items(value: &Value) -> Option<BTreeSet<String>> {
    let items: Vec<&str> = match value {
        Value::String(item) => vec![item.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => return None,
    };
    Some(
        items
            .into_iter()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_lowercase)
            .collect(),
    )
}

/// Read content as a JSON object, then as a YAML mapping.
fn interpret_document(raw: &str) -> Option<Metadata> {
    let trimmed = raw.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return Some(map);
    }
    match serde_yaml::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
