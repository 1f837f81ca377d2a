//! Turning sources into pipeline items.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{PexError, Result};

use super::types::{RawInput, SourceKind};

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)*").unwrap());

/// Split one source into the items the pipeline processes.
///
/// Text is a single item. Documents split into paragraphs on blank lines.
/// A structured source holding a JSON or YAML sequence yields one item per
/// element; any other structured source is a single item.
#[must_use]
pub fn split_source(raw: &RawInput) -> Vec<RawInput> {
    match raw.source_kind {
        SourceKind::Text => vec![raw.clone()],
        SourceKind::Document => {
            let normalized = raw.content.replace("\r\n", "\n");
            let paragraphs: Vec<RawInput> = BLANK_LINES
                .split(&normalized)
                .map(str::trim)
                .filter(|paragraph| !paragraph.is_empty())
                .map(|paragraph| RawInput::new(paragraph, SourceKind::Document))
                .collect();
            if paragraphs.is_empty() {
                vec![raw.clone()]
            } else {
                paragraphs
            }
        }
        SourceKind::Structured => match sequence_items(&raw.content) {
            Some(items) => items.iter().map(item_input).collect(),
            None => vec![raw.clone()],
        },
    }
}

fn sequence_items(content: &str) -> Option<Vec<Value>> {
    let trimmed = content.trim();
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
        return Some(items);
    }
    match serde_yaml::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

fn item_input(item: &Value) -> RawInput {
    match item {
        Value::String(text) => RawInput::text(text.clone()),
        Value::Object(_) => RawInput::new(item.to_string(), SourceKind::Structured),
        other => RawInput::text(other.to_string()),
    }
}

/// Batch source collaborator: resolves a folder id to raw items.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, folder_id: &str) -> Result<Vec<RawInput>>;
}

/// Reads the files of `<root>/<folder_id>`, one item per file.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder_path(&self, folder_id: &str) -> Result<PathBuf> {
        let id = folder_id.trim();
        if id.is_empty()
            || id.contains(['/', '\\'])
            || id.contains("..")
            || Path::new(id).is_absolute()
        {
            return Err(PexError::InvalidInput(format!("invalid folder id '{folder_id}'")));
        }
        let path = self.root.join(id);
        if !path.is_dir() {
            return Err(PexError::NotFound(format!("folder '{id}'")));
        }
        Ok(path)
    }
}

/// Source kind implied by a file extension.
#[must_use]
pub fn kind_for_path(path: &Path) -> SourceKind {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json" | "yaml" | "yml") => SourceKind::Structured,
        Some("md" | "markdown") => SourceKind::Document,
        _ => SourceKind::Text,
    }
}

#[async_trait]
impl DocumentSource for DirectorySource {
    async fn fetch(&self, folder_id: &str) -> Result<Vec<RawInput>> {
        let folder = self.folder_path(folder_id)?;

        let mut files = Vec::new();
        for entry in WalkDir::new(&folder)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if entry.file_type().is_file() && !hidden {
                files.push(entry.into_path());
            }
        }

        let mut items = Vec::with_capacity(files.len());
        for path in files {
            let content = tokio::fs::read_to_string(&path).await?;
            let kind = kind_for_path(&path);
            debug!(path = %path.display(), kind = %kind, "read source file");
            items.push(RawInput::new(content, kind));
        }

        info!(folder = folder_id, files = items.len(), "fetched batch folder");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::SourceFixture;

    #[test]
    fn text_is_a_single_item() {
        let raw = RawInput::text("one\n\ntwo");
        assert_eq!(split_source(&raw), vec![raw]);
    }

    #[test]
    fn documents_split_on_blank_lines() {
        let raw = RawInput::new("# Title\n\nfirst para\nstill first\n\n  \n\nsecond\r\n\r\nthird", SourceKind::Document);
        let items = split_source(&raw);
        let contents: Vec<&str> = items.iter().map(|item| item.content.as_str()).collect();
        assert_eq!(contents, ["# Title", "first para\nstill first", "second", "third"]);
        assert!(items.iter().all(|item| item.source_kind == SourceKind::Document));
    }

    #[test]
    fn blank_document_stays_one_item() {
        let raw = RawInput::new("  \n\n ", SourceKind::Document);
        assert_eq!(split_source(&raw).len(), 1);
    }

    #[test]
    fn structured_arrays_become_items() {
        let raw = RawInput::new(
            r#"["a cat", {"prompt": "a dog", "mood": "calm"}, 42]"#,
            SourceKind::Structured,
        );
        let items = split_source(&raw);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], RawInput::text("a cat"));
        assert_eq!(items[1].source_kind, SourceKind::Structured);
        assert!(items[1].content.contains("a dog"));
        assert_eq!(items[2].content, "42");
    }

    #[test]
    fn structured_yaml_sequence_becomes_items() {
        let raw = RawInput::new("- prompt: a fox\n- prompt: an owl\n", SourceKind::Structured);
        assert_eq!(split_source(&raw).len(), 2);
    }

    #[test]
    fn structured_object_is_one_item() {
        let raw = RawInput::new(r#"{"prompt": "a dog"}"#, SourceKind::Structured);
        assert_eq!(split_source(&raw), vec![raw]);
    }

    #[test]
    fn kind_follows_extension() {
        assert_eq!(kind_for_path(Path::new("a.JSON")), SourceKind::Structured);
        assert_eq!(kind_for_path(Path::new("a.yml")), SourceKind::Structured);
        assert_eq!(kind_for_path(Path::new("notes.md")), SourceKind::Document);
        assert_eq!(kind_for_path(Path::new("plain")), SourceKind::Text);
    }

    #[tokio::test]
    async fn directory_source_reads_sorted_files() {
        let fixture = SourceFixture::new();
        fixture.create_file("spring/b.md", "para one\n\npara two");
        fixture.create_file("spring/a.txt", "a cat");
        fixture.create_file("spring/.hidden", "skip me");
        fixture.create_file("spring/nested/c.txt", "not read");

        let source = DirectorySource::new(fixture.root());
        let items = source.fetch("spring").await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0], RawInput::text("a cat"));
        assert_eq!(items[1].source_kind, SourceKind::Document);
    }

    #[tokio::test]
    async fn directory_source_rejects_traversal() {
        let fixture = SourceFixture::new();
        let source = DirectorySource::new(fixture.root());
        for id in ["../etc", "a/b", "", ".."] {
            let err = source.fetch(id).await.unwrap_err();
            assert!(matches!(err, PexError::InvalidInput(_)), "{id}: {err:?}");
        }
    }

    #[tokio::test]
    async fn directory_source_missing_folder() {
        let fixture = SourceFixture::new();
        let source = DirectorySource::new(fixture.root());
        let err = source.fetch("nowhere").await.unwrap_err();
        assert!(matches!(err, PexError::NotFound(_)));
    }
}
