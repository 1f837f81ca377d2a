//! Pure renderers for the export formats.
//!
//! Every function takes the timestamp as an argument so output is
//! deterministic for a given input. A single prompt and a collection of
//! prompts render differently; see [`render_one`] and [`render_many`].

use chrono::{DateTime, SecondsFormat, Utc};
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::rules::{ExportFormat, FormatProfile};

use super::types::{Metadata, ShapedPrompt};

/// Render one prompt as a standalone document.
pub fn render_one(prompt: &ShapedPrompt, format: ExportFormat, at: DateTime<Utc>) -> Result<String> {
    let profile = format.profile();
    let timestamp = timestamp(at);
    match format {
        ExportFormat::Json => json_document(&json_record(prompt, profile, &timestamp), profile),
        ExportFormat::Txt => Ok(txt_block(prompt, profile, &timestamp)),
        ExportFormat::Csv => Ok(csv_table(std::slice::from_ref(prompt), profile, &timestamp)),
        ExportFormat::Xml => Ok(xml_single(prompt, profile, &timestamp)),
    }
}

/// Render several prompts into one collection document.
pub fn render_many(prompts: &[ShapedPrompt], format: ExportFormat, at: DateTime<Utc>) -> Result<String> {
    let profile = format.profile();
    let timestamp = timestamp(at);
    match format {
        ExportFormat::Json => {
            let records: Vec<_> = prompts
                .iter()
                .map(|prompt| json_record(prompt, profile, &timestamp))
                .collect();
            json_document(&records, profile)
        }
        ExportFormat::Txt => Ok(prompts
            .iter()
            .map(|prompt| txt_block(prompt, profile, &timestamp))
            .join("---\n")),
        ExportFormat::Csv => Ok(csv_table(prompts, profile, &timestamp)),
        ExportFormat::Xml => Ok(xml_collection(prompts, profile, &timestamp)),
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Scalars as bare text, sequences joined with `separator`, mappings as
/// compact JSON.
fn flatten_value(value: &Value, separator: &str) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .join(separator),
    }
}

fn sorted_entries(metadata: &Metadata) -> impl Iterator<Item = (&String, &Value)> {
    metadata.iter().sorted_by(|a, b| a.0.cmp(b.0))
}

// =============================================================================
// JSON
// =============================================================================

#[derive(Serialize)]
struct JsonRecord<'a> {
    prompt: &'a str,
    timestamp: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Metadata>,
}

fn json_record<'a>(prompt: &'a ShapedPrompt, profile: &FormatProfile, timestamp: &'a str) -> JsonRecord<'a> {
    JsonRecord {
        prompt: &prompt.content,
        timestamp,
        metadata: profile.include_metadata.then_some(&prompt.metadata),
    }
}

fn json_document<T: Serialize>(value: &T, profile: &FormatProfile) -> Result<String> {
    let indent = " ".repeat(profile.indent_width);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

// =============================================================================
// TXT
// =============================================================================

fn txt_block(prompt: &ShapedPrompt, profile: &FormatProfile, timestamp: &str) -> String {
    let mut out = format!("{}\n\ntimestamp: {timestamp}\n", prompt.content);
    if profile.include_metadata {
        for (key, value) in sorted_entries(&prompt.metadata) {
            out.push_str(&format!("{key}: {}\n", flatten_value(value, ", ")));
        }
    }
    out
}

// =============================================================================
// CSV
// =============================================================================

fn csv_table(prompts: &[ShapedPrompt], profile: &FormatProfile, timestamp: &str) -> String {
    let delimiter = profile.csv_delimiter.to_string();
    let keys: Vec<&String> = if profile.include_metadata {
        prompts
            .iter()
            .flat_map(|prompt| prompt.metadata.keys())
            .sorted()
            .dedup()
            .collect()
    } else {
        Vec::new()
    };

    let mut out = String::new();
    if profile.include_header {
        let header = ["prompt", "timestamp"]
            .into_iter()
            .chain(keys.iter().map(|key| key.as_str()))
            .map(|cell| header_cell(cell, profile.csv_delimiter))
            .join(&delimiter);
        out.push_str(&header);
        out.push('\n');
    }

    for prompt in prompts {
        let row = [prompt.content.clone(), timestamp.to_string()]
            .into_iter()
            .chain(keys.iter().map(|key| {
                prompt
                    .metadata
                    .get(key.as_str())
                    .map(|value| flatten_value(value, "; "))
                    .unwrap_or_default()
            }))
            .map(|cell| quote_csv(&cell))
            .join(&delimiter);
        out.push_str(&row);
        out.push('\n');
    }
    out
}

fn quote_csv(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn header_cell(cell: &str, delimiter: char) -> String {
    if cell.contains(delimiter) || cell.contains('"') || cell.contains('\n') {
        quote_csv(cell)
    } else {
        cell.to_string()
    }
}

// =============================================================================
// XML
// =============================================================================

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

struct XmlWriter {
    out: String,
    indent: String,
}

impl XmlWriter {
    fn new(profile: &FormatProfile) -> Self {
        Self {
            out: format!("{XML_DECLARATION}\n"),
            indent: " ".repeat(profile.indent_width),
        }
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(&self.indent);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn prompt(&mut self, depth: usize, prompt: &ShapedPrompt, profile: &FormatProfile, timestamp: &str) {
        let root = profile.root_element;
        self.line(depth, &format!("<{root}>"));
        self.line(depth + 1, &format!("<content>{}</content>", cdata(&prompt.content)));
        self.line(depth + 1, &format!("<timestamp>{}</timestamp>", escape_xml(timestamp)));
        if profile.include_metadata {
            if prompt.metadata.is_empty() {
                self.line(depth + 1, "<metadata/>");
            } else {
                self.line(depth + 1, "<metadata>");
                for (key, value) in sorted_entries(&prompt.metadata) {
                    self.value(depth + 2, &xml_name(key), value);
                }
                self.line(depth + 1, "</metadata>");
            }
        }
        self.line(depth, &format!("</{root}>"));
    }

    fn value(&mut self, depth: usize, name: &str, value: &Value) {
        match value {
            Value::Null => self.line(depth, &format!("<{name}/>")),
            Value::Array(items) if items.is_empty() => self.line(depth, &format!("<{name}/>")),
            Value::Array(items) => {
                self.line(depth, &format!("<{name}>"));
                for item in items {
                    self.value(depth + 1, "item", item);
                }
                self.line(depth, &format!("</{name}>"));
            }
            Value::Object(_) => {
                self.line(depth, &format!("<{name}>{}</{name}>", cdata(&value.to_string())));
            }
            Value::String(text) => self.line(depth, &format!("<{name}>{}</{name}>", escape_xml(text))),
            Value::Bool(_) | Value::Number(_) => self.line(depth, &format!("<{name}>{value}</{name}>")),
        }
    }
}

fn xml_single(prompt: &ShapedPrompt, profile: &FormatProfile, timestamp: &str) -> String {
    let mut writer = XmlWriter::new(profile);
    writer.prompt(0, prompt, profile, timestamp);
    writer.out
}

fn xml_collection(prompts: &[ShapedPrompt], profile: &FormatProfile, timestamp: &str) -> String {
    let mut writer = XmlWriter::new(profile);
    let root = profile.collection_element;
    writer.line(0, &format!("<{root}>"));
    for prompt in prompts {
        writer.prompt(1, prompt, profile, timestamp);
    }
    writer.line(0, &format!("</{root}>"));
    writer.out
}

/// Wrap text in CDATA, splitting any embedded terminator.
fn cdata(text: &str) -> String {
    let text: String = text.chars().filter(|ch| is_xml_char(*ch)).collect();
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars().filter(|ch| is_xml_char(*ch)) {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Characters allowed in an XML 1.0 document. Others are dropped, even
/// inside CDATA.
const fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Coerce a metadata key into a valid XML element name.
fn xml_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if !name.starts_with(|ch: char| ch.is_ascii_alphabetic() || ch == '_') {
        name.insert(0, '_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Platform;
    use crate::test_utils::fixtures::fixed_timestamp;
    use serde_json::json;

    fn shaped(content: &str, metadata: Value) -> ShapedPrompt {
        let Value::Object(metadata) = metadata else {
            panic!("metadata must be an object");
        };
        ShapedPrompt {
            content: content.to_string(),
            metadata,
            platform: Platform::Midjourney,
        }
    }

    fn sample() -> ShapedPrompt {
        shaped(
            "Cinematic urban scene, cinematic",
            json!({
                "params": {"ar": "16:9"},
                "styles": ["cinematic", "noir"],
                "word_count": 4
            }),
        )
    }

    #[test]
    fn json_round_trips_content_and_metadata() {
        let prompt = sample();
        let out = render_one(&prompt, ExportFormat::Json, fixed_timestamp()).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(parsed["prompt"], prompt.content);
        assert_eq!(parsed["timestamp"], "2024-01-15T10:30:00Z");
        assert_eq!(parsed["metadata"], Value::Object(prompt.metadata));
        assert!(out.contains("\n  \"prompt\""));
    }

    #[test]
    fn json_collection_is_an_array() {
        let prompts = vec![sample(), shaped("second", json!({}))];
        let out = render_many(&prompts, ExportFormat::Json, fixed_timestamp()).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[1]["prompt"], "second");
    }

    #[test]
    fn txt_lists_timestamp_then_metadata() {
        let out = render_one(&sample(), ExportFormat::Txt, fixed_timestamp()).unwrap();
        insta::assert_snapshot!(out, @r#"
        Cinematic urban scene, cinematic

        timestamp: 2024-01-15T10:30:00Z
        params: {"ar":"16:9"}
        styles: cinematic, noir
        word_count: 4
        "#);
    }

    #[test]
    fn txt_collection_uses_separator_lines() {
        let prompts = vec![shaped("one", json!({})), shaped("two", json!({}))];
        let out = render_many(&prompts, ExportFormat::Txt, fixed_timestamp()).unwrap();
        assert_eq!(
            out,
            "one\n\ntimestamp: 2024-01-15T10:30:00Z\n---\ntwo\n\ntimestamp: 2024-01-15T10:30:00Z\n"
        );
    }

    #[test]
    fn csv_quotes_every_value() {
        let prompt = shaped(r#"a "quoted", prompt"#, json!({"styles": ["anime", "noir"]}));
        let out = render_one(&prompt, ExportFormat::Csv, fixed_timestamp()).unwrap();
        assert_eq!(
            out,
            "prompt,timestamp,styles\n\"a \"\"quoted\"\", prompt\",\"2024-01-15T10:30:00Z\",\"anime; noir\"\n"
        );
    }

    #[test]
    fn csv_collection_uses_key_union() {
        let prompts = vec![
            shaped("one", json!({"mood": "calm"})),
            shaped("two", json!({"author": "ana"})),
        ];
        let out = render_many(&prompts, ExportFormat::Csv, fixed_timestamp()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "prompt,timestamp,author,mood");
        assert_eq!(lines[1], r#""one","2024-01-15T10:30:00Z","","calm""#);
        assert_eq!(lines[2], r#""two","2024-01-15T10:30:00Z","ana","""#);
    }

    #[test]
    fn xml_single_document() {
        let out = render_one(&sample(), ExportFormat::Xml, fixed_timestamp()).unwrap();
        insta::assert_snapshot!(out, @r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <prompt>
          <content><![CDATA[Cinematic urban scene, cinematic]]></content>
          <timestamp>2024-01-15T10:30:00Z</timestamp>
          <metadata>
            <params><![CDATA[{"ar":"16:9"}]]></params>
            <styles>
              <item>cinematic</item>
              <item>noir</item>
            </styles>
            <word_count>4</word_count>
          </metadata>
        </prompt>
        "#);
    }

    #[test]
    fn xml_collection_wraps_prompts() {
        let prompts = vec![shaped("one", json!({})), shaped("two", json!({}))];
        let out = render_many(&prompts, ExportFormat::Xml, fixed_timestamp()).unwrap();
        assert!(out.starts_with(XML_DECLARATION));
        assert!(out.contains("<prompts>\n  <prompt>\n    <content><![CDATA[one]]></content>"));
        assert!(out.trim_end().ends_with("</prompts>"));
        assert_eq!(out.matches("<metadata/>").count(), 2);
    }

    #[test]
    fn xml_escapes_and_sanitizes() {
        let prompt = shaped(
            "ends with ]]> marker",
            json!({"1st key": "a < b & c", "empty": null}),
        );
        let out = render_one(&prompt, ExportFormat::Xml, fixed_timestamp()).unwrap();
        assert!(out.contains("<![CDATA[ends with ]]]]><![CDATA[> marker]]>"));
        assert!(out.contains("<_1st_key>a &lt; b &amp; c</_1st_key>"));
        assert!(out.contains("<empty/>"));
    }

    #[test]
    fn xml_drops_control_characters() {
        let prompt = shaped(
            "a\u{1}b\tc",
            json!({"note": "x\u{8}y", "tags": ["p\u{1f}q"]}),
        );
        let out = render_one(&prompt, ExportFormat::Xml, fixed_timestamp()).unwrap();

        assert!(!out.chars().any(|ch| ch.is_control() && !matches!(ch, '\t' | '\n' | '\r')));
        assert!(out.contains("<content><![CDATA[ab\tc]]></content>"));
        assert!(out.contains("<note>xy</note>"));
        assert!(out.contains("<item>pq</item>"));
    }
}
