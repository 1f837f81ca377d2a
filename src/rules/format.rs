//! Export format rule tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PexError;

/// Serialization format of an export file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Txt,
    Csv,
    Xml,
}

impl ExportFormat {
    pub const ALL: [Self; 4] = [Self::Json, Self::Txt, Self::Csv, Self::Xml];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Txt => "txt",
            Self::Csv => "csv",
            Self::Xml => "xml",
        }
    }

    #[must_use]
    pub const fn profile(self) -> &'static FormatProfile {
        match self {
            Self::Json => &JSON_PROFILE,
            Self::Txt => &TXT_PROFILE,
            Self::Csv => &CSV_PROFILE,
            Self::Xml => &XML_PROFILE,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = PexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "txt" | "text" => Ok(Self::Txt),
            "csv" => Ok(Self::Csv),
            "xml" => Ok(Self::Xml),
            _ => Err(PexError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Serialization conventions for one export format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatProfile {
    pub format: ExportFormat,
    pub display_name: &'static str,
    pub extension: &'static str,
    pub mime_type: &'static str,
    pub indent_width: usize,
    pub csv_delimiter: char,
    pub include_header: bool,
    pub include_metadata: bool,
    /// Root element of a single-prompt XML document.
    pub root_element: &'static str,
    /// Root element wrapping several prompts.
    pub collection_element: &'static str,
}

const JSON_PROFILE: FormatProfile = FormatProfile {
    format: ExportFormat::Json,
    display_name: "JSON",
    extension: "json",
    mime_type: "application/json",
    indent_width: 2,
    csv_delimiter: ',',
    include_header: false,
    include_metadata: true,
    root_element: "prompt",
    collection_element: "prompts",
};

const TXT_PROFILE: FormatProfile = FormatProfile {
    format: ExportFormat::Txt,
    display_name: "Plain Text",
    extension: "txt",
    mime_type: "text/plain",
    indent_width: 0,
    csv_delimiter: ',',
    include_header: false,
    include_metadata: true,
    root_element: "prompt",
    collection_element: "prompts",
};

const CSV_PROFILE: FormatProfile = FormatProfile {
    format: ExportFormat::Csv,
    display_name: "CSV",
    extension: "csv",
    mime_type: "text/csv",
    indent_width: 0,
    csv_delimiter: ',',
    include_header: true,
    include_metadata: true,
    root_element: "prompt",
    collection_element: "prompts",
};

const XML_PROFILE: FormatProfile = FormatProfile {
    format: ExportFormat::Xml,
    display_name: "XML",
    extension: "xml",
    mime_type: "application/xml",
    indent_width: 2,
    csv_delimiter: ',',
    include_header: true,
    include_metadata: true,
    root_element: "prompt",
    collection_element: "prompts",
};
