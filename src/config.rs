use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PexError, Result};
use crate::pipeline::DetailLevel;

/// File name of the project-level config, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "promptex.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub enhancement: EnhancementConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Build the effective configuration.
    ///
    /// Layers, lowest priority first: built-in defaults, the global config
    /// (`<config_dir>/promptex/config.toml`), the project config
    /// (`<project_root>/promptex.toml`), then `PROMPTEX_*` environment
    /// variables. An explicit path (argument or `PROMPTEX_CONFIG`) replaces
    /// the global and project files.
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("PROMPTEX_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            match Self::load_patch(&path)? {
                Some(patch) => config.merge_patch(patch),
                None => {
                    return Err(PexError::Config(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&project_root.join(PROJECT_CONFIG_FILE))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject settings no layer may produce.
    pub fn validate(&self) -> Result<()> {
        if self.parser.max_input_length == 0 {
            return Err(PexError::Config(
                "parser.max_input_length must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("promptex/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| PexError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| PexError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.parser {
            self.parser.merge(patch);
        }
        if let Some(patch) = patch.enhancement {
            self.enhancement.merge(patch);
        }
        if let Some(patch) = patch.export {
            self.export.merge(patch);
        }
        if let Some(patch) = patch.server {
            self.server.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_usize("PROMPTEX_PARSER_MAX_INPUT_LENGTH")? {
            self.parser.max_input_length = value;
        }

        if let Some(value) = env_bool("PROMPTEX_ENHANCEMENT_ENABLED") {
            self.enhancement.enabled = value;
        }
        if let Some(value) = env_string("PROMPTEX_ENHANCEMENT_DETAIL_LEVEL") {
            self.enhancement.default_detail_level = value.parse()?;
        }
        if let Some(value) = env_u64("PROMPTEX_ENHANCEMENT_TIMEOUT_MS")? {
            self.enhancement.timeout_ms = value;
        }

        if let Some(value) = env_string("PROMPTEX_EXPORT_DEFAULT_PLATFORM") {
            self.export.default_platform = value;
        }
        if let Some(value) = env_string("PROMPTEX_EXPORT_DEFAULT_FORMAT") {
            self.export.default_format = value;
        }
        if let Some(value) = env_string("PROMPTEX_EXPORT_OUTPUT_DIR") {
            self.export.output_dir = PathBuf::from(value);
        }
        if let Some(value) = env_bool("PROMPTEX_EXPORT_STRICT_PLATFORMS") {
            self.export.strict_platforms = value;
        }
        if let Some(value) = env_u64("PROMPTEX_EXPORT_UPLOAD_TIMEOUT_MS")? {
            self.export.upload_timeout_ms = value;
        }
        if let Some(value) = env_string("PROMPTEX_SOURCE_ROOT") {
            self.export.source_root = PathBuf::from(value);
        }

        if let Some(value) = env_string("PROMPTEX_SERVER_BIND") {
            self.server.bind = value;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Normalized input is cut off at this many characters.
    #[serde(default)]
    pub max_input_length: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_input_length: 10_000,
        }
    }
}

impl ParserConfig {
    fn merge(&mut self, patch: ParserPatch) {
        if let Some(value) = patch.max_input_length {
            self.max_input_length = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancementConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub default_detail_level: DetailLevel,
    #[serde(default)]
    pub timeout_ms: u64,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            default_detail_level: DetailLevel::Standard,
            timeout_ms: 5_000,
        }
    }
}

impl EnhancementConfig {
    fn merge(&mut self, patch: EnhancementPatch) {
        if let Some(value) = patch.enabled {
            self.enabled = value;
        }
        if let Some(value) = patch.default_detail_level {
            self.default_detail_level = value;
        }
        if let Some(value) = patch.timeout_ms {
            self.timeout_ms = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub default_platform: String,
    #[serde(default)]
    pub default_format: String,
    #[serde(default)]
    pub output_dir: PathBuf,
    /// Reject unknown platform ids instead of falling back to `custom`.
    #[serde(default)]
    pub strict_platforms: bool,
    #[serde(default)]
    pub upload_timeout_ms: u64,
    /// Directory whose subfolders are the batch folder ids.
    #[serde(default)]
    pub source_root: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_platform: "custom".to_string(),
            default_format: "json".to_string(),
            output_dir: PathBuf::from("exports"),
            strict_platforms: false,
            upload_timeout_ms: 10_000,
            source_root: PathBuf::from("prompts"),
        }
    }
}

impl ExportConfig {
    fn merge(&mut self, patch: ExportPatch) {
        if let Some(value) = patch.default_platform {
            self.default_platform = value;
        }
        if let Some(value) = patch.default_format {
            self.default_format = value;
        }
        if let Some(value) = patch.output_dir {
            self.output_dir = value;
        }
        if let Some(value) = patch.strict_platforms {
            self.strict_platforms = value;
        }
        if let Some(value) = patch.upload_timeout_ms {
            self.upload_timeout_ms = value;
        }
        if let Some(value) = patch.source_root {
            self.source_root = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

impl ServerConfig {
    fn merge(&mut self, patch: ServerPatch) {
        if let Some(value) = patch.bind {
            self.bind = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub parser: Option<ParserPatch>,
    pub enhancement: Option<EnhancementPatch>,
    pub export: Option<ExportPatch>,
    pub server: Option<ServerPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ParserPatch {
    pub max_input_length: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EnhancementPatch {
    pub enabled: Option<bool>,
    pub default_detail_level: Option<DetailLevel>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ExportPatch {
    pub default_platform: Option<String>,
    pub default_format: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub strict_platforms: Option<bool>,
    pub upload_timeout_ms: Option<u64>,
    pub source_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ServerPatch {
    pub bind: Option<String>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<usize>().map(Some).map_err(|err| {
            PexError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<u64>().map(Some).map_err(|err| {
            PexError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_defaults() {
        let config = Config::default();
        assert_eq!(config.parser.max_input_length, 10_000);
        assert!(!config.enhancement.enabled);
        assert_eq!(config.enhancement.default_detail_level, DetailLevel::Standard);
        assert_eq!(config.enhancement.timeout_ms, 5_000);
        assert_eq!(config.export.default_platform, "custom");
        assert_eq!(config.export.default_format, "json");
        assert_eq!(config.export.output_dir, PathBuf::from("exports"));
        assert!(!config.export.strict_platforms);
        assert_eq!(config.server.bind, "127.0.0.1:3000");
    }

    #[test]
    fn config_serialization_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.export.default_format, config.export.default_format);
        assert_eq!(
            parsed.enhancement.default_detail_level,
            config.enhancement.default_detail_level
        );
    }

    #[test]
    fn enhancement_detail_level_serializes_lowercase() {
        let json = serde_json::to_string(&EnhancementConfig::default()).unwrap();
        assert!(json.contains("\"default_detail_level\":\"standard\""));
    }

    #[test]
    fn load_patch_nonexistent_file() {
        let result = Config::load_patch(Path::new("/nonexistent/path/promptex.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_patch_partial_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("promptex.toml");
        std::fs::write(
            &path,
            r#"
[export]
default_platform = "midjourney"
"#,
        )
        .unwrap();

        let patch = Config::load_patch(&path).unwrap().unwrap();
        assert!(patch.export.is_some());
        assert!(patch.parser.is_none());
        assert!(patch.server.is_none());
    }

    #[test]
    fn load_patch_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("promptex.toml");
        std::fs::write(&path, "this is not valid toml [[[").unwrap();

        let err = Config::load_patch(&path).unwrap_err();
        assert!(matches!(err, PexError::Config(_)));
    }

    #[test]
    fn merge_patch_updates_only_given_values() {
        let mut config = Config::default();
        let patch = ConfigPatch {
            enhancement: Some(EnhancementPatch {
                enabled: Some(true),
                default_detail_level: None,
                timeout_ms: Some(250),
            }),
            ..Default::default()
        };

        config.merge_patch(patch);
        assert!(config.enhancement.enabled);
        assert_eq!(config.enhancement.timeout_ms, 250);
        assert_eq!(config.enhancement.default_detail_level, DetailLevel::Standard);
        assert_eq!(config.export.default_format, "json");
    }

    #[test]
    fn merge_patch_empty_noop() {
        let mut config = Config::default();
        config.merge_patch(ConfigPatch::default());
        assert_eq!(config.parser.max_input_length, 10_000);
        assert_eq!(config.server.bind, "127.0.0.1:3000");
    }

    #[test]
    fn load_from_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[parser]
max_input_length = 300

[enhancement]
default_detail_level = "detailed"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), temp.path()).unwrap();
        assert_eq!(config.parser.max_input_length, 300);
        assert_eq!(config.enhancement.default_detail_level, DetailLevel::Detailed);
    }

    #[test]
    fn load_rejects_zero_max_input_length() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "[parser]\nmax_input_length = 0\n").unwrap();

        let err = Config::load(Some(&path), temp.path()).unwrap_err();
        assert!(matches!(err, PexError::Config(msg) if msg.contains("max_input_length")));
    }

    #[test]
    fn load_missing_explicit_path_is_an_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        let err = Config::load(Some(&missing), temp.path()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn load_project_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            r#"
[server]
bind = "0.0.0.0:8080"
"#,
        )
        .unwrap();

        let config = Config::load(None, temp.path()).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
    }
}
