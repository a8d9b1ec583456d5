use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME};

// =============================================================================
// Input Format Enum
// =============================================================================

/// Encoding of a message log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// JSON for an array or a single object, JSONL otherwise
    #[default]
    Auto,
    /// One JSON array, or an object with a `messages` array
    Json,
    /// One message object per line
    Jsonl,
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Auto => write!(f, "auto"),
            InputFormat::Json => write!(f, "json"),
            InputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Input configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct InputFileConfig {
    pub format: Option<InputFormat>,
}

/// Output configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OutputFileConfig {
    pub pretty: Option<bool>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub input: Option<InputFileConfig>,
    pub output: Option<OutputFileConfig>,
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(input) = other.input {
            let current = self.input.get_or_insert_with(InputFileConfig::default);
            if input.format.is_some() {
                tracing::trace!(format = ?input.format, "Merging input.format");
                current.format = input.format;
            }
        }

        if let Some(output) = other.output {
            let current = self.output.get_or_insert_with(OutputFileConfig::default);
            if output.pretty.is_some() {
                tracing::trace!(pretty = ?output.pretty, "Merging output.pretty");
                current.pretty = output.pretty;
            }
        }

        if other.debug.is_some() {
            tracing::trace!(debug = ?other.debug, "Merging debug");
            self.debug = other.debug;
        }
    }
}

// =============================================================================
// Resolved Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputConfig {
    pub format: InputFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputConfig {
    pub pretty: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub debug: bool,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.chatflow/chatflow.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_layered(cli, get_profile_config_path().as_deref(), Path::new(CONFIG_FILE_NAME))
    }

    fn load_layered(cli: &CliConfig, profile_path: Option<&Path>, local_path: &Path) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Profile dir - skip if not exists
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else if local_path.exists() {
            Some(local_path.to_path_buf())
        } else {
            None
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Layer: defaults -> file config -> CLI/env overrides
        let file_input = file_config.input.unwrap_or_default();
        let file_output = file_config.output.unwrap_or_default();

        let config = Self {
            input: InputConfig {
                format: cli.format.or(file_input.format).unwrap_or_default(),
            },
            output: OutputConfig {
                pretty: cli.pretty.or(file_output.pretty).unwrap_or(false),
            },
            debug: cli.debug || file_config.debug.unwrap_or(false),
        };

        tracing::debug!(
            format = %config.input.format,
            pretty = config.output.pretty,
            debug = config.debug,
            "Configuration loaded"
        );
        Ok(config)
    }
}

/// Get the profile config path (~/.chatflow/chatflow.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
