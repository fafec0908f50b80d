//! # Configuration
//!
//! Optional `cellmesh.toml` read at startup. Every field has a default, so
//! an empty file (or no file) is a valid configuration.
//!
//! ```toml
//! [output]
//! pretty = true
//!
//! [limits]
//! max_file_size = 104857600
//!
//! [log]
//! format = "json"
//! filter = "cellmesh=debug"
//! ```
//!
//! Precedence: command-line flags, then `CELLMESH_LOG_FORMAT` /
//! `RUST_LOG`, then this file, then the defaults below.

use cellmesh_core::{MAX_DOCUMENT_SIZE, MeshError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "cellmesh.toml";

/// Environment variable selecting the log format (`text` or `json`).
pub const LOG_FORMAT_ENV: &str = "CELLMESH_LOG_FORMAT";

/// Default `EnvFilter` directive.
pub const DEFAULT_LOG_FILTER: &str = "cellmesh=info";

// =============================================================================
// CONFIG STRUCTURE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub output: OutputConfig,
    pub limits: LimitsConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Indent written documents.
    pub pretty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Largest document file accepted, in bytes.
    pub max_file_size: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: MAX_DOCUMENT_SIZE as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parse `text` / `json`; anything else is `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub format: LogFormat,
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl Config {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, MeshError> {
        toml::from_str(text)
            .map_err(|e| MeshError::MalformedDocument(format!("Invalid configuration: {}", e)))
    }

    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, `cellmesh.toml` in the
    /// working directory is used when present, else the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, MeshError> {
        let path = match path {
            Some(explicit) => explicit,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let text = std::fs::read_to_string(path).map_err(|e| {
            MeshError::Io(format!(
                "Cannot read configuration '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply the value of `CELLMESH_LOG_FORMAT`, if it names a format.
    #[must_use]
    pub fn with_log_format_override(mut self, value: Option<&str>) -> Self {
        if let Some(format) = value.and_then(LogFormat::parse) {
            self.log.format = format;
        }
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
