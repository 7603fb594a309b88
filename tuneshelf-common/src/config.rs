//! Configuration loading
//!
//! Each setting resolves with priority:
//! 1. Environment variable
//! 2. TOML config file (path in `TUNESHELF_CONFIG`)
//! 3. Compiled default (optional settings only)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Environment variable naming the optional TOML config file
pub const CONFIG_FILE_ENV: &str = "TUNESHELF_CONFIG";

pub const PIPELINE_ID_ENV: &str = "PIPELINE_ID";
pub const MP3_PRESET_ID_ENV: &str = "MP3_PRESET_ID";
pub const TRACK_TABLE_ENV: &str = "DYNAMODB_MUSIC_TRACK_TABLE";
pub const ALBUM_TABLE_ENV: &str = "DYNAMODB_MUSIC_ALBUM_TABLE";
pub const ARTIST_TABLE_ENV: &str = "DYNAMODB_MUSIC_ARTIST_TABLE";
pub const SOURCE_URL_BASE_ENV: &str = "SOURCE_URL_BASE";
pub const FAILURE_POLICY_ENV: &str = "FAILURE_POLICY";

/// Default base for the MP3 locator
pub const DEFAULT_SOURCE_URL_BASE: &str = "https://s3.amazonaws.com";

/// What the orchestrator does with a failed stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and finish the invocation successfully
    #[default]
    LogAndDrop,
    /// Log the failure and fail the invocation once all work has completed,
    /// leaving retries to the event source
    Propagate,
}

impl std::str::FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log_and_drop" => Ok(FailurePolicy::LogAndDrop),
            "propagate" => Ok(FailurePolicy::Propagate),
            other => Err(Error::Config(format!(
                "Unknown failure policy '{}' (expected log_and_drop or propagate)",
                other
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// TOML config file contents; every field optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline_id: Option<String>,
    pub mp3_preset_id: Option<String>,
    pub track_table: Option<String>,
    pub album_table: Option<String>,
    pub artist_table: Option<String>,
    pub source_url_base: Option<String>,
    pub failure_policy: Option<FailurePolicy>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Load a TOML config file
    ///
    /// A missing file is not an error: warn and fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))?;

        info!(path = %path.display(), "Loaded config file");
        Ok(config)
    }
}

/// Names of the three view tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTables {
    pub track: String,
    pub album: String,
    pub artist: String,
}

/// Resolved configuration of the ingestion function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Transcoding pipeline receiving the jobs
    pub pipeline_id: String,
    /// Preset producing the MP3 rendition
    pub mp3_preset_id: String,
    pub tables: ViewTables,
    /// Base of the MP3 locator (`{base}/{bucket}/{key}`)
    pub source_url_base: String,
    pub failure_policy: FailurePolicy,
    pub logging: LoggingConfig,
}

impl IngestConfig {
    /// Resolve configuration from the process environment and the optional
    /// config file named by `TUNESHELF_CONFIG`
    pub fn from_env() -> Result<Self> {
        let toml_config = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => TomlConfig::load(Path::new(&path))?,
            _ => TomlConfig::default(),
        };

        Self::resolve_with(|name| std::env::var(name).ok(), &toml_config)
    }

    /// Resolve configuration from an arbitrary variable lookup and TOML config
    ///
    /// Blank values count as unset. Every missing required setting is
    /// reported in a single error.
    pub fn resolve_with<F>(lookup: F, toml_config: &TomlConfig) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |env_name: &str, file_value: &Option<String>| -> Option<String> {
            lookup(env_name)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file_value.clone().filter(|v| !v.trim().is_empty()))
        };

        let mut missing = Vec::new();
        let mut require = |env_name: &'static str, file_value: &Option<String>| {
            pick(env_name, file_value).unwrap_or_else(|| {
                missing.push(env_name);
                String::new()
            })
        };

        let pipeline_id = require(PIPELINE_ID_ENV, &toml_config.pipeline_id);
        let mp3_preset_id = require(MP3_PRESET_ID_ENV, &toml_config.mp3_preset_id);
        let track = require(TRACK_TABLE_ENV, &toml_config.track_table);
        let album = require(ALBUM_TABLE_ENV, &toml_config.album_table);
        let artist = require(ARTIST_TABLE_ENV, &toml_config.artist_table);

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing required settings: {}",
                missing.join(", ")
            )));
        }

        let source_url_base = pick(SOURCE_URL_BASE_ENV, &toml_config.source_url_base)
            .unwrap_or_else(|| DEFAULT_SOURCE_URL_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let failure_policy = match lookup(FAILURE_POLICY_ENV).filter(|v| !v.trim().is_empty()) {
            Some(value) => value.parse()?,
            None => toml_config.failure_policy.unwrap_or_default(),
        };

        Ok(Self {
            pipeline_id,
            mp3_preset_id,
            tables: ViewTables {
                track,
                album,
                artist,
            },
            source_url_base,
            failure_policy,
            logging: toml_config.logging.clone(),
        })
    }
}
