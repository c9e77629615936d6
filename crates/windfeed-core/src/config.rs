//! Dashboard configuration stored in config.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::aggregate::TimeRange;
use crate::reading::RecordPolicy;

/// Errors that can occur while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid configuration JSON
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The values are inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Feed path holding the wind-speed records
    pub feed_path: String,

    /// Range selected when the wind view opens
    pub default_time_range: TimeRange,

    /// Ranges offered by the selector, in display order
    pub time_range_options: Vec<TimeRange>,

    /// What to do with records that fail to decode
    pub record_policy: RecordPolicy,

    /// Demo feed settings
    pub demo: DemoSettings,

    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            feed_path: "windSpeed".to_string(),
            default_time_range: TimeRange::default(),
            time_range_options: TimeRange::DEFAULT_OPTIONS.to_vec(),
            record_policy: RecordPolicy::default(),
            demo: DemoSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Demo feed behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Milliseconds between simulated readings
    pub interval_ms: u64,

    /// Oldest records beyond this count are trimmed (None = keep all)
    pub max_readings: Option<usize>,

    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_readings: Some(500),
            seed: None,
        }
    }
}

impl DashboardConfig {
    /// Default config file location: `<config dir>/windfeed/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("windfeed").join("config.json"))
    }

    /// Load and validate a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: DashboardConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, falling back to defaults if it doesn't exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_path.trim().trim_matches('/').is_empty() {
            return Err(ConfigError::Invalid("feed_path must not be empty".into()));
        }
        if self.time_range_options.is_empty() {
            return Err(ConfigError::Invalid(
                "time_range_options must list at least one range".into(),
            ));
        }
        if !self.time_range_options.contains(&self.default_time_range) {
            return Err(ConfigError::Invalid(format!(
                "default_time_range {} is not one of time_range_options",
                self.default_time_range
            )));
        }
        if self.demo.interval_ms == 0 {
            return Err(ConfigError::Invalid("demo.interval_ms must be greater than zero".into()));
        }
        Ok(())
    }
}
