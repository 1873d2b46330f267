//! Configuration management for novelsync.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use crate::scrapers::StrategyConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application name used for config and data directories.
const APP_NAME: &str = "novelsync";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Longest delay, in seconds, accepted for any configured wait.
pub const MAX_DELAY_SEC: f64 = 3600.0;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Web scraping settings.
    pub scraping: ScrapingConfig,

    /// File paths.
    pub paths: PathsConfig,

    /// Site strategies registered in addition to the built-in ones.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sites: Vec<StrategyConfig>,
}

/// Web scraping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Maximum chapter pages fetched at the same time.
    pub concurrency: usize,

    /// Total attempts for a page answering 503.
    pub retry_attempts: u32,

    /// Delay between 503 retries in seconds.
    pub retry_delay_sec: f64,

    /// Delay before every web request in seconds.
    pub delay_between_requests_sec: f64,

    /// Per-request timeout in seconds.
    pub timeout_sec: u64,

    pub user_agent: String,

    /// Enable scraper debug logging.
    pub debug: bool,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            concurrency: 7,
            retry_attempts: 3,
            retry_delay_sec: 5.0,
            delay_between_requests_sec: 0.0,
            timeout_sec: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            debug: false,
        }
    }
}

/// File path configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding one JSON file per novel.
    pub store_directory: Option<PathBuf>,
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        if self.scraping.concurrency == 0 {
            return Err(invalid("scraping.concurrency", "must be greater than 0"));
        }

        if self.scraping.retry_attempts == 0 {
            return Err(invalid("scraping.retry_attempts", "must be greater than 0"));
        }

        let delays = [
            ("scraping.retry_delay_sec", self.scraping.retry_delay_sec),
            (
                "scraping.delay_between_requests_sec",
                self.scraping.delay_between_requests_sec,
            ),
        ];
        for (key, delay) in delays {
            if !delay.is_finite() || !(0.0..=MAX_DELAY_SEC).contains(&delay) {
                return Err(invalid(key, "must be between 0 and 3600 seconds"));
            }
        }

        Ok(())
    }

    /// Returns the effective store directory, using config or default.
    pub fn store_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref dir) = self.paths.store_directory {
            Ok(dir.clone())
        } else {
            dirs::data_dir()
                .map(|p| p.join(APP_NAME))
                .ok_or(ConfigError::NoConfigDir)
        }
    }
}
