//! Application configuration, loaded from TOML.
//!
//! Every key is optional; missing keys take the defaults below. Directory
//! settings are handed to the cache and exporter at construction time.
//!
//! ```toml
//! api_key = "..."
//! base_url = "https://www.alphavantage.co/query"
//! cache_dir = "stock_data_cache"
//! export_dir = "stock_data_exports"
//! freshness_hours = 24
//! timeout_secs = 30
//! ma_windows = [20, 50]
//! ```

use crate::data::alphavantage::DEFAULT_BASE_URL;
use crate::data::cache::DEFAULT_FRESHNESS_HOURS;
use crate::indicators::DEFAULT_MA_WINDOWS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable consulted for the API key.
pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// `None` falls back to `ALPHAVANTAGE_API_KEY`, then `"demo"`.
    pub api_key: Option<String>,
    pub base_url: String,
    pub cache_dir: PathBuf,
    pub export_dir: PathBuf,
    pub freshness_hours: i64,
    pub timeout_secs: u64,
    pub ma_windows: Vec<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: PathBuf::from("stock_data_cache"),
            export_dir: PathBuf::from("stock_data_exports"),
            freshness_hours: DEFAULT_FRESHNESS_HOURS,
            timeout_secs: 30,
            ma_windows: DEFAULT_MA_WINDOWS.to_vec(),
        }
    }
}

impl AppConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load from `path` if it exists, otherwise defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse a config from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.freshness_hours <= 0 {
            return Err(ConfigError::Invalid("freshness_hours must be > 0".into()));
        }
        if chrono::Duration::try_hours(self.freshness_hours).is_none() {
            return Err(ConfigError::Invalid(format!(
                "freshness_hours {} is out of range",
                self.freshness_hours
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be > 0".into()));
        }
        if self.ma_windows.iter().any(|&w| w == 0) {
            return Err(ConfigError::Invalid("ma_windows entries must be >= 1".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        if matches!(&self.api_key, Some(k) if k.trim().is_empty()) {
            return Err(ConfigError::Invalid("api_key must not be empty".into()));
        }
        Ok(())
    }

    /// Fill `api_key` from the environment when the file did not set it.
    pub fn with_env_overrides(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        }
        self
    }

    /// Key to send with requests.
    pub fn effective_api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or("demo")
    }

    /// Saturates at the largest representable duration for unvalidated values.
    pub fn freshness(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.freshness_hours).unwrap_or(chrono::Duration::MAX)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
