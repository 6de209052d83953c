//! File configuration.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults observed on front-desk deployments (reader 0, 15 second
//! capture budget, first-match identification).

use crate::extraction::EnhanceConfig;
use crate::matching::MatchPolicy;
use crate::store::StoreConfig;
use crate::workflow::CaptureConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Longest capture budget accepted from configuration.
pub const MAX_TIMEOUT_SECS: f64 = 3600.0;

/// Largest preview upscale factor accepted from configuration.
pub const MAX_UPSCALE: u32 = 8;

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("capture timeout must be between 0 and 3600 seconds")]
    InvalidTimeout,
    #[error("poll interval must be at least 1 ms")]
    InvalidPollInterval,
    #[error("upscale factor must be between 1 and 8")]
    InvalidUpscale,
    #[error("percentiles must satisfy 0 <= low < high <= 100")]
    InvalidPercentiles,
    #[error("template store query is empty")]
    EmptyQuery,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Identification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Candidate scan policy.
    pub policy: MatchPolicy,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 8000).into(),
        }
    }
}

impl ServerConfig {
    /// Creates a config listening on all interfaces at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub enhance: EnhanceConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeout = self.capture.timeout_secs;
        if !timeout.is_finite() || !(0.0..=MAX_TIMEOUT_SECS).contains(&timeout) {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.capture.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        if !(1..=MAX_UPSCALE).contains(&self.enhance.upscale) {
            return Err(ConfigError::InvalidUpscale);
        }
        let (low, high) = (self.enhance.low_percentile, self.enhance.high_percentile);
        if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
            return Err(ConfigError::InvalidPercentiles);
        }
        if self.store.query.trim().is_empty() {
            return Err(ConfigError::EmptyQuery);
        }
        Ok(())
    }
}
