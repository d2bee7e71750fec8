//! Configuration management for the hub
//!
//! This module handles loading, validation, and management of hub configuration.
//! Sources are layered: a YAML file, then `HUB_*` environment variables (a
//! `.env` file is read first when present), then validation.

mod loader;
pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::core::counters::{CounterSpec, presets};
use crate::utils::error::{HubError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct for the hub
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Badge counters to keep in sync
    #[serde(default = "presets::all")]
    pub counters: Vec<CounterSpec>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            realtime: RealtimeConfig::default(),
            session: SessionConfig::default(),
            retry: RetryConfig::default(),
            counters: presets::all(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| HubError::Config(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_yaml(&content)?;
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse YAML without validating
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| HubError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// File (when given, and then it must exist), then `.env` and environment
    /// overrides
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!("Loaded environment from {:?}", env_file);
        }

        let mut config = match path {
            Some(p) if p.exists() => {
                let content = tokio::fs::read_to_string(p).await.map_err(|e| {
                    HubError::Config(format!("Failed to read config file: {}", e))
                })?;
                info!("Loading configuration from: {:?}", p);
                Self::from_yaml(&content)?
            }
            Some(p) => {
                return Err(HubError::Config(format!(
                    "Config file {} does not exist",
                    p.display()
                )));
            }
            None => Self::default(),
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        Validate::validate(self).map_err(HubError::Config)?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| HubError::Config(format!("Failed to serialize config to YAML: {}", e)))
    }
}
