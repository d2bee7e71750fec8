//! Environment variable overrides

use super::Config;
use crate::utils::error::{HubError, Result};
use std::env;
use std::path::PathBuf;
use tracing::debug;

impl Config {
    /// Apply `HUB_*` environment variables on top of the current values
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| env::var(key).ok())
    }

    pub(crate) fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("HUB_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Some(key) = lookup("HUB_ANON_KEY") {
            self.backend.anon_key = key;
        }
        if let Some(token) = lookup("HUB_ACCESS_TOKEN") {
            self.backend.access_token = Some(token);
        }
        if let Some(schema) = lookup("HUB_SCHEMA") {
            self.backend.schema = schema;
        }
        if let Some(timeout) = lookup("HUB_TIMEOUT_SECS") {
            self.backend.timeout_secs = timeout
                .parse()
                .map_err(|e| HubError::Config(format!("Invalid HUB_TIMEOUT_SECS: {}", e)))?;
        }
        if let Some(state_file) = lookup("HUB_STATE_FILE") {
            self.session.state_file = PathBuf::from(state_file);
        }
        if let Some(level) = lookup("HUB_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("HUB_LOG_FORMAT") {
            self.logging.format = format.parse().map_err(HubError::Config)?;
        }

        debug!("Applied environment overrides");
        Ok(())
    }
}
