//! Section validators

use super::trait_def::Validate;
use crate::config::Config;
use crate::config::models::*;
use crate::core::counters::CounterSpec;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Whether `name` is a plain SQL identifier (table, column or schema)
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

impl Validate for BackendConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating backend configuration");

        if !is_valid_identifier(&self.schema) {
            return Err(format!("Invalid schema name: {}", self.schema));
        }

        if self.timeout_secs == 0 {
            return Err("Backend timeout must be greater than 0".to_string());
        }

        if !self.is_configured() {
            return Ok(());
        }

        let url = url::Url::parse(&self.url)
            .map_err(|e| format!("Invalid backend URL '{}': {}", self.url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "Backend URL must use http or https, got '{}'",
                url.scheme()
            ));
        }

        if self.anon_key.trim().is_empty() {
            return Err("Backend anon_key is required when a URL is set".to_string());
        }

        Ok(())
    }
}

impl Validate for RealtimeConfig {
    fn validate(&self) -> Result<(), String> {
        if self.heartbeat_interval_secs == 0 {
            return Err("Heartbeat interval must be greater than 0".to_string());
        }
        if self.channel_capacity == 0 {
            return Err("Channel capacity must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Validate for SessionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.impersonation_key.trim().is_empty() {
            return Err("Impersonation key cannot be empty".to_string());
        }
        if self.state_file.as_os_str().is_empty() {
            return Err("State file path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Validate for RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(format!(
                "Initial retry delay ({}ms) exceeds max delay ({}ms)",
                self.initial_delay_ms, self.max_delay_ms
            ));
        }
        if self.max_retries > 20 {
            return Err("max_retries should not exceed 20".to_string());
        }
        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        tracing_subscriber::EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|e| format!("Invalid log level '{}': {}", self.level, e))
    }
}

impl Validate for CounterSpec {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Counter name cannot be empty".to_string());
        }
        if !is_valid_identifier(&self.collection) {
            return Err(format!(
                "Counter '{}' has invalid collection '{}'",
                self.name, self.collection
            ));
        }
        if let Some(schema) = &self.schema {
            if !is_valid_identifier(schema) {
                return Err(format!(
                    "Counter '{}' has invalid schema '{}'",
                    self.name, schema
                ));
            }
        }
        for filter in &self.filters {
            if !is_valid_identifier(&filter.column) {
                return Err(format!(
                    "Counter '{}' has invalid filter column '{}'",
                    self.name, filter.column
                ));
            }
        }
        Ok(())
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), String> {
        self.backend
            .validate()
            .map_err(|e| format!("Backend config error: {}", e))?;
        self.realtime
            .validate()
            .map_err(|e| format!("Realtime config error: {}", e))?;
        self.session
            .validate()
            .map_err(|e| format!("Session config error: {}", e))?;
        self.retry
            .validate()
            .map_err(|e| format!("Retry config error: {}", e))?;
        self.logging
            .validate()
            .map_err(|e| format!("Logging config error: {}", e))?;

        let mut names = HashSet::new();
        for counter in &self.counters {
            counter.validate()?;
            if !names.insert(counter.name.as_str()) {
                return Err(format!("Duplicate counter name: {}", counter.name));
            }
        }

        Ok(())
    }
}
