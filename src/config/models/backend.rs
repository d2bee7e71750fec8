//! Hosted backend configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the hosted backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://abc.example.co`; empty when unset
    #[serde(default)]
    pub url: String,
    /// Public (anon) API key sent with every request
    #[serde(default)]
    pub anon_key: String,
    /// User access token; falls back to the anon key when absent
    #[serde(default)]
    pub access_token: Option<String>,
    /// Database schema exposed by the REST layer
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            access_token: None,
            schema: default_schema(),
            timeout_secs: default_timeout(),
        }
    }
}

impl BackendConfig {
    /// Config pointing at `url` with `anon_key`
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            ..Default::default()
        }
    }

    /// Whether a backend URL has been provided
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Token for the `Authorization` header
    pub fn bearer_token(&self) -> &str {
        self.access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.anon_key)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
