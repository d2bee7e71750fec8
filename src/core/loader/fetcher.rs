//! Resource fetchers

use crate::storage::remote::error_for_status;
use crate::utils::error::{HubError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Produces the value behind a key
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    type Output: Send + Sync + 'static;

    async fn fetch(&self, key: &str) -> Result<Self::Output>;
}

/// Fetches text bodies over HTTP
///
/// Keys are absolute URLs, or paths resolved against the base URL when one is
/// set.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: Option<Url>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: None,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| HubError::config(format!("Invalid base URL '{}': {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        self.base_url = Some(base);
        Ok(self)
    }

    /// Absolute URL for `key`
    pub fn resolve(&self, key: &str) -> Result<Url> {
        match (Url::parse(key), &self.base_url) {
            (Ok(url), _) => Ok(url),
            (Err(_), Some(base)) => base
                .join(key.trim_start_matches('/'))
                .map_err(|e| HubError::validation(format!("Invalid resource '{}': {}", key, e))),
            (Err(e), None) => Err(HubError::validation(format!(
                "Invalid resource URL '{}': {}",
                key, e
            ))),
        }
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    type Output = String;

    async fn fetch(&self, key: &str) -> Result<String> {
        let url = self.resolve(key)?;
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        let response = error_for_status(response).await?;
        Ok(response.text().await?)
    }
}
