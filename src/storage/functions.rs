//! Serverless function invocation

use crate::config::BackendConfig;
use crate::storage::remote::auth_headers;
use crate::utils::error::{HubError, Result};
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

/// Name of the function that wipes rows created by test runs
pub const CLEANUP_TEST_DATA: &str = "cleanup-test-data";

/// Client for functions hosted next to the backend
#[derive(Debug, Clone)]
pub struct FunctionsClient {
    client: Client,
    base_url: String,
}

impl FunctionsClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(HubError::config("Backend URL is not configured"));
        }

        let client = ClientBuilder::new()
            .timeout(config.timeout())
            .default_headers(auth_headers(config)?)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    pub fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, name)
    }

    /// Call `name` with a JSON payload and decode its JSON reply
    ///
    /// A non-success status becomes [`HubError::Function`] carrying the
    /// function's own error message when it sent one.
    pub async fn invoke<Req, Resp>(&self, name: &str, payload: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.function_url(name);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").or_else(|| v.get("message")).cloned())
                .map(|m| match m {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .unwrap_or_else(|| format!("{} {}", status.as_u16(), body.trim()));
            return Err(HubError::function(name, message));
        }

        // Functions that return nothing decode as JSON null.
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body)
            .map_err(|e| HubError::function(name, format!("Invalid response body: {}", e)))
    }

    /// Remove data created by automated test runs
    pub async fn cleanup_test_data(&self) -> Result<Value> {
        info!("Invoking {}", CLEANUP_TEST_DATA);
        self.invoke(CLEANUP_TEST_DATA, &json!({})).await
    }
}
