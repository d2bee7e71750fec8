//! REST implementation of the data store

use super::DataStore;
use super::types::{Query, Row};
use crate::config::BackendConfig;
use crate::utils::error::{HubError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use tracing::debug;
use url::Url;

/// Data store backed by the hosted REST API
#[derive(Debug, Clone)]
pub struct RestDataStore {
    client: Client,
    base_url: String,
    schema: String,
}

impl RestDataStore {
    /// Build a store from backend settings
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
            schema: config.schema.clone(),
        })
    }

    /// Endpoint URL for `query` including select, filter, order and limit
    pub fn query_url(&self, query: &Query) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, query.collection))
            .map_err(|e| HubError::config(format!("Invalid REST URL: {}", e)))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", &query.select_clause());
            for filter in &query.filters {
                pairs.append_pair(&filter.column, &filter.to_query_value());
            }
            if let Some(order) = &query.order {
                let direction = if order.ascending { "asc" } else { "desc" };
                pairs.append_pair("order", &format!("{}.{}", order.column, direction));
            }
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }

        Ok(url)
    }

    fn with_profile(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Accept-Profile", &self.schema)
    }
}

pub(crate) fn auth_headers(config: &BackendConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "apikey",
        HeaderValue::from_str(&config.anon_key)
            .map_err(|e| HubError::config(format!("Invalid anon key: {}", e)))?,
    );
    headers.insert(
        reqwest::header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", config.bearer_token()))
            .map_err(|e| HubError::config(format!("Invalid access token: {}", e)))?,
    );
    Ok(headers)
}

/// Total from a `Content-Range` value such as `0-24/3573` or `*/0`
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

/// Turn a non-success response into `HubError::Remote`
pub(crate) async fn error_for_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status_text(status)
            } else {
                body
            }
        });

    Err(HubError::remote(status.as_u16(), message))
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("unknown status")
        .to_string()
}

#[async_trait]
impl DataStore for RestDataStore {
    async fn select(&self, query: &Query) -> Result<Vec<Row>> {
        let url = self.query_url(query)?;
        debug!("GET {}", url);

        let response = self.with_profile(self.client.get(url)).send().await?;
        let response = error_for_status(response).await?;
        Ok(response.json::<Vec<Row>>().await?)
    }

    async fn single(&self, query: &Query) -> Result<Option<Row>> {
        // Two rows are enough to detect ambiguity.
        let probe = query.clone().limit(2);
        let mut rows = self.select(&probe).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            _ => Err(HubError::remote(
                406,
                format!("expected at most one row from {}", query.collection),
            )),
        }
    }

    async fn count(&self, query: &Query) -> Result<u64> {
        let mut counting = query.clone();
        counting.columns.clear();
        counting.order = None;
        counting.limit = None;
        let url = self.query_url(&counting)?;
        debug!("HEAD {} (count)", url);

        let response = self
            .with_profile(self.client.head(url))
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = error_for_status(response).await?;

        let status = response.status().as_u16();
        let range = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| HubError::remote(status, "response has no Content-Range header"))?;

        parse_content_range_total(range).ok_or_else(|| {
            HubError::remote(status, format!("unparseable Content-Range '{}'", range))
        })
    }
}
