//! Error types for the hub

use thiserror::Error;

/// Result type alias for the hub
pub type Result<T> = std::result::Result<T, HubError>;

/// Main error type for the hub
#[derive(Error, Debug)]
pub enum HubError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local key/value store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// HTTP client errors other than timeouts
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket transport errors
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    /// Remote data store rejected a request
    #[error("Remote store error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Realtime channel errors
    #[error("Realtime error: {0}")]
    Realtime(String),

    /// Serverless function invocation errors
    #[error("Function '{name}' failed: {message}")]
    Function { name: String, message: String },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),
}

impl From<reqwest::Error> for HubError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else {
            Self::HttpClient(err)
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for HubError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}
