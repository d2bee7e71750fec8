//! Helper functions for creating specific error types

use super::types::HubError;

/// Helper functions for creating specific errors
impl HubError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage(message.into())
    }

    pub fn remote<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    pub fn realtime<S: Into<String>>(message: S) -> Self {
        Self::Realtime(message.into())
    }

    pub fn function<N: Into<String>, S: Into<String>>(name: N, message: S) -> Self {
        Self::Function {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }
}

impl HubError {
    /// Whether retrying the same request could succeed
    ///
    /// Network failures, timeouts, throttling and 5xx responses are transient;
    /// everything else would fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpClient(e) => e.is_connect() || e.is_request(),
            Self::Io(_) | Self::WebSocket(_) | Self::Timeout(_) | Self::Realtime(_) => true,
            Self::Remote { status, .. } => *status == 429 || *status >= 500,
            Self::Function { .. } => true,
            _ => false,
        }
    }
}
