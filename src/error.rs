//! Error types for the place picker

use thiserror::Error;

/// Errors raised when the picker is misconfigured
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickerError {
    /// A configuration value is out of range or malformed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No backend is registered under the requested name
    #[error("unknown geocoding backend: {0}")]
    UnknownBackend(String),

    /// A backend was selected without the credential it needs
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}

/// Failure reported by a geocoding backend for a single request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendFailure {
    /// The request did not complete within the client timeout
    #[error("request timed out")]
    Timeout,

    /// Connection or transport level failure
    #[error("transport failure: {0}")]
    Network(String),

    /// The backend refused the request because of its request quota
    #[error("rate limited")]
    RateLimited,

    /// Non-2xx status without a usable error body
    #[error("HTTP error: {0}")]
    Http(u16),

    /// The backend answered but reported an error of its own
    #[error("backend error: {0}")]
    Api(String),

    /// The response body could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Http(status.as_u16())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendFailure {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
