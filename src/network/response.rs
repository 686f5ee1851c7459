//! HTTP response as seen by the backends

use crate::error::BackendFailure;

/// Buffered HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
}

impl HttpResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, BackendFailure> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response indicates rate limiting
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// The `message` field of a JSON error body, if there is one
    pub fn error_message(&self) -> Option<String> {
        let json: serde_json::Value = serde_json::from_str(&self.text).ok()?;
        json.get("message")
            .or_else(|| json.get("error_message"))
            .and_then(|m| m.as_str())
            .map(String::from)
    }

    /// Classify a non-2xx response
    pub fn failure(&self) -> BackendFailure {
        if self.is_rate_limited() {
            return BackendFailure::RateLimited;
        }
        match self.error_message() {
            Some(message) => BackendFailure::Api(format!("{}: {}", self.status, message)),
            None => BackendFailure::Http(self.status),
        }
    }
}
