//! HTTP client for making requests to geocoding APIs

use super::response::HttpResponse;
use crate::config::OutgoingSettings;
use crate::error::BackendFailure;
use anyhow::Result;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// HTTP client wrapper with PlacePicker-specific configuration
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    user_agent: String,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let timeout = Duration::try_from_secs_f64(settings.request_timeout).map_err(|e| {
            anyhow::anyhow!("invalid request timeout {}: {}", settings.request_timeout, e)
        })?;
        let mut builder = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            default_timeout: timeout,
            user_agent: format!("placepicker-rs/{}", crate::VERSION),
            extra_headers: settings.extra_headers.clone(),
        })
    }

    /// GET a URL with query parameters
    pub async fn get(
        &self,
        url: &str,
        params: &HashMap<String, String>,
    ) -> Result<HttpResponse, BackendFailure> {
        self.get_with_timeout(url, params, self.default_timeout).await
    }

    /// GET a URL with query parameters and a custom timeout
    pub async fn get_with_timeout(
        &self,
        url: &str,
        params: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<HttpResponse, BackendFailure> {
        let mut req_builder = self
            .client
            .get(url)
            .timeout(timeout)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json");

        // Add custom headers
        for (key, value) in &self.extra_headers {
            req_builder = req_builder.header(key, value);
        }

        // Add query parameters
        if !params.is_empty() {
            req_builder = req_builder.query(params);
        }

        debug!("GET {} ({} params)", url, params.len());

        let response = req_builder.send().await?;

        Self::parse_response(response).await
    }

    /// Buffer the response body
    async fn parse_response(response: Response) -> Result<HttpResponse, BackendFailure> {
        let status = response.status().as_u16();
        debug!("{} from {}", status, response.url());

        let text = response.text().await?;

        Ok(HttpResponse { status, text })
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Default request timeout
    pub fn timeout(&self) -> Duration {
        self.default_timeout
    }
}
