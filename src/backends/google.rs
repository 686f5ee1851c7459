//! Google Places text search backend
//!
//! Uses the official Places API (`textsearch/json`). Requires an API key,
//! passed as the `key` parameter.

use super::traits::GeocodingBackend;
use crate::error::{BackendFailure, PickerError};
use crate::network::HttpClient;
use crate::results::{Address, GoogleTextSearchResponse};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Google Places text search
#[derive(Debug, Clone)]
pub struct GooglePlaces {
    client: HttpClient,
    api_url: String,
}

impl GooglePlaces {
    pub const BASE_URL: &'static str = "https://maps.googleapis.com/maps/api/place";

    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            api_url: format!("{}/textsearch/json", Self::BASE_URL),
        }
    }

    /// Point the backend at a different API root
    pub fn with_base_url(client: HttpClient, base_url: &str) -> Result<Self, PickerError> {
        Url::parse(base_url).map_err(|e| {
            PickerError::InvalidConfig(format!("google.base_url {:?}: {}", base_url, e))
        })?;
        Ok(Self {
            client,
            api_url: format!("{}/textsearch/json", base_url.trim_end_matches('/')),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl GeocodingBackend for GooglePlaces {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(
        &self,
        query: &str,
        params: &HashMap<String, String>,
    ) -> Result<Vec<Address>, BackendFailure> {
        let mut query_params = params.clone();
        query_params.insert("query".to_string(), query.to_string());

        let response = self.client.get(&self.api_url, &query_params).await?;

        if !response.is_success() {
            return Err(response.failure());
        }

        let body: GoogleTextSearchResponse = response.json()?;

        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => {
                debug!("google returned {} places for {:?}", body.results.len(), query);
                Ok(body.results.iter().map(Address::from).collect())
            }
            "OVER_QUERY_LIMIT" => Err(BackendFailure::RateLimited),
            status => Err(BackendFailure::Api(match body.error_message {
                Some(message) => format!("{}: {}", status, message),
                None => status.to_string(),
            })),
        }
    }
}
