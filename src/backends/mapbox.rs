//! Mapbox geocoding backend
//!
//! Queries `mapbox.places/{query}.json` on the Geocoding v5 API, and
//! `mapbox.places/{lng},{lat}.json` for reverse lookups. The access token
//! travels as the `access_token` parameter.

use super::traits::GeocodingBackend;
use crate::error::{BackendFailure, PickerError};
use crate::network::HttpClient;
use crate::results::{Address, MapboxFeatureCollection};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Mapbox geocoding
#[derive(Debug, Clone)]
pub struct MapboxGeocoding {
    client: HttpClient,
    base_url: String,
}

impl MapboxGeocoding {
    pub const BASE_URL: &'static str = "https://api.mapbox.com/geocoding/v5";

    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: Self::BASE_URL.to_string(),
        }
    }

    /// Point the backend at a different API root
    pub fn with_base_url(client: HttpClient, base_url: &str) -> Result<Self, PickerError> {
        Url::parse(base_url).map_err(|e| {
            PickerError::InvalidConfig(format!("mapbox.base_url {:?}: {}", base_url, e))
        })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint for a query; the query is a single path segment
    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/mapbox.places/{}.json",
            self.base_url,
            urlencoding::encode(query)
        )
    }

    /// Endpoint for a reverse lookup of a coordinate
    pub fn reverse_url(&self, longitude: f64, latitude: f64) -> String {
        format!(
            "{}/mapbox.places/{},{}.json",
            self.base_url, longitude, latitude
        )
    }

    /// Resolve a coordinate to the locality containing it
    ///
    /// Returns `None` when the coordinate is not inside any locality.
    pub async fn reverse(
        &self,
        longitude: f64,
        latitude: f64,
        params: &HashMap<String, String>,
    ) -> Result<Option<Address>, BackendFailure> {
        if !(longitude.is_finite() && latitude.is_finite()) {
            return Err(BackendFailure::Api(format!(
                "invalid coordinate {},{}",
                longitude, latitude
            )));
        }

        let mut query_params = params.clone();
        // Reverse queries reject forward-only parameters
        query_params.remove("proximity");
        query_params.insert("types".to_string(), REVERSE_TYPES.to_string());

        let collection = self
            .fetch(&self.reverse_url(longitude, latitude), &query_params)
            .await?;
        debug!(
            "mapbox resolved {},{} to {} features",
            longitude,
            latitude,
            collection.features.len()
        );

        Ok(collection.features.first().map(Address::from))
    }

    async fn fetch(
        &self,
        url: &str,
        params: &HashMap<String, String>,
    ) -> Result<MapboxFeatureCollection, BackendFailure> {
        let response = self.client.get(url, params).await?;

        if !response.is_success() {
            return Err(response.failure());
        }

        response.json()
    }
}

/// Feature types a reverse lookup resolves to
const REVERSE_TYPES: &str = "locality";

#[async_trait]
impl GeocodingBackend for MapboxGeocoding {
    fn name(&self) -> &str {
        "mapbox"
    }

    async fn search(
        &self,
        query: &str,
        params: &HashMap<String, String>,
    ) -> Result<Vec<Address>, BackendFailure> {
        let collection = self.fetch(&self.search_url(query), params).await?;
        debug!(
            "mapbox returned {} features for {:?}",
            collection.features.len(),
            query
        );

        Ok(collection.features.iter().map(Address::from).collect())
    }
}
