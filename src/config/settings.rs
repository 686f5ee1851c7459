//! Settings structures for PlacePicker-RS configuration

use crate::error::PickerError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Main settings structure, loaded from `placepicker.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub picker: PickerSettings,
    pub outgoing: OutgoingSettings,
    pub google: GoogleOptions,
    pub mapbox: MapboxOptions,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (PLACEPICKER_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("PLACEPICKER_BACKEND") {
            self.picker.backend = val;
        }
        if let Ok(val) = std::env::var("PLACEPICKER_MIN_CHAR_LIMIT") {
            if let Ok(limit) = val.parse() {
                self.picker.min_char_limit = limit;
            }
        }
        if let Ok(val) = std::env::var("PLACEPICKER_DEBOUNCE_MS") {
            if let Ok(ms) = val.parse() {
                self.picker.debounce_ms = ms;
            }
        }
        if let Ok(val) = std::env::var("PLACEPICKER_GOOGLE_API_KEY") {
            self.google.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("PLACEPICKER_MAPBOX_ACCESS_TOKEN") {
            self.mapbox.access_token = Some(val);
        }
        if let Ok(val) = std::env::var("PLACEPICKER_LANGUAGE") {
            self.google.language = Some(val.clone());
            self.mapbox.language = Some(val);
        }
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> std::result::Result<(), PickerError> {
        if self.picker.min_char_limit == 0 {
            return Err(PickerError::InvalidConfig(
                "picker.min_char_limit must be at least 1".to_string(),
            ));
        }
        let timeout = self.outgoing.request_timeout;
        if !(timeout.is_finite() && timeout > 0.0) {
            return Err(PickerError::InvalidConfig(
                "outgoing.request_timeout must be a positive number of seconds".to_string(),
            ));
        }
        Ok(())
    }
}

/// Autocomplete behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerSettings {
    /// Geocoding backend (google, mapbox)
    pub backend: String,
    /// Minimum trimmed input length before a search is issued
    pub min_char_limit: usize,
    /// Quiet period after the last keystroke before searching
    pub debounce_ms: u64,
    /// Report an empty result list as an error state
    pub empty_results_as_error: bool,
}

impl Default for PickerSettings {
    fn default() -> Self {
        Self {
            backend: "mapbox".to_string(),
            min_char_limit: crate::DEFAULT_MIN_CHAR_LIMIT,
            debounce_ms: crate::DEFAULT_DEBOUNCE_MS,
            empty_results_as_error: true,
        }
    }
}

impl PickerSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Request timeout in seconds
    pub request_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 120.0,
            pool_maxsize: 4,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Google Places search options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleOptions {
    /// Places API key
    pub api_key: Option<String>,
    /// Override for the API base URL
    pub base_url: Option<String>,
    /// Region code; the country is omitted from addresses in this region
    pub region: Option<String>,
    /// Bias results around this point
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Bias radius in meters
    pub radius: Option<u32>,
    pub language: Option<String>,
    /// Price level bounds, 0 (most affordable) to 4 (most expensive)
    pub min_price: Option<u8>,
    pub max_price: Option<u8>,
    /// Only places open at query time
    pub open_now: Option<bool>,
    pub page_token: Option<String>,
    /// Place type filter
    pub types: Option<String>,
}

impl GoogleOptions {
    /// Query parameters forwarded with every text search
    pub fn to_params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some(ref key) = self.api_key {
            params.insert("key".to_string(), key.clone());
        }
        if let Some(ref region) = self.region {
            params.insert("region".to_string(), region.clone());
        }
        if let (Some(lat), Some(lng)) = (self.latitude, self.longitude) {
            params.insert("location".to_string(), format!("{},{}", lat, lng));
        }
        if let Some(radius) = self.radius {
            params.insert("radius".to_string(), radius.to_string());
        }
        if let Some(ref language) = self.language {
            params.insert("language".to_string(), language.clone());
        }
        if let Some(min_price) = self.min_price {
            params.insert("minprice".to_string(), min_price.min(4).to_string());
        }
        if let Some(max_price) = self.max_price {
            params.insert("maxprice".to_string(), max_price.min(4).to_string());
        }
        if let Some(open_now) = self.open_now {
            params.insert("opennow".to_string(), open_now.to_string());
        }
        if let Some(ref token) = self.page_token {
            params.insert("pagetoken".to_string(), token.clone());
        }
        if let Some(ref types) = self.types {
            params.insert("type".to_string(), types.clone());
        }
        params
    }
}

/// Mapbox geocoding options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapboxOptions {
    /// Mapbox access token
    pub access_token: Option<String>,
    /// Override for the API base URL
    pub base_url: Option<String>,
    /// Preferred response language
    pub language: Option<String>,
    /// Maximum number of results, 1 to 10 (API default 5)
    pub limit: Option<u8>,
    /// Bias results toward this point
    pub proximity_longitude: Option<f64>,
    pub proximity_latitude: Option<f64>,
    /// ISO 3166 alpha 2 country codes, comma separated
    pub country: Option<String>,
    /// Feature types (country, region, postcode, place, address, poi, ...)
    pub types: Option<String>,
}

impl MapboxOptions {
    /// Query parameters forwarded with every geocoding request
    pub fn to_params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some(ref token) = self.access_token {
            params.insert("access_token".to_string(), token.clone());
        }
        if let Some(ref language) = self.language {
            params.insert("language".to_string(), language.clone());
        }
        if let Some(limit) = self.limit {
            params.insert("limit".to_string(), limit.clamp(1, 10).to_string());
        }
        if let (Some(lng), Some(lat)) = (self.proximity_longitude, self.proximity_latitude) {
            params.insert("proximity".to_string(), format!("{},{}", lng, lat));
        }
        if let Some(ref country) = self.country {
            params.insert("country".to_string(), country.clone());
        }
        if let Some(ref types) = self.types {
            params.insert("types".to_string(), types.clone());
        }
        params
    }
}
