//! Backend loader for initializing a backend from configuration

use super::google::GooglePlaces;
use super::mapbox::MapboxGeocoding;
use super::traits::GeocodingBackend;
use crate::autocomplete::ControllerConfig;
use crate::config::Settings;
use crate::error::PickerError;
use crate::network::HttpClient;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Supported geocoding services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Google,
    Mapbox,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Mapbox => "mapbox",
        }
    }
}

impl FromStr for BackendKind {
    type Err = PickerError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_lowercase().as_str() {
            "google" | "google_places" | "places" => Ok(Self::Google),
            "mapbox" => Ok(Self::Mapbox),
            _ => Err(PickerError::UnknownBackend(name.to_string())),
        }
    }
}

/// List available backends
pub fn list_backends() -> Vec<&'static str> {
    vec!["google", "mapbox"]
}

/// Create a backend by name, validating its credential and base URL
pub fn create_backend(
    name: &str,
    settings: &Settings,
    client: HttpClient,
) -> Result<Arc<dyn GeocodingBackend>, PickerError> {
    let backend: Arc<dyn GeocodingBackend> = match name.parse::<BackendKind>()? {
        BackendKind::Google => {
            if settings.google.api_key.as_deref().unwrap_or("").is_empty() {
                return Err(PickerError::MissingCredential("google.api_key"));
            }
            match settings.google.base_url {
                Some(ref url) => Arc::new(GooglePlaces::with_base_url(client, url)?),
                None => Arc::new(GooglePlaces::new(client)),
            }
        }
        BackendKind::Mapbox => {
            if settings.mapbox.access_token.as_deref().unwrap_or("").is_empty() {
                return Err(PickerError::MissingCredential("mapbox.access_token"));
            }
            match settings.mapbox.base_url {
                Some(ref url) => Arc::new(MapboxGeocoding::with_base_url(client, url)?),
                None => Arc::new(MapboxGeocoding::new(client)),
            }
        }
    };

    Ok(backend)
}

/// Loader wiring settings into a backend and a controller configuration
pub struct BackendLoader;

impl BackendLoader {
    /// Load the backend named by `picker.backend`
    pub fn load(
        settings: &Settings,
        client: HttpClient,
    ) -> Result<(Arc<dyn GeocodingBackend>, ControllerConfig), PickerError> {
        let backend = create_backend(&settings.picker.backend, settings, client)?;
        let config = Self::controller_config(settings)?;

        info!(
            "Loaded {} backend ({} extra params, min {} chars)",
            backend.name(),
            config.extra_params.len(),
            config.min_char_limit
        );

        Ok((backend, config))
    }

    /// Parameters forwarded to the configured backend on every search
    pub fn extra_params(settings: &Settings) -> Result<HashMap<String, String>, PickerError> {
        Ok(match settings.picker.backend.parse::<BackendKind>()? {
            BackendKind::Google => settings.google.to_params(),
            BackendKind::Mapbox => settings.mapbox.to_params(),
        })
    }

    /// Controller configuration from the picker settings
    pub fn controller_config(settings: &Settings) -> Result<ControllerConfig, PickerError> {
        settings.validate()?;
        Ok(ControllerConfig {
            min_char_limit: settings.picker.min_char_limit,
            debounce: settings.picker.debounce(),
            extra_params: Self::extra_params(settings)?,
            empty_results_as_error: settings.picker.empty_results_as_error,
        })
    }
}
