//! The address record handed to the presentation layer

use serde::{Deserialize, Serialize};

/// A picked place, independent of the backend that produced it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Full human readable address
    pub formatted_address: String,
    /// Short display name (place or street name)
    pub short_name: String,
    /// Backend specific place identifier
    pub place_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Address {
    /// Create an address without coordinates
    pub fn new(
        formatted_address: impl Into<String>,
        short_name: impl Into<String>,
        place_id: impl Into<String>,
    ) -> Self {
        Self {
            formatted_address: formatted_address.into(),
            short_name: short_name.into(),
            place_id: place_id.into(),
            latitude: None,
            longitude: None,
        }
    }

    /// Set coordinates
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Both coordinates, if the backend supplied them
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = if self.formatted_address.is_empty() {
            &self.short_name
        } else {
            &self.formatted_address
        };
        match self.coordinates() {
            Some((lat, lng)) => write!(f, "{} ({:.6}, {:.6})", label, lat, lng),
            None => write!(f, "{}", label),
        }
    }
}
