//! Vendor response shapes and their mapping into [`Address`]
//!
//! Decoding is lenient: every field is optional on the wire and a missing
//! field becomes an empty string or `None` in the mapped record.

use super::address::Address;
use serde::{Deserialize, Deserializer};

/// Read an array that may be absent or `null` as an empty `Vec`
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Google Places text search response (`textsearch/json`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoogleTextSearchResponse {
    /// `OK`, `ZERO_RESULTS`, `REQUEST_DENIED`, ...
    pub status: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub results: Vec<GooglePlace>,
    pub error_message: Option<String>,
}

/// A single place in a Google text search response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GooglePlace {
    pub formatted_address: Option<String>,
    pub name: Option<String>,
    pub place_id: Option<String>,
    pub geometry: Option<GoogleGeometry>,
    #[serde(deserialize_with = "null_as_empty")]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoogleGeometry {
    pub location: Option<GoogleLatLng>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct GoogleLatLng {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl From<&GooglePlace> for Address {
    fn from(place: &GooglePlace) -> Self {
        // Half a coordinate is no coordinate
        let lat_lng = place
            .geometry
            .as_ref()
            .and_then(|g| g.location)
            .and_then(|l| l.lat.zip(l.lng));
        Self {
            formatted_address: place.formatted_address.clone().unwrap_or_default(),
            short_name: place.name.clone().unwrap_or_default(),
            place_id: place.place_id.clone().unwrap_or_default(),
            latitude: lat_lng.map(|(lat, _)| lat),
            longitude: lat_lng.map(|(_, lng)| lng),
        }
    }
}

/// Mapbox geocoding response (a GeoJSON feature collection)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MapboxFeatureCollection {
    #[serde(deserialize_with = "null_as_empty")]
    pub features: Vec<MapboxFeature>,
}

/// A single feature of a Mapbox geocoding response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MapboxFeature {
    pub id: Option<String>,
    pub text: Option<String>,
    pub place_name: Option<String>,
    /// `place`, `locality`, `poi`, ...
    #[serde(deserialize_with = "null_as_empty")]
    pub place_type: Vec<String>,
    /// `[longitude, latitude]`
    pub center: Option<Vec<f64>>,
    pub geometry: Option<MapboxGeometry>,
    #[serde(deserialize_with = "null_as_empty")]
    pub context: Vec<MapboxContext>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MapboxGeometry {
    /// `[longitude, latitude]`
    #[serde(deserialize_with = "null_as_empty")]
    pub coordinates: Vec<f64>,
}

/// Enclosing region of a feature (postcode, place, country, ...)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MapboxContext {
    pub id: Option<String>,
    pub text: Option<String>,
    pub wikidata: Option<String>,
}

impl MapboxFeature {
    /// Longitude/latitude pair, from `center` or else the point geometry
    pub fn lng_lat(&self) -> Option<(f64, f64)> {
        let pair = |coords: &[f64]| match coords {
            [lng, lat, ..] => Some((*lng, *lat)),
            _ => None,
        };
        self.center
            .as_deref()
            .and_then(pair)
            .or_else(|| self.geometry.as_ref().and_then(|g| pair(&g.coordinates)))
    }
}

impl From<&MapboxFeature> for Address {
    fn from(feature: &MapboxFeature) -> Self {
        let lng_lat = feature.lng_lat();
        Self {
            formatted_address: feature.place_name.clone().unwrap_or_default(),
            short_name: feature.text.clone().unwrap_or_default(),
            place_id: feature.id.clone().unwrap_or_default(),
            latitude: lng_lat.map(|(_, lat)| lat),
            longitude: lng_lat.map(|(lng, _)| lng),
        }
    }
}
