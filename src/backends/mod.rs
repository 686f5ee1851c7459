//! Geocoding backends
//!
//! Defines the [`GeocodingBackend`] trait consumed by the autocomplete
//! controller and the Google Places and Mapbox implementations.

mod loader;
mod traits;

pub mod google;
pub mod mapbox;

pub use loader::{create_backend, list_backends, BackendKind, BackendLoader};
pub use traits::GeocodingBackend;
