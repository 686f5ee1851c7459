//! PlacePicker-RS: debounced geocoding autocomplete for place pickers
//!
//! The [`AutocompleteController`] turns keystrokes into throttled,
//! deduplicated searches against a [`GeocodingBackend`] (Google Places or
//! Mapbox) and publishes [`SearchState`] changes, guarding against stale
//! responses overwriting newer ones.

pub mod autocomplete;
pub mod backends;
pub mod config;
pub mod error;
pub mod network;
pub mod results;

pub use autocomplete::{
    AutocompleteController, ControllerConfig, PickerEvent, SearchError, SearchState,
};
pub use backends::GeocodingBackend;
pub use config::Settings;
pub use error::{BackendFailure, PickerError};
pub use results::Address;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default minimum query length before searching
pub const DEFAULT_MIN_CHAR_LIMIT: usize = 3;

/// Default debounce interval in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
