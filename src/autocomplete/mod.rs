//! Autocomplete query pipeline
//!
//! Turns raw keystrokes into debounced, deduplicated searches against a
//! [`GeocodingBackend`](crate::backends::GeocodingBackend) and publishes
//! [`SearchState`] changes to the presentation layer.

mod controller;
mod state;

pub use controller::AutocompleteController;
pub use state::{ControllerConfig, PickerEvent, SearchError, SearchState};
