//! HTTP networking module
//!
//! Provides the HTTP client shared by the geocoding backends.

mod client;
mod response;

pub use client::HttpClient;
pub use response::HttpResponse;
