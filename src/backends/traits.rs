//! Backend trait

use crate::error::BackendFailure;
use crate::results::Address;
use async_trait::async_trait;
use std::collections::HashMap;

/// A searchable geocoding service
///
/// `params` are forwarded verbatim as query parameters (credentials, locale,
/// proximity bias, result limit, type filters).
#[async_trait]
pub trait GeocodingBackend: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Search for places matching `query`
    async fn search(
        &self,
        query: &str,
        params: &HashMap<String, String>,
    ) -> Result<Vec<Address>, BackendFailure>;
}
