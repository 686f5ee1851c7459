//! States and events published by the controller

use crate::error::BackendFailure;
use crate::results::Address;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Outcome of the latest accepted query
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchState {
    /// No query yet, or the input is below the minimum length
    #[default]
    Idle,
    /// A request is in flight for the latest accepted query
    Loading,
    /// The latest request completed
    Success(Vec<Address>),
    /// The latest request failed or found nothing
    Error(SearchError),
}

impl SearchState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Results of a successful search
    pub fn results(&self) -> Option<&[Address]> {
        match self {
            Self::Success(results) => Some(results),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SearchError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// Why a search ended in the error state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The backend answered with no places
    #[error("no results")]
    EmptyResults,

    #[error(transparent)]
    Backend(#[from] BackendFailure),
}

/// Everything the presentation layer is told
#[derive(Debug, Clone, PartialEq)]
pub enum PickerEvent {
    /// The search state changed
    State(SearchState),
    /// Whether the clear button should be shown
    ClearButton(bool),
}

/// Controller tunables
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Minimum trimmed length (in characters) for a query to be searched
    pub min_char_limit: usize,
    /// Quiet period after the last input before a search is dispatched
    pub debounce: Duration,
    /// Forwarded verbatim to the backend
    pub extra_params: HashMap<String, String>,
    /// Publish `Error(EmptyResults)` instead of `Success(vec![])`
    pub empty_results_as_error: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            min_char_limit: crate::DEFAULT_MIN_CHAR_LIMIT,
            debounce: Duration::from_millis(crate::DEFAULT_DEBOUNCE_MS),
            extra_params: HashMap::new(),
            empty_results_as_error: true,
        }
    }
}

impl ControllerConfig {
    pub fn with_min_char_limit(mut self, limit: usize) -> Self {
        self.min_char_limit = limit;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.insert(key.into(), value.into());
        self
    }

    pub fn with_empty_results_as_error(mut self, as_error: bool) -> Self {
        self.empty_results_as_error = as_error;
        self
    }
}
