//! Debounced autocomplete controller
//!
//! Each qualifying input arms a debounce timer task; a newer input aborts it
//! and arms its own. When a timer fires, the query is compared against the
//! last forwarded one, tagged with the next sequence number and sent to the
//! backend. Responses are published only if their sequence number is higher
//! than anything published before, so a slow early request can never
//! overwrite a faster later one.

use super::state::{ControllerConfig, PickerEvent, SearchError, SearchState};
use crate::backends::GeocodingBackend;
use crate::error::{BackendFailure, PickerError};
use crate::results::Address;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Autocomplete session for a single picker screen
///
/// Created once per session; dropping it (or calling [`close`](Self::close))
/// ends the session and silences every outstanding request.
pub struct AutocompleteController {
    shared: Arc<Shared>,
}

struct Shared {
    backend: Arc<dyn GeocodingBackend>,
    runtime: Handle,
    events: mpsc::UnboundedSender<PickerEvent>,
    pipeline: Mutex<Pipeline>,
}

/// Never held across an `.await`
struct Pipeline {
    config: ControllerConfig,
    /// Bumped on every input; a timer only fires for the input that armed it
    input_generation: u64,
    pending: Option<JoinHandle<()>>,
    last_forwarded: Option<String>,
    last_dispatched_seq: u64,
    published_seq: u64,
    state: SearchState,
    closed: bool,
}

impl AutocompleteController {
    /// Create a controller and the receiver its events are published on
    ///
    /// Must be called from within a Tokio runtime; timers and requests are
    /// spawned onto that runtime, so [`submit_input`](Self::submit_input) can
    /// afterwards be called from any thread.
    pub fn new(
        backend: Arc<dyn GeocodingBackend>,
        config: ControllerConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PickerEvent>), PickerError> {
        validate_min_char_limit(config.min_char_limit)?;
        let runtime = Handle::try_current()
            .map_err(|e| PickerError::InvalidConfig(format!("no Tokio runtime: {}", e)))?;
        let (events, receiver) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            backend,
            runtime,
            events,
            pipeline: Mutex::new(Pipeline {
                config,
                input_generation: 0,
                pending: None,
                last_forwarded: None,
                last_dispatched_seq: 0,
                published_seq: 0,
                state: SearchState::Idle,
                closed: false,
            }),
        });

        Ok((Self { shared }, receiver))
    }

    /// Replace the minimum length and backend parameters for later inputs
    ///
    /// Requests already dispatched keep the parameters they were sent with.
    pub fn configure(
        &self,
        min_char_limit: usize,
        extra_params: HashMap<String, String>,
    ) -> Result<(), PickerError> {
        validate_min_char_limit(min_char_limit)?;
        let mut pipeline = self.shared.lock();
        pipeline.config.min_char_limit = min_char_limit;
        pipeline.config.extra_params = extra_params;
        Ok(())
    }

    /// Feed the current content of the input field
    pub fn submit_input(&self, raw_text: &str) {
        let mut pipeline = self.shared.lock();
        if pipeline.closed {
            return;
        }

        self.shared.emit(PickerEvent::ClearButton(!raw_text.is_empty()));

        pipeline.input_generation += 1;
        if let Some(pending) = pipeline.pending.take() {
            pending.abort();
        }

        let query = raw_text.trim();
        if query.chars().count() < pipeline.config.min_char_limit {
            // Retyping the last query after clearing it must search again
            pipeline.last_forwarded = None;
            self.shared.publish(&mut pipeline, SearchState::Idle);
            return;
        }

        let generation = pipeline.input_generation;
        let delay = pipeline.config.debounce;
        let query = query.to_string();
        let shared = Arc::clone(&self.shared);

        pipeline.pending = Some(self.shared.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            shared.run(generation, query).await;
        }));
    }

    /// Last published state
    pub fn state(&self) -> SearchState {
        self.shared.lock().state.clone()
    }

    /// Current configuration
    pub fn config(&self) -> ControllerConfig {
        self.shared.lock().config.clone()
    }

    /// End the session
    ///
    /// Further input is ignored and responses still in flight are dropped
    /// when they arrive.
    pub fn close(&self) {
        let mut pipeline = self.shared.lock();
        if pipeline.closed {
            return;
        }
        pipeline.closed = true;
        if let Some(pending) = pipeline.pending.take() {
            pending.abort();
        }
        debug!(
            "Autocomplete session closed after {} dispatches",
            pipeline.last_dispatched_seq
        );
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

impl Drop for AutocompleteController {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for AutocompleteController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pipeline = self.shared.lock();
        f.debug_struct("AutocompleteController")
            .field("backend", &self.shared.backend.name())
            .field("config", &pipeline.config)
            .field("state", &pipeline.state)
            .field("closed", &pipeline.closed)
            .finish()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Pipeline> {
        self.pipeline.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: PickerEvent) {
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }

    fn publish(&self, pipeline: &mut Pipeline, state: SearchState) {
        pipeline.state = state.clone();
        self.emit(PickerEvent::State(state));
    }

    /// Debounce window elapsed for `query`
    async fn run(&self, generation: u64, query: String) {
        let Some((seq, params)) = self.dispatch(generation, &query) else {
            return;
        };

        debug!(
            "Searching {} for {:?} (seq {})",
            self.backend.name(),
            query,
            seq
        );
        let outcome = self.backend.search(&query, &params).await;
        self.complete(seq, &query, outcome);
    }

    /// Apply the distinct filter and assign a sequence number
    fn dispatch(&self, generation: u64, query: &str) -> Option<(u64, HashMap<String, String>)> {
        let mut pipeline = self.lock();
        if pipeline.closed || pipeline.input_generation != generation {
            return None;
        }

        // From here on newer input must not abort this request
        pipeline.pending = None;

        if pipeline.last_forwarded.as_deref() == Some(query) {
            debug!("Skipping repeated query {:?}", query);
            return None;
        }

        pipeline.last_forwarded = Some(query.to_string());
        pipeline.last_dispatched_seq += 1;
        let seq = pipeline.last_dispatched_seq;
        self.publish(&mut pipeline, SearchState::Loading);

        Some((seq, pipeline.config.extra_params.clone()))
    }

    fn complete(&self, seq: u64, query: &str, outcome: Result<Vec<Address>, BackendFailure>) {
        let mut pipeline = self.lock();
        if pipeline.closed {
            debug!("Dropping response for {:?}: session closed", query);
            return;
        }
        if seq <= pipeline.published_seq {
            debug!(
                "Discarding stale response for {:?} (seq {} <= {})",
                query, seq, pipeline.published_seq
            );
            return;
        }
        pipeline.published_seq = seq;

        let state = match outcome {
            Ok(results) if results.is_empty() && pipeline.config.empty_results_as_error => {
                debug!("No results for {:?}", query);
                SearchState::Error(SearchError::EmptyResults)
            }
            Ok(results) => {
                debug!("{} results for {:?}", results.len(), query);
                SearchState::Success(results)
            }
            Err(failure) => {
                warn!("Failed to get search results for {:?}: {}", query, failure);
                SearchState::Error(SearchError::Backend(failure))
            }
        };

        self.publish(&mut pipeline, state);
    }
}

fn validate_min_char_limit(limit: usize) -> Result<(), PickerError> {
    if limit == 0 {
        return Err(PickerError::InvalidConfig(
            "min_char_limit must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::time::{sleep, Instant};

    type Reply = (Duration, Result<Vec<Address>, BackendFailure>);

    /// Backend answering from a script, recording when each query arrived
    struct ScriptedBackend {
        started: Instant,
        calls: Mutex<Vec<(String, Duration, HashMap<String, String>)>>,
        replies: HashMap<String, Reply>,
    }

    impl ScriptedBackend {
        fn new() -> Self {
            Self {
                started: Instant::now(),
                calls: Mutex::new(Vec::new()),
                replies: HashMap::new(),
            }
        }

        fn reply(
            mut self,
            query: &str,
            delay_ms: u64,
            outcome: Result<Vec<Address>, BackendFailure>,
        ) -> Self {
            self.replies
                .insert(query.to_string(), (Duration::from_millis(delay_ms), outcome));
            self
        }

        fn queries(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|c| c.0.clone()).collect()
        }

        fn call_times(&self) -> Vec<Duration> {
            self.calls.lock().unwrap().iter().map(|c| c.1).collect()
        }
    }

    #[async_trait]
    impl GeocodingBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn search(
            &self,
            query: &str,
            params: &HashMap<String, String>,
        ) -> Result<Vec<Address>, BackendFailure> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), self.started.elapsed(), params.clone()));
            let (delay, outcome) = self
                .replies
                .get(query)
                .cloned()
                .unwrap_or((Duration::ZERO, Ok(places(query, 1))));
            sleep(delay).await;
            outcome
        }
    }

    fn places(name: &str, n: usize) -> Vec<Address> {
        (0..n)
            .map(|i| {
                Address::new(format!("{} {}", name, i), name, format!("{}.{}", name, i))
                    .with_coordinates(48.85, 2.35)
            })
            .collect()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<PickerEvent>) -> Vec<PickerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn states(events: &[PickerEvent]) -> Vec<SearchState> {
        events
            .iter()
            .filter_map(|e| match e {
                PickerEvent::State(state) => Some(state.clone()),
                PickerEvent::ClearButton(_) => None,
            })
            .collect()
    }

    fn controller(
        backend: &Arc<ScriptedBackend>,
        config: ControllerConfig,
    ) -> (AutocompleteController, mpsc::UnboundedReceiver<PickerEvent>) {
        let backend: Arc<dyn GeocodingBackend> = backend.clone();
        AutocompleteController::new(backend, config).unwrap()
    }

    fn default_config() -> ControllerConfig {
        ControllerConfig::default()
            .with_min_char_limit(3)
            .with_debounce(Duration::from_millis(300))
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_input_never_dispatches() {
        let backend = Arc::new(ScriptedBackend::new());
        let (controller, mut rx) = controller(&backend, default_config());

        controller.submit_input("a");
        controller.submit_input("ab");
        controller.submit_input("  ab  ");
        sleep(Duration::from_secs(2)).await;

        assert!(backend.queries().is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![
                PickerEvent::ClearButton(true),
                PickerEvent::State(SearchState::Idle),
                PickerEvent::ClearButton(true),
                PickerEvent::State(SearchState::Idle),
                PickerEvent::ClearButton(true),
                PickerEvent::State(SearchState::Idle),
            ]
        );
        assert!(controller.state().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_dispatches_only_last_input() {
        let backend = Arc::new(ScriptedBackend::new());
        let (controller, _rx) = controller(&backend, default_config());

        controller.submit_input("a");
        controller.submit_input("ab");
        controller.submit_input("abc");
        sleep(Duration::from_millis(100)).await;
        controller.submit_input("abcd");
        sleep(Duration::from_secs(1)).await;

        assert_eq!(backend.queries(), vec!["abcd"]);
        let dispatched_at = backend.call_times()[0];
        assert!(dispatched_at >= Duration::from_millis(400));
        assert!(dispatched_at < Duration::from_millis(410));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_input_cancels_pending_timer() {
        let backend = Arc::new(ScriptedBackend::new());
        let (controller, mut rx) = controller(&backend, default_config());

        controller.submit_input("lond");
        sleep(Duration::from_millis(100)).await;
        controller.submit_input("lo");
        sleep(Duration::from_secs(1)).await;

        assert!(backend.queries().is_empty());
        assert_eq!(states(&drain(&mut rx)), vec![SearchState::Idle]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_input_keeps_dispatched_request() {
        let backend = Arc::new(ScriptedBackend::new().reply("paris", 500, Ok(places("paris", 2))));
        let (controller, mut rx) = controller(&backend, default_config());

        // paris dispatched at 300ms, answers at 800ms
        controller.submit_input("paris");
        sleep(Duration::from_millis(350)).await;
        controller.submit_input("");
        sleep(Duration::from_secs(1)).await;

        assert_eq!(backend.queries(), vec!["paris"]);
        assert_eq!(
            drain(&mut rx),
            vec![
                PickerEvent::ClearButton(true),
                PickerEvent::State(SearchState::Loading),
                PickerEvent::ClearButton(false),
                PickerEvent::State(SearchState::Idle),
                PickerEvent::State(SearchState::Success(places("paris", 2))),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_outlived_by_clear_is_still_checked_for_staleness() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply("paris", 1000, Ok(places("paris", 2)))
                .reply("lyon", 50, Ok(places("lyon", 1))),
        );
        let (controller, mut rx) = controller(&backend, default_config());

        // paris dispatched at 300ms, answers at 1300ms
        controller.submit_input("paris");
        sleep(Duration::from_millis(350)).await;
        controller.submit_input("");
        // lyon dispatched at 650ms, answers at 700ms
        controller.submit_input("lyon");
        sleep(Duration::from_secs(2)).await;

        assert_eq!(backend.queries(), vec!["paris", "lyon"]);
        assert_eq!(
            states(&drain(&mut rx)),
            vec![
                SearchState::Loading,
                SearchState::Idle,
                SearchState::Loading,
                SearchState::Success(places("lyon", 1)),
            ]
        );
        assert_eq!(controller.state(), SearchState::Success(places("lyon", 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_query_is_not_dispatched() {
        let backend = Arc::new(ScriptedBackend::new());
        let (controller, _rx) = controller(&backend, default_config());

        controller.submit_input("paris");
        sleep(Duration::from_millis(500)).await;
        controller.submit_input("paris ");
        sleep(Duration::from_millis(500)).await;
        controller.submit_input("parisx");
        controller.submit_input("paris");
        sleep(Duration::from_millis(500)).await;

        assert_eq!(backend.queries(), vec!["paris"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_query_after_different_one_dispatches_again() {
        let backend = Arc::new(ScriptedBackend::new());
        let (controller, _rx) = controller(&backend, default_config());

        controller.submit_input("paris");
        sleep(Duration::from_millis(500)).await;
        controller.submit_input("lyon");
        sleep(Duration::from_millis(500)).await;
        controller.submit_input("paris");
        sleep(Duration::from_millis(500)).await;

        assert_eq!(backend.queries(), vec!["paris", "lyon", "paris"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_input_allows_same_query_again() {
        let backend = Arc::new(ScriptedBackend::new());
        let (controller, mut rx) = controller(&backend, default_config());

        controller.submit_input("paris");
        sleep(Duration::from_millis(500)).await;
        controller.submit_input("");
        sleep(Duration::from_millis(500)).await;
        controller.submit_input("paris");
        sleep(Duration::from_millis(500)).await;

        assert_eq!(backend.queries(), vec!["paris", "paris"]);
        let events = drain(&mut rx);
        assert!(events.contains(&PickerEvent::ClearButton(false)));
        assert_eq!(
            states(&events),
            vec![
                SearchState::Loading,
                SearchState::Success(places("paris", 1)),
                SearchState::Idle,
                SearchState::Loading,
                SearchState::Success(places("paris", 1)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply("paris", 500, Ok(places("paris", 3)))
                .reply("pariss", 100, Ok(vec![])),
        );
        let (controller, mut rx) = controller(&backend, default_config());

        // paris dispatched at 300ms, answers at 800ms
        controller.submit_input("paris");
        sleep(Duration::from_millis(350)).await;
        // pariss dispatched at 650ms, answers at 750ms
        controller.submit_input("pariss");
        sleep(Duration::from_millis(425)).await;

        assert_eq!(
            states(&drain(&mut rx)),
            vec![
                SearchState::Loading,
                SearchState::Loading,
                SearchState::Error(SearchError::EmptyResults),
            ]
        );

        sleep(Duration::from_millis(100)).await;
        assert!(states(&drain(&mut rx)).is_empty());
        assert_eq!(
            controller.state(),
            SearchState::Error(SearchError::EmptyResults)
        );
        assert_eq!(backend.queries(), vec!["paris", "pariss"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_responses_in_order_are_all_published() {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply("berlin", 100, Ok(places("berlin", 1)))
                .reply("bern", 400, Ok(places("bern", 2))),
        );
        let (controller, mut rx) = controller(&backend, default_config());

        controller.submit_input("berlin");
        sleep(Duration::from_millis(350)).await;
        controller.submit_input("bern");
        sleep(Duration::from_secs(2)).await;

        assert_eq!(
            states(&drain(&mut rx)),
            vec![
                SearchState::Loading,
                SearchState::Success(places("berlin", 1)),
                SearchState::Loading,
                SearchState::Success(places("bern", 2)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure() {
        let backend = Arc::new(ScriptedBackend::new().reply(
            "london",
            50,
            Err(BackendFailure::Network("transport failure".to_string())),
        ));
        let (controller, mut rx) = controller(&backend, default_config());

        controller.submit_input("london");
        sleep(Duration::from_secs(1)).await;

        assert_eq!(
            drain(&mut rx),
            vec![
                PickerEvent::ClearButton(true),
                PickerEvent::State(SearchState::Loading),
                PickerEvent::State(SearchState::Error(SearchError::Backend(
                    BackendFailure::Network("transport failure".to_string())
                ))),
            ]
        );

        // Still usable afterwards
        controller.submit_input("londres");
        sleep(Duration::from_secs(1)).await;
        assert_eq!(controller.state(), SearchState::Success(places("londres", 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_results_as_success() {
        let backend = Arc::new(ScriptedBackend::new().reply("nowhere", 10, Ok(vec![])));
        let config = default_config().with_empty_results_as_error(false);
        let (controller, _rx) = controller(&backend, config);

        controller.submit_input("nowhere");
        sleep(Duration::from_secs(1)).await;

        assert_eq!(controller.state(), SearchState::Success(vec![]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_silences_in_flight_and_pending() {
        let backend = Arc::new(ScriptedBackend::new().reply("paris", 500, Ok(places("paris", 3))));
        let (controller, mut rx) = controller(&backend, default_config());

        controller.submit_input("paris");
        sleep(Duration::from_millis(350)).await;
        controller.submit_input("lyon");
        controller.close();
        assert!(controller.is_closed());

        controller.submit_input("marseille");
        sleep(Duration::from_secs(2)).await;

        assert_eq!(backend.queries(), vec!["paris"]);
        assert_eq!(
            drain(&mut rx),
            vec![
                PickerEvent::ClearButton(true),
                PickerEvent::State(SearchState::Loading),
                PickerEvent::ClearButton(true),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_configure_applies_to_later_inputs() {
        let backend = Arc::new(ScriptedBackend::new());
        let (controller, _rx) = controller(&backend, default_config().with_param("language", "en"));

        let mut params = HashMap::new();
        params.insert("language".to_string(), "fr".to_string());
        controller.configure(5, params).unwrap();

        controller.submit_input("lyon");
        sleep(Duration::from_secs(1)).await;
        assert!(backend.queries().is_empty());

        controller.submit_input("paris");
        sleep(Duration::from_secs(1)).await;
        let calls = backend.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].2.get("language").map(String::as_str), Some("fr"));
        assert_eq!(controller.config().min_char_limit, 5);
    }

    #[tokio::test]
    async fn test_zero_min_char_limit_rejected() {
        let backend = Arc::new(ScriptedBackend::new());
        let (controller, _rx) = controller(&backend, default_config());
        assert!(matches!(
            controller.configure(0, HashMap::new()),
            Err(PickerError::InvalidConfig(_))
        ));

        let backend: Arc<dyn GeocodingBackend> = backend;
        let result = AutocompleteController::new(backend, default_config().with_min_char_limit(0));
        assert!(matches!(result, Err(PickerError::InvalidConfig(_))));
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let backend: Arc<dyn GeocodingBackend> = Arc::new(ScriptedBackend {
            started: Instant::now(),
            calls: Mutex::new(Vec::new()),
            replies: HashMap::new(),
        });
        assert!(AutocompleteController::new(backend, ControllerConfig::default()).is_err());
    }
}
