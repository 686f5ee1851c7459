//! PlacePicker-RS terminal driver
//!
//! Each stdin line is treated as the full content of the search field, as if
//! the user had just typed it. Every event the controller publishes is printed.

use anyhow::Result;
use placepicker::{
    backends::BackendLoader,
    config,
    network::HttpClient,
    AutocompleteController, PickerEvent, SearchState,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Command line options
#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    backend: Option<String>,
    min_chars: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = match parse_args(std::env::args().skip(1))? {
        Some(options) => options,
        None => return Ok(()),
    };

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting PlacePicker-RS v{}", placepicker::VERSION);

    // Load configuration
    let mut settings = config::load(options.config)?;
    if let Some(backend) = options.backend {
        settings.picker.backend = backend;
    }
    if let Some(min_chars) = options.min_chars {
        settings.picker.min_char_limit = min_chars;
    }

    let client = HttpClient::with_settings(&settings.outgoing)?;
    let (backend, controller_config) = BackendLoader::load(&settings, client)?;
    let (controller, mut events) = AutocompleteController::new(backend, controller_config)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => controller.submit_input(&line),
                None => break,
            },
            Some(event) = events.recv() => print_event(event),
        }
    }

    let request_timeout = Duration::from_secs_f64(settings.outgoing.request_timeout);
    settle(&controller, &mut events, request_timeout, print_event).await;
    Ok(())
}

/// Keep printing until the last input has settled, then close the session
///
/// Superseded requests may still hold the event sender, so the receiver is
/// not waited on to end; nothing is published after close, so whatever is
/// queued by then is the complete output.
async fn settle(
    controller: &AutocompleteController,
    events: &mut mpsc::UnboundedReceiver<PickerEvent>,
    request_timeout: Duration,
    mut on_event: impl FnMut(PickerEvent),
) {
    let debounce = controller.config().debounce;
    let deadline = Instant::now() + debounce + request_timeout;

    let quiet = tokio::time::sleep(debounce + Duration::from_millis(10));
    tokio::pin!(quiet);
    loop {
        tokio::select! {
            _ = &mut quiet => break,
            Some(event) = events.recv() => on_event(event),
        }
    }
    while controller.state().is_loading() && Instant::now() < deadline {
        let next = tokio::time::timeout(Duration::from_millis(50), events.recv()).await;
        if let Ok(Some(event)) = next {
            on_event(event);
        }
    }

    controller.close();
    while let Ok(event) = events.try_recv() {
        on_event(event);
    }
}

fn print_event(event: PickerEvent) {
    match event {
        PickerEvent::ClearButton(visible) => {
            println!("[clear button {}]", if visible { "shown" } else { "hidden" })
        }
        PickerEvent::State(SearchState::Idle) => println!("idle"),
        PickerEvent::State(SearchState::Loading) => println!("loading..."),
        PickerEvent::State(SearchState::Success(results)) => {
            println!("{} result(s):", results.len());
            for (i, address) in results.iter().enumerate() {
                println!("  {}. {} [{}]", i + 1, address, address.place_id);
            }
        }
        PickerEvent::State(SearchState::Error(err)) => println!("error: {}", err),
    }
}

/// Parse arguments; `None` means usage or version was printed
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Options>> {
    let mut options = Options::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("{} requires a file path", arg))?;
                options.config = Some(PathBuf::from(path));
            }
            "-b" | "--backend" => {
                let name = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("{} requires a backend name", arg))?;
                options.backend = Some(name);
            }
            "-m" | "--min-chars" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("{} requires a number", arg))?;
                options.min_chars = Some(value.parse()?);
            }
            "-h" | "--help" => {
                print_usage();
                return Ok(None);
            }
            "-V" | "--version" => {
                println!("placepicker {}", placepicker::VERSION);
                return Ok(None);
            }
            other => anyhow::bail!("unknown argument: {}", other),
        }
    }

    Ok(Some(options))
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
PlacePicker-RS v{}
Debounced place search against Google Places or Mapbox

USAGE:
    placepicker [OPTIONS] < queries.txt

OPTIONS:
    -c, --config <FILE>      Path to configuration file
    -b, --backend <NAME>     Geocoding backend ({})
    -m, --min-chars <N>      Minimum query length before searching
    -h, --help               Print help information
    -V, --version            Print version information

ENVIRONMENT VARIABLES:
    PLACEPICKER_SETTINGS_PATH        Path to settings file
    PLACEPICKER_BACKEND              Geocoding backend
    PLACEPICKER_MIN_CHAR_LIMIT       Minimum query length
    PLACEPICKER_DEBOUNCE_MS          Debounce interval in milliseconds
    PLACEPICKER_GOOGLE_API_KEY       Google Places API key
    PLACEPICKER_MAPBOX_ACCESS_TOKEN  Mapbox access token
    PLACEPICKER_LANGUAGE             Result language
    RUST_LOG                         Log filter (default: info)
"#,
        placepicker::VERSION,
        placepicker::backends::list_backends().join(", ")
    );
}
