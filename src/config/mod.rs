//! Configuration module for PlacePicker-RS
//!
//! Handles loading settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::{bail, Result};
use std::path::PathBuf;
use tracing::info;

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_ENV: &str = "PLACEPICKER_SETTINGS_PATH";

/// Candidate settings file locations, in lookup order
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("placepicker.yml"),
        PathBuf::from("config/placepicker.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("placepicker-rs/settings.yml"));
    }
    paths
}

/// Load settings from an explicit path, the environment, or the default
/// locations, then apply `PLACEPICKER_*` overrides
///
/// An explicit path (argument or environment) must exist; only the default
/// locations are optional.
pub fn load(explicit: Option<PathBuf>) -> Result<Settings> {
    let requested = explicit.or_else(|| std::env::var_os(SETTINGS_PATH_ENV).map(PathBuf::from));

    let found = match requested {
        Some(path) if !path.exists() => {
            bail!("settings file not found: {}", path.display());
        }
        Some(path) => Some(path),
        None => default_paths().into_iter().find(|path| path.exists()),
    };

    let mut settings = match found {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(&path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };

    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}
