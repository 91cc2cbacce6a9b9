//! Shared runtime pieces: configuration and process initialization.

pub mod config;

pub use config::{
    Config, GenerationConfig, ServicesConfig, Units, ValidationResult, WeatherConfig,
};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initializes logging for the process. Call once at startup.
///
/// # Errors
///
/// Currently infallible; kept fallible for future initialization steps.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::debug!("logging initialized");
    Ok(())
}
