//! Log subscriber setup.
//!
//! The library only emits `tracing` events. Hosts that want them printed call
//! [`init_logging`] once at startup.

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::CoreSettings;

/// Error type for logging setup.
#[derive(Error, Debug)]
pub enum LoggingError {
    /// The filter directive doesn't parse.
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed.
    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

/// Builds the log filter: `RUST_LOG` if set, otherwise the configured level.
///
/// # Errors
///
/// Returns `Filter` if neither parses.
pub fn env_filter(settings: &CoreSettings) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .map_err(|e| LoggingError::Filter(e.to_string()))
}

/// Installs a global fmt subscriber, human-readable or JSON.
///
/// # Errors
///
/// Returns `Init` if a subscriber is already installed.
pub fn init_logging(settings: &CoreSettings) -> Result<(), LoggingError> {
    let filter = env_filter(settings)?;

    if settings.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| LoggingError::Init(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(true);
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| LoggingError::Init(e.to_string()))?;
    }

    tracing::info!(
        level = %settings.log_level,
        json = settings.json_logs,
        "Logging initialized"
    );
    Ok(())
}
