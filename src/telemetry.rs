//! Tracing subscriber setup for the CLI.

use std::error::Error;

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::TelemetryConfig;

/// Installs the global tracing subscriber.
///
/// Logs go to stderr so stdout stays reserved for the report. `RUST_LOG`
/// overrides the configured filter.
///
/// # Errors
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)?,
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}
