//! Structured logging setup for the binaries.
//!
//! Logs go to stderr so stdout stays reserved for JSON responses. `RUST_LOG`
//! takes precedence over the configured level.

use crate::config::{Config, LogFormat};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false);

    let result = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.compact().try_init(),
    };
    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}
