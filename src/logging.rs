//! Diagnostic logging setup
//!
//! Events go to stderr so that command output on stdout stays parseable.
//! `RUST_LOG`, when set, replaces the configured level.

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Filter from `RUST_LOG`, falling back to `level`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global subscriber. Returns false if one was already set.
pub fn init(level: &str, format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    result.is_ok()
}
