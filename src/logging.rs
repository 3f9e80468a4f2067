//! Diagnostic logging to stderr.
//!
//! Stdout carries rendered answers only, so the subscriber always writes to stderr.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "warn";

/// Builds the filter from `directives`, then `RUST_LOG`, then [`DEFAULT_FILTER`]. Invalid
/// directives fall through to the next source.
pub fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_tracing(directives: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(directives))
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .try_init();
}
