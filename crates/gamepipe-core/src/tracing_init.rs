//! Shared tracing/logging initialization.
//!
//! The `gamepipe` binary (and any embedding service) sets up
//! `tracing_subscriber` the same way: an env-filter honouring `RUST_LOG`
//! with a caller-supplied fallback, plus either a human-readable or a
//! JSON fmt layer.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the global tracing subscriber.
///
/// * `default_filter` -- filter used when `RUST_LOG` is not set
///   (e.g. `"gamepipe_engine=info"`).
/// * `log_json` -- when `true`, emit structured JSON log lines for log
///   aggregation instead of the human-readable format.
pub fn init_tracing(default_filter: &str, log_json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(env_filter);
    if log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
