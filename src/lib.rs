pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod redact;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing/logging for the host process
///
/// Note: This function can only be called once. Sink delivery failures from
/// the telemetry pipeline are reported through this subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
