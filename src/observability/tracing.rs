//! Structured logging setup.
//!
//! Configures:
//! - Console logging with structured format
//! - Environment-based filter (via RUST_LOG)
//! - Optional bridge exporting `tracing` spans through the OpenTelemetry tracer

use opentelemetry_sdk::trace::Tracer;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Target of the listener lifecycle span, which lives as long as the server.
const SERVER_TARGET: &str = "greeter::server";

/// Initialize logging.
///
/// This sets up:
/// - Console logging with target, thread ids and source location
/// - Filter from `RUST_LOG`, falling back to `log_level`
/// - When `bridge` is given, a `tracing-opentelemetry` layer exporting
///   `tracing` spans through the same provider, minus the server lifecycle
///
/// # Arguments
///
/// * `log_level` - Filter directive used when `RUST_LOG` is unset or invalid
/// * `bridge` - Tracer receiving `tracing` spans, if any
///
/// # Panics
///
/// Panics if tracing has already been initialized.
pub fn init_tracing(log_level: &str, bridge: Option<Tracer>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let otel_layer = bridge.map(|tracer| {
        tracing_opentelemetry::layer()
            .with_tracer(tracer)
            .with_filter(bridge_filter())
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    tracing::info!(log_level, "Tracing initialized");
}

/// Targets forwarded to the OpenTelemetry bridge.
fn bridge_filter() -> Targets {
    Targets::new()
        .with_default(LevelFilter::TRACE)
        .with_target(SERVER_TARGET, LevelFilter::OFF)
}

/// Initialize tracing for tests (only logs errors).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}
