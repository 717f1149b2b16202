//! Greeter: a traced HTTP greeting service.
//!
//! # Usage
//!
//! ```bash
//! greeter --port 3000 --exporter otlp --otel-endpoint http://localhost:4317
//! ```
//!
//! Environment variables can also be used:
//! - `GREETER_PORT`: Port to listen on
//! - `GREETER_EXPORTER`: Span exporter (otlp, log, none)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector endpoint
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::Context;
use greeter::config::Config;
use greeter::observability::telemetry::Telemetry;
use greeter::observability::tracing::init_tracing;
use greeter::server::run_server;
use tokio::sync::watch;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
  Greeter v{} - traced HTTP greeting service

  Configuration:
    Address:    {}:{}
    Exporter:   {:?}
    Endpoint:   {}
    Service:    {}
    Log Level:  {}

  Press Ctrl+C to shutdown gracefully.
"#,
        version,
        config.host,
        config.port,
        config.exporter,
        config.otel_endpoint,
        config.service_name,
        config.log_level
    );
}

/// Resolve once SIGINT (Ctrl+C) or, on unix, SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    () = ctrl_c => {
                        tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating shutdown...");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                ctrl_c.await;
                tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        tracing::info!("Received Ctrl+C, initiating shutdown...");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    // Build the tracing pipeline; nothing can be traced without it
    let telemetry =
        Telemetry::init(&config.telemetry()).context("failed to initialize tracer provider")?;

    // Initialize logging, bridged into the same provider
    init_tracing(&config.log_level, Some(telemetry.tracer().clone()));
    tracing::info!(service = %config.service_name, exporter = ?config.exporter, "Tracer provider initialized");

    // Print startup banner
    print_banner(&config);

    // Create shutdown signal channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn signal handler task
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    // Run the server
    let served = run_server(&config, &telemetry, shutdown_rx).await;
    if let Err(e) = &served {
        tracing::error!(error = %e, "Server failed");
    }

    // Flush spans only once the listener is closed; failure here is not fatal
    if let Err(e) = telemetry.shutdown(config.shutdown_timeout()).await {
        tracing::warn!(error = %e, "Error shutting down tracer provider");
    }

    served?;
    tracing::info!("Greeter shutdown complete");
    Ok(())
}
