//! Configuration parsing for the Greeter server.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Sensible defaults for quick start

use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::observability::telemetry::{ExporterKind, TelemetryConfig};

/// Greeter: a traced HTTP greeting service.
#[derive(Parser, Debug, Clone)]
#[command(name = "greeter")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "GREETER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "GREETER_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Where finished spans are sent
    #[arg(long, env = "GREETER_EXPORTER", value_enum, default_value_t = Exporter::Log)]
    pub exporter: Exporter,

    /// OpenTelemetry collector endpoint (used by the otlp exporter)
    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_ENDPOINT",
        default_value = "http://localhost:4317"
    )]
    pub otel_endpoint: String,

    /// Service name reported in the span resource
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "greeter")]
    pub service_name: String,

    /// Upper bound on flushing spans at shutdown, in seconds
    #[arg(long, env = "GREETER_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Parent request spans on an incoming `traceparent` header
    #[arg(long, env = "GREETER_PROPAGATE_TRACE_CONTEXT")]
    pub propagate_trace_context: bool,
}

/// Span exporter choice on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exporter {
    /// OTLP over gRPC to `--otel-endpoint`
    Otlp,
    /// Write finished spans to the log
    Log,
    /// Record spans and drop them
    None,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Telemetry settings derived from this configuration.
    pub fn telemetry(&self) -> TelemetryConfig {
        let exporter = match self.exporter {
            Exporter::Otlp => ExporterKind::Otlp {
                endpoint: self.otel_endpoint.clone(),
            },
            Exporter::Log => ExporterKind::Log,
            Exporter::None => ExporterKind::None,
        };

        TelemetryConfig {
            service_name: self.service_name.clone(),
            exporter,
        }
    }

    /// Deadline handed to telemetry shutdown.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Create a configuration for testing.
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0, // Random port
            log_level: "debug".into(),
            exporter: Exporter::None,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            log_level: "info".into(),
            exporter: Exporter::Log,
            otel_endpoint: "http://localhost:4317".into(),
            service_name: "greeter".into(),
            shutdown_timeout_secs: 5,
            propagate_trace_context: false,
        }
    }
}
