//! OpenTelemetry observability infrastructure.
//!
//! Provides:
//! - Tracer provider lifecycle with OTLP or log export
//! - Span attribute keys
//! - Structured logging setup

pub mod exporter;
pub mod semconv;
pub mod telemetry;
pub mod tracing;
