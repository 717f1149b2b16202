//! OpenTelemetry tracer provider lifecycle.
//!
//! A single [`Telemetry`] value owns the whole tracing pipeline:
//! - the SDK tracer provider and its span processor/exporter
//! - the tracer handed to request handlers
//! - the W3C trace-context + baggage propagator
//!
//! Nothing is registered globally; the value is built once in `main`,
//! injected into the router, and shut down after the server has stopped.

use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::trace::{TraceError, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::export::trace::SpanExporter;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{Config as TraceConfig, Sampler, Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::exporter::LogSpanExporter;

/// Instrumentation scope name of the request tracer.
pub const TRACER_NAME: &str = "greeter";

/// Error type for telemetry lifecycle operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to build span exporter: {0}")]
    Exporter(#[source] TraceError),

    #[error("Failed to shut down tracer provider: {0}")]
    Shutdown(#[source] TraceError),

    #[error("Tracer provider shutdown exceeded {0:?}")]
    ShutdownTimedOut(Duration),

    #[error("Tracer provider shutdown task failed: {0}")]
    ShutdownJoin(#[from] tokio::task::JoinError),
}

/// Where finished spans go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExporterKind {
    /// OTLP over gRPC, batched on the Tokio runtime.
    Otlp { endpoint: String },
    /// Structured log line per finished span.
    Log,
    /// Spans are recorded and dropped.
    None,
}

/// Settings needed to build the tracing pipeline.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub exporter: ExporterKind,
}

/// Process-wide tracing pipeline.
///
/// Not `Clone`: one provider per process, consumed by
/// [`Telemetry::shutdown`]. Handlers hold clones of the tracer.
pub struct Telemetry {
    provider: TracerProvider,
    tracer: Tracer,
    propagator: Arc<TextMapCompositePropagator>,
}

impl Telemetry {
    /// Build the tracing pipeline described by `config`.
    ///
    /// Must be called from within a Tokio runtime when a batching exporter
    /// is selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the OTLP exporter cannot be constructed.
    pub fn init(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let trace_config = trace_config(&config.service_name);

        let provider = match &config.exporter {
            ExporterKind::Otlp { endpoint } => opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(
                    opentelemetry_otlp::new_exporter()
                        .tonic()
                        .with_endpoint(endpoint.clone()),
                )
                .with_trace_config(trace_config)
                .install_batch(runtime::Tokio)
                .map_err(TelemetryError::Exporter)?,
            ExporterKind::Log => TracerProvider::builder()
                .with_config(trace_config)
                .with_batch_exporter(LogSpanExporter, runtime::Tokio)
                .build(),
            ExporterKind::None => TracerProvider::builder().with_config(trace_config).build(),
        };

        Ok(Self::from_provider(provider))
    }

    /// Build a pipeline that hands every finished span to `exporter`
    /// synchronously, as the span ends.
    pub fn with_exporter<E>(service_name: &str, exporter: E) -> Self
    where
        E: SpanExporter + 'static,
    {
        let provider = TracerProvider::builder()
            .with_config(trace_config(service_name))
            .with_simple_exporter(exporter)
            .build();

        Self::from_provider(provider)
    }

    fn from_provider(provider: TracerProvider) -> Self {
        let tracer = provider.tracer(TRACER_NAME);
        let propagator = TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ]);

        Self {
            provider,
            tracer,
            propagator: Arc::new(propagator),
        }
    }

    /// Tracer used for request spans.
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Cross-process context propagator (trace context + baggage).
    pub fn propagator(&self) -> &Arc<TextMapCompositePropagator> {
        &self.propagator
    }

    /// Flush pending spans and release exporter resources.
    ///
    /// The SDK shutdown blocks, so it runs on the blocking pool and is
    /// abandoned once `deadline` passes.
    ///
    /// # Errors
    ///
    /// Returns an error if the exporter fails to shut down, the deadline
    /// expires, or the blocking task panics. Callers are expected to log
    /// the error and carry on exiting.
    pub async fn shutdown(self, deadline: Duration) -> Result<(), TelemetryError> {
        let provider = self.provider;
        let flush = tokio::task::spawn_blocking(move || provider.shutdown());

        match tokio::time::timeout(deadline, flush).await {
            Ok(joined) => joined?.map_err(TelemetryError::Shutdown),
            Err(_) => Err(TelemetryError::ShutdownTimedOut(deadline)),
        }
    }
}

fn trace_config(service_name: &str) -> TraceConfig {
    TraceConfig::default()
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ]))
}
