//! Span exporter that writes finished spans to the log.
//!
//! Used when no collector is configured so that request spans are still
//! visible on the console.

use futures::future::BoxFuture;
use opentelemetry::KeyValue;
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};

/// Emits one `tracing` event per finished span.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSpanExporter;

impl SpanExporter for LogSpanExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        for span in &batch {
            let elapsed = span
                .end_time
                .duration_since(span.start_time)
                .unwrap_or_default();

            tracing::info!(
                target: "greeter::spans",
                name = %span.name,
                trace_id = %span.span_context.trace_id(),
                span_id = %span.span_context.span_id(),
                status = ?span.status,
                elapsed_us = elapsed.as_micros() as u64,
                attributes = %render_attributes(&span.attributes),
                "Span finished"
            );
        }

        Box::pin(std::future::ready(Ok(())))
    }
}

/// Render attributes as `key=value` pairs in recorded order.
pub fn render_attributes(attributes: &[KeyValue]) -> String {
    attributes
        .iter()
        .map(|kv| format!("{}={}", kv.key, kv.value))
        .collect::<Vec<_>>()
        .join(" ")
}
