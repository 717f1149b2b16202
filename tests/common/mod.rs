//! Test utilities and server harness for Greeter tests.
//!
//! Provides:
//! - In-process test server on an ephemeral port
//! - In-memory span exporter for inspecting finished spans
//! - Span attribute helpers

#![allow(dead_code)]

use greeter::observability::telemetry::Telemetry;
use greeter::server::{build_router, serve, ServerError};
use greeter::service;
use opentelemetry::Value;
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Tracing pipeline whose finished spans land in the returned exporter.
pub fn test_telemetry() -> (Telemetry, InMemorySpanExporter) {
    greeter::observability::tracing::init_test_tracing();
    let exporter = InMemorySpanExporter::default();
    let telemetry = Telemetry::with_exporter("greeter-test", exporter.clone());
    (telemetry, exporter)
}

/// A running server bound to `127.0.0.1` on a random port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub exporter: InMemorySpanExporter,
    telemetry: Telemetry,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    /// Start a server with default routes.
    pub async fn start() -> Self {
        Self::start_with(false).await
    }

    /// Start a server, optionally parenting request spans on incoming
    /// trace headers.
    pub async fn start_with(propagate_trace_context: bool) -> Self {
        let (telemetry, exporter) = test_telemetry();
        let router = build_router(service::routes(&telemetry, propagate_trace_context));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("no local addr");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(serve(listener, router, shutdown_rx));

        Self {
            addr,
            exporter,
            telemetry,
            shutdown_tx,
            handle,
        }
    }

    /// Absolute URL for `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Spans finished so far.
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.exporter
            .get_finished_spans()
            .expect("failed to read finished spans")
    }

    /// Stop the server, then shut the tracing pipeline down.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        self.handle
            .await
            .expect("server task panicked")
            .expect("server returned error");
        self.telemetry
            .shutdown(Duration::from_secs(5))
            .await
            .expect("telemetry shutdown failed");
    }
}

/// Value of attribute `key`, panicking when it is absent.
pub fn attr<'a>(span: &'a SpanData, key: &str) -> &'a Value {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| &kv.value)
        .unwrap_or_else(|| panic!("span {} has no attribute {key}", span.name))
}

/// String rendering of attribute `key`.
pub fn attr_str(span: &SpanData, key: &str) -> String {
    attr(span, key).as_str().into_owned()
}
