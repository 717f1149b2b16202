//! `GET /hello` handler and its request span.
//!
//! Every request produces exactly one `Greetings` span. Attributes are
//! written in three fixed groups (semantic, request metadata, flattened
//! payloads) between span start and span end.

use axum::extract::Request;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::MethodFilter;
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use opentelemetry::propagation::{Extractor, TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::{Span as _, Status, Tracer as _};
use opentelemetry::{Array, Context, KeyValue, Value};
use opentelemetry_sdk::trace::Tracer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use super::snapshot::RequestSnapshot;
use super::RouteHandler;
use crate::observability::semconv;

/// Name of the span recorded for each greeting.
pub const SPAN_NAME: &str = "Greetings";

/// Route served by [`Greetings`].
pub const PATH: &str = "/hello";

/// Response payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloWorld {
    pub message: String,
}

impl HelloWorld {
    pub fn new() -> Self {
        Self {
            message: "Hello World".to_string(),
        }
    }
}

impl Default for HelloWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Greeting handler.
///
/// Holds only the injected tracer (and, when enabled, the propagator), so
/// concurrent requests share no mutable state.
#[derive(Clone)]
pub struct Greetings {
    tracer: Tracer,
    propagator: Option<Arc<TextMapCompositePropagator>>,
}

impl Greetings {
    /// Create a handler whose spans start from an empty context.
    pub fn new(tracer: Tracer) -> Self {
        Self {
            tracer,
            propagator: None,
        }
    }

    /// Parent request spans on the trace context found in request headers.
    #[must_use]
    pub fn with_parent_extraction(mut self, propagator: Arc<TextMapCompositePropagator>) -> Self {
        self.propagator = Some(propagator);
        self
    }

    /// Record the span for one request.
    ///
    /// The span ends before this returns; if anything in between unwinds,
    /// dropping the SDK span ends it.
    pub fn record<B>(&self, request: &axum::http::Request<B>, status: StatusCode) {
        let created_at = Utc::now();
        let started = Instant::now();

        let parent = self.parent_context(request.headers());
        let mut span = self.tracer.start_with_context(SPAN_NAME, &parent);

        let snapshot = RequestSnapshot::capture(request, status);

        span.set_status(Status::Ok);
        span.set_attributes(semantic_attributes(&snapshot));
        span.set_attributes(metadata_attributes(&snapshot, created_at, started));
        span.set_attributes(payload_attributes(&snapshot));

        span.end();
    }

    fn parent_context(&self, headers: &HeaderMap) -> Context {
        match &self.propagator {
            Some(propagator) => propagator.extract(&HeaderExtractor(headers)),
            None => Context::new(),
        }
    }
}

impl RouteHandler for Greetings {
    fn method(&self) -> MethodFilter {
        MethodFilter::GET
    }

    fn path(&self) -> &'static str {
        PATH
    }

    fn handle(&self, request: &Request) -> Response {
        let status = StatusCode::OK;
        self.record(request, status);
        (status, Json(HelloWorld::new())).into_response()
    }
}

fn semantic_attributes(snapshot: &RequestSnapshot) -> [KeyValue; 10] {
    [
        KeyValue::new(semconv::HTTP_METHOD, snapshot.method.clone()),
        KeyValue::new(semconv::HTTP_SCHEME, snapshot.scheme),
        KeyValue::new(semconv::HTTP_STATUS_CODE, i64::from(snapshot.status_code)),
        KeyValue::new(semconv::HTTP_TARGET, snapshot.target.clone()),
        KeyValue::new(semconv::HTTP_URL, snapshot.url.clone()),
        KeyValue::new(semconv::HTTP_HOST, snapshot.host.clone()),
        KeyValue::new(semconv::NET_HOST_PORT, snapshot.port.clone()),
        KeyValue::new(semconv::HTTP_USER_AGENT, snapshot.user_agent.clone()),
        KeyValue::new(semconv::HTTP_REQUEST_CONTENT_LENGTH, snapshot.content_length),
        KeyValue::new(semconv::NET_PEER_IP, snapshot.client_ip.clone()),
    ]
}

// duration_ns is taken right after `started`, so it stays close to zero.
fn metadata_attributes(
    snapshot: &RequestSnapshot,
    created_at: DateTime<Utc>,
    started: Instant,
) -> [KeyValue; 8] {
    [
        KeyValue::new(
            semconv::CREATED_AT,
            created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
        ),
        KeyValue::new(semconv::DURATION_NS, started.elapsed().as_nanos() as f64),
        KeyValue::new(semconv::PARENT_ID, ""),
        KeyValue::new(semconv::REFERER, snapshot.referer.clone()),
        KeyValue::new(semconv::REQUEST_TYPE, semconv::REQUEST_TYPE_INCOMING),
        KeyValue::new(semconv::SDK_TYPE, semconv::SDK_TYPE_ECHO),
        KeyValue::new(semconv::SERVICE_VERSION, ""),
        KeyValue::new(semconv::TAGS, Value::Array(Array::String(Vec::new()))),
    ]
}

// Bodies and response headers are placeholders; GET requests carry no body.
fn payload_attributes(snapshot: &RequestSnapshot) -> [KeyValue; 6] {
    [
        KeyValue::new(semconv::PATH_PARAMS, snapshot.target.clone()),
        KeyValue::new(semconv::QUERY_PARAMS, snapshot.query_params_json()),
        KeyValue::new(semconv::REQUEST_BODY, "{}"),
        KeyValue::new(semconv::REQUEST_HEADERS, snapshot.headers_json()),
        KeyValue::new(semconv::RESPONSE_BODY, "{}"),
        KeyValue::new(semconv::RESPONSE_HEADERS, "{}"),
    ]
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}
