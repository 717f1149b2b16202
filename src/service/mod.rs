//! HTTP route handlers for Greeter.

pub mod greetings;
pub mod snapshot;

pub use greetings::{Greetings, HelloWorld};
pub use snapshot::RequestSnapshot;

use axum::extract::Request;
use axum::response::Response;
use axum::routing::MethodFilter;
use std::sync::Arc;

use crate::observability::telemetry::Telemetry;

/// A single route: where it is mounted and how it answers.
///
/// Handlers run synchronously inside the request task and must not share
/// mutable state between requests.
pub trait RouteHandler: Send + Sync + 'static {
    /// Methods this route answers to.
    fn method(&self) -> MethodFilter;

    /// Path the route is mounted at.
    fn path(&self) -> &'static str;

    /// Produce the response for one request.
    fn handle(&self, request: &Request) -> Response;
}

/// Routes served by the Greeter server.
///
/// # Arguments
///
/// * `telemetry` - Tracing pipeline injected into each handler
/// * `propagate_trace_context` - Parent request spans on incoming trace headers
pub fn routes(telemetry: &Telemetry, propagate_trace_context: bool) -> Vec<Arc<dyn RouteHandler>> {
    let mut greetings = Greetings::new(telemetry.tracer().clone());
    if propagate_trace_context {
        greetings = greetings.with_parent_extraction(telemetry.propagator().clone());
    }

    vec![Arc::new(greetings)]
}
