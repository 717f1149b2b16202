//! HTTP server setup and lifecycle.
//!
//! Configures the axum server with:
//! - One route per [`RouteHandler`]
//! - Peer address capture for span attributes
//! - Graceful shutdown support

use axum::extract::Request;
use axum::routing::on;
use axum::Router;
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::Config;
use crate::observability::telemetry::Telemetry;
use crate::service::{self, RouteHandler};

/// Error type for server lifecycle operations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid listen address: {0}")]
    InvalidAddress(#[from] AddrParseError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build a router mounting every handler at its path.
pub fn build_router(handlers: Vec<Arc<dyn RouteHandler>>) -> Router {
    handlers.into_iter().fold(Router::new(), |router, handler| {
        let path = handler.path();
        let method = handler.method();

        router.route(
            path,
            on(method, move |request: Request| {
                let handler = Arc::clone(&handler);
                async move { handler.handle(&request) }
            }),
        )
    })
}

/// Run the Greeter HTTP server.
///
/// # Arguments
///
/// * `config` - Server configuration
/// * `telemetry` - Tracing pipeline injected into the handlers
/// * `shutdown_rx` - Receiver for shutdown signal
///
/// # Returns
///
/// Returns when the server has shut down and in-flight requests are done.
#[tracing::instrument(skip_all, fields(address))]
pub async fn run_server(
    config: &Config,
    telemetry: &Telemetry,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::Span::current().record("address", tracing::field::display(addr));

    let router = build_router(service::routes(telemetry, config.propagate_trace_context));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Starting Greeter HTTP server");

    serve(listener, router, shutdown_rx).await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Serve `router` on an already bound listener until shutdown is signalled.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        // Wait for shutdown signal
        let _ = shutdown_rx.changed().await;
        tracing::info!("Shutdown signal received, stopping server");
    })
    .await?;

    Ok(())
}
