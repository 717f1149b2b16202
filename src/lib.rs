//! Greeter: a minimal HTTP greeting service instrumented with OpenTelemetry.
//!
//! `GET /hello` answers `{"message":"Hello World"}` and records one
//! `Greetings` span per request carrying HTTP semantic attributes, request
//! metadata and flattened request payloads.
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`observability`]: Tracer provider lifecycle, attribute keys and logging
//! - [`server`]: HTTP server setup
//! - [`service`]: Route handlers and the request span recorder

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // service::greetings::Greetings is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc,      // Panic docs can be verbose
    clippy::cast_precision_loss      // duration_ns is recorded as f64
)]

pub mod config;
pub mod observability;
pub mod server;
pub mod service;
