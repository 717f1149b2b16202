//! Span attribute keys.
//!
//! HTTP and network keys follow OpenTelemetry semantic conventions v1.4.0;
//! the rest are service-specific keys understood by the downstream
//! request-monitoring backend.

// Semantic conventions v1.4.0
pub const HTTP_METHOD: &str = "http.method";
pub const HTTP_SCHEME: &str = "http.scheme";
pub const HTTP_STATUS_CODE: &str = "http.status_code";
pub const HTTP_TARGET: &str = "http.target";
pub const HTTP_URL: &str = "http.url";
pub const HTTP_HOST: &str = "http.host";
pub const NET_HOST_PORT: &str = "net.host.port";
pub const HTTP_USER_AGENT: &str = "http.user_agent";
pub const HTTP_REQUEST_CONTENT_LENGTH: &str = "http.request_content_length";
pub const NET_PEER_IP: &str = "net.peer.ip";

// Request metadata
pub const CREATED_AT: &str = "created_at";
pub const DURATION_NS: &str = "duration_ns";
pub const PARENT_ID: &str = "parent_id";
pub const REFERER: &str = "referer";
pub const REQUEST_TYPE: &str = "request_type";
pub const SDK_TYPE: &str = "sdk_type";
pub const SERVICE_VERSION: &str = "service_version";
pub const TAGS: &str = "tags";

// Flattened request/response payloads
pub const PATH_PARAMS: &str = "path_params";
pub const QUERY_PARAMS: &str = "query_params";
pub const REQUEST_BODY: &str = "request_body";
pub const REQUEST_HEADERS: &str = "request_headers";
pub const RESPONSE_BODY: &str = "response_body";
pub const RESPONSE_HEADERS: &str = "response_headers";

/// `request_type` value for spans recorded by an inbound handler.
pub const REQUEST_TYPE_INCOMING: &str = "Incoming";

/// `sdk_type` value recorded on every request span.
pub const SDK_TYPE_ECHO: &str = "echo";
