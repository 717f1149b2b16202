//! Request metadata read once per request for span attributes.

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Request, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::SocketAddr;

/// Port recorded when the request URI does not carry one.
///
/// This is a fixed fallback, not the port the server listens on.
pub const DEFAULT_PORT: &str = "8081";

/// Scheme recorded for every request; TLS is never terminated here.
pub const SCHEME: &str = "http";

/// Immutable view of the fields a request span is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSnapshot {
    pub method: String,
    pub scheme: &'static str,
    pub status_code: u16,
    /// Request path without the query string.
    pub target: String,
    /// Request URI as received (origin-form for HTTP/1.1 clients).
    pub url: String,
    pub host: String,
    pub port: String,
    pub user_agent: String,
    pub referer: String,
    /// `-1` when the length is unknown (chunked body).
    pub content_length: i64,
    pub client_ip: String,
    pub query_params: BTreeMap<String, Vec<String>>,
    pub headers: BTreeMap<String, Vec<String>>,
}

impl RequestSnapshot {
    /// Read the snapshot from `request`, with `status` as decided by the handler.
    pub fn capture<B>(request: &Request<B>, status: StatusCode) -> Self {
        let uri = request.uri();
        let headers = request.headers();

        let host = header_string(headers, header::HOST)
            .or_else(|| uri.authority().map(ToString::to_string))
            .unwrap_or_default();

        let port = uri
            .port()
            .map(|port| port.as_str().to_owned())
            .unwrap_or_else(|| DEFAULT_PORT.to_owned());

        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            method: request.method().to_string(),
            scheme: SCHEME,
            status_code: status.as_u16(),
            target: uri.path().to_owned(),
            url: uri.to_string(),
            host,
            port,
            user_agent: header_string(headers, header::USER_AGENT).unwrap_or_default(),
            referer: header_string(headers, header::REFERER).unwrap_or_default(),
            content_length: content_length(headers),
            client_ip: client_ip(headers, peer),
            query_params: query_params(uri.query()),
            headers: header_multimap(headers),
        }
    }

    /// Query parameters as a JSON object of name to values.
    pub fn query_params_json(&self) -> String {
        multimap_json(&self.query_params)
    }

    /// Request headers as a JSON object of name to values.
    pub fn headers_json(&self) -> String {
        multimap_json(&self.headers)
    }
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

fn content_length(headers: &HeaderMap) -> i64 {
    if let Some(length) = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
    {
        return length;
    }

    if headers.contains_key(header::TRANSFER_ENCODING) {
        -1
    } else {
        0
    }
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// socket peer.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_owned();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_owned();
    }

    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}

fn query_params(query: Option<&str>) -> BTreeMap<String, Vec<String>> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    if let Some(query) = query {
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(name.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }
    params
}

fn header_multimap(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        grouped
            .entry(name.as_str().to_owned())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    grouped
}

fn multimap_json(map: &BTreeMap<String, Vec<String>>) -> String {
    let object: serde_json::Map<String, Value> = map
        .iter()
        .map(|(name, values)| (name.clone(), Value::from(values.clone())))
        .collect();
    Value::Object(object).to_string()
}
