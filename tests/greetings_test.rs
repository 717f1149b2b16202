//! End-to-end tests for `GET /hello` over a real socket.
//!
//! Tests:
//! - Harness binds an ephemeral port
//! - Response status, content type and body
//! - One ended `Greetings` span per request with the expected attributes
//! - Independent spans under concurrent load
//! - Opt-in parent extraction from `traceparent`

mod common;

use common::{attr, attr_str, TestServer};
use futures::future::join_all;
use greeter::service::HelloWorld;
use opentelemetry::trace::{SpanId, Status, TraceId};
use opentelemetry::{Array, Value};
use std::collections::HashSet;

#[tokio::test]
async fn test_server_starts_on_ephemeral_port() {
    let server = TestServer::start().await;
    assert_ne!(server.addr.port(), 0);
    assert!(server.url("/hello").ends_with("/hello"));
    server.shutdown().await;
}

/// Response is 200 with the fixed JSON payload.
#[tokio::test]
async fn test_hello_returns_json_greeting() {
    let server = TestServer::start().await;

    let response = reqwest::get(server.url("/hello"))
        .await
        .expect("request failed");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/json",
        "content type should be JSON"
    );

    let body: HelloWorld = response.json().await.expect("body is not JSON");
    assert_eq!(body.message, "Hello World");

    server.shutdown().await;
}

/// The span is ended and exported by the time the client has the response.
#[tokio::test]
async fn test_hello_emits_one_span_per_request() {
    let server = TestServer::start().await;

    for expected in 1..=3 {
        reqwest::get(server.url("/hello"))
            .await
            .expect("request failed");

        let spans = server.finished_spans();
        assert_eq!(spans.len(), expected);
        assert!(spans.iter().all(|span| span.name == "Greetings"));
    }

    server.shutdown().await;
}

/// Attributes reflect what the socket and client actually sent.
#[tokio::test]
async fn test_span_attributes_over_socket() {
    let server = TestServer::start().await;
    let client = reqwest::Client::builder()
        .user_agent("greeter-tests/1.0")
        .build()
        .unwrap();

    client
        .get(server.url("/hello?lang=en&lang=fr"))
        .header("referer", "http://example.com/start")
        .send()
        .await
        .expect("request failed");

    let spans = server.finished_spans();
    assert_eq!(spans.len(), 1);
    let span = &spans[0];

    assert_eq!(span.status, Status::Ok);
    assert_eq!(span.parent_span_id, SpanId::INVALID);

    assert_eq!(attr_str(span, "http.method"), "GET");
    assert_eq!(attr_str(span, "http.scheme"), "http");
    assert_eq!(attr(span, "http.status_code"), &Value::I64(200));
    assert_eq!(attr_str(span, "http.target"), "/hello");
    assert_eq!(attr_str(span, "http.url"), "/hello?lang=en&lang=fr");
    assert_eq!(attr_str(span, "http.host"), server.addr.to_string());
    // HTTP/1.1 clients send origin-form URIs, so the fallback applies.
    assert_eq!(attr_str(span, "net.host.port"), "8081");
    assert_eq!(attr_str(span, "http.user_agent"), "greeter-tests/1.0");
    assert_eq!(attr(span, "http.request_content_length"), &Value::I64(0));
    assert_eq!(attr_str(span, "net.peer.ip"), "127.0.0.1");

    assert_eq!(attr_str(span, "referer"), "http://example.com/start");
    assert_eq!(attr_str(span, "request_type"), "Incoming");
    assert_eq!(attr_str(span, "sdk_type"), "echo");
    assert_eq!(attr_str(span, "parent_id"), "");
    assert_eq!(attr_str(span, "service_version"), "");
    assert!(matches!(
        attr(span, "tags"),
        Value::Array(Array::String(tags)) if tags.is_empty()
    ));

    assert_eq!(attr_str(span, "path_params"), "/hello");
    assert_eq!(attr_str(span, "query_params"), r#"{"lang":["en","fr"]}"#);
    let headers: serde_json::Value =
        serde_json::from_str(&attr_str(span, "request_headers")).expect("headers not JSON");
    assert_eq!(headers["user-agent"][0], "greeter-tests/1.0");
    assert_eq!(headers["referer"][0], "http://example.com/start");

    server.shutdown().await;
}

/// Unmatched routes and methods produce no span.
#[tokio::test]
async fn test_unknown_routes_are_not_traced() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let missing = client.get(server.url("/goodbye")).send().await.unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let wrong_method = client.post(server.url("/hello")).send().await.unwrap();
    assert_eq!(wrong_method.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);

    assert!(server.finished_spans().is_empty());

    server.shutdown().await;
}

/// 100 simultaneous requests yield 100 independent spans.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_produce_independent_spans() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let requests = (0..100).map(|n| {
        let client = client.clone();
        let url = server.url(&format!("/hello?n={n}"));
        tokio::spawn(async move { client.get(url).send().await })
    });

    for result in join_all(requests).await {
        let response = result.expect("task panicked").expect("request failed");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    let spans = server.finished_spans();
    assert_eq!(spans.len(), 100);

    let span_ids: HashSet<SpanId> = spans.iter().map(|s| s.span_context.span_id()).collect();
    assert_eq!(span_ids.len(), 100, "span ids must be distinct");

    let mut seen: HashSet<String> = HashSet::new();
    for span in &spans {
        assert_eq!(span.status, Status::Ok);
        assert_eq!(attr_str(span, "http.target"), "/hello");

        let query: serde_json::Value =
            serde_json::from_str(&attr_str(span, "query_params")).unwrap();
        let n = query["n"][0].as_str().expect("n missing").to_string();

        // Each span carries exactly its own request's query.
        assert_eq!(attr_str(span, "http.url"), format!("/hello?n={n}"));
        assert!(seen.insert(n), "query value seen twice");
    }
    assert_eq!(seen.len(), 100);

    server.shutdown().await;
}

/// By default an incoming traceparent is ignored.
#[tokio::test]
async fn test_traceparent_ignored_without_propagation() {
    let server = TestServer::start().await;

    reqwest::Client::new()
        .get(server.url("/hello"))
        .header(
            "traceparent",
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01",
        )
        .send()
        .await
        .unwrap();

    let spans = server.finished_spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].parent_span_id, SpanId::INVALID);

    server.shutdown().await;
}

/// With propagation enabled the span joins the caller's trace.
#[tokio::test]
async fn test_traceparent_extracted_with_propagation() {
    let server = TestServer::start_with(true).await;

    reqwest::Client::new()
        .get(server.url("/hello"))
        .header(
            "traceparent",
            "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01",
        )
        .send()
        .await
        .unwrap();

    let spans = server.finished_spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(
        spans[0].span_context.trace_id(),
        TraceId::from_hex("0af7651916cd43dd8448eb211c80319c").unwrap()
    );
    assert_eq!(
        spans[0].parent_span_id,
        SpanId::from_hex("b7ad6b7169203331").unwrap()
    );
    assert_eq!(attr_str(&spans[0], "parent_id"), "");

    server.shutdown().await;
}
