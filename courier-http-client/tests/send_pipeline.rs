//! End-to-end tests of the send pipeline against a real HTTP server.

use courier_http_client::prelude::*;
use courier_http_client::{ReqwestTransport, TransportConfig};
use courier_log::{Level, MemoryLogger};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{basic_auth, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, base: Options) -> (HttpClient, Arc<MemoryLogger>) {
    let logger = Arc::new(MemoryLogger::new());
    let transport = ReqwestTransport::new(TransportConfig::default()).unwrap();
    let client = HttpClient::with_parts(
        base.with_uri(server.uri()),
        Arc::new(transport),
        logger.clone(),
    );
    (client, logger)
}

// =============================================================================
// Headers, params and decoding
// =============================================================================

#[tokio::test]
async fn test_headers_params_and_success_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s200"))
        .and(header("Authorization", "token"))
        .and(header("Header", "h_value"))
        .and(header("Accept", "application/json"))
        .and(query_param("qp", "qpv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"a": "1"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, logger) = client(&server, Options::new().with_header("Authorization", "token"));

    let rep: JsonSlot<HashMap<String, String>> = JsonSlot::new();
    let response = client
        .send(
            Options::new()
                .with_uri("s200")
                .with_header("Header", "h_value")
                .with_param("qp", "qpv")
                .decode_into(&rep)
                .with_log_flags(LogFlag::Request | LogFlag::Response),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.is_success());
    assert_eq!(rep.get().unwrap()["a"], "1");
    assert_eq!(logger.count(Level::Info), 2);
    assert_eq!(logger.count(Level::Error), 0);
}

#[tokio::test]
async fn test_override_header_replaces_base() {
    let server = MockServer::start().await;
    Mock::given(path("/h"))
        .and(header("X", "2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server, Options::new().with_header("X", "1"));

    client
        .send(Options::new().with_uri("h").with_header("X", "2"))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let values: Vec<_> = requests[0].headers.get_all("x").iter().collect();
    assert_eq!(values.len(), 1);
}

#[tokio::test]
async fn test_json_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"item": "widget", "quantity": 5})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client(&server, Options::new());

    let (response, order) = client
        .send_json::<serde_json::Value>(
            Options::new()
                .with_method(Method::POST)
                .with_uri("orders")
                .with_json(json!({"item": "widget", "quantity": 5})),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    assert_eq!(order, Some(json!({"id": 7})));
}

// =============================================================================
// Retry
// =============================================================================

#[tokio::test]
async fn test_retry_500_then_200() {
    let server = MockServer::start().await;
    Mock::given(path("/e500"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(path("/e500"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (client, logger) = client(
        &server,
        Options::new()
            .with_retry_count(1)
            .with_retry_interval(Duration::from_millis(10)),
    );

    let start = Instant::now();
    let response = client.send(Options::new().with_uri("e500")).await.unwrap();

    assert_eq!(response.status(), 200);
    assert!(start.elapsed() >= Duration::from_millis(10));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert!(logger.records().is_empty());
}

#[tokio::test]
async fn test_retry_exhausted_returns_bad_status() {
    let server = MockServer::start().await;
    Mock::given(path("/e500"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let (client, logger) = client(
        &server,
        Options::new()
            .with_retry_count(1)
            .with_retry_interval(Duration::from_millis(10)),
    );

    let err = client
        .send(Options::new().with_uri("e500"))
        .await
        .unwrap_err();

    assert!(err.is_bad_status());
    assert_eq!(err.status(), 500);
    assert_eq!(err.response().unwrap().text(), "boom");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert_eq!(logger.count(Level::Error), 1);
}

#[tokio::test]
async fn test_reset_retry_count_disables_base_retries() {
    let server = MockServer::start().await;
    Mock::given(path("/e500"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (client, _) = client(&server, Options::new().with_retry_count(3));

    let err = client
        .send(Options::new().with_uri("e500").reset_retry_count())
        .await
        .unwrap_err();

    assert!(err.is_bad_status());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

// =============================================================================
// Timeout
// =============================================================================

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;
    Mock::given(path("/timeout"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;

    let (client, logger) = client(&server, Options::new());

    let err = client
        .send(
            Options::new()
                .with_uri("timeout")
                .with_timeout(Duration::from_millis(20)),
        )
        .await
        .unwrap_err();

    assert!(err.error().is_timeout());
    assert_eq!(err.status(), 0);
    assert_eq!(logger.count(Level::Error), 1);
    assert_eq!(logger.records()[0].message, "Fail to send http-request");
}

// =============================================================================
// Status-specific decoding
// =============================================================================

#[tokio::test]
async fn test_status_specific_error_body() {
    let server = MockServer::start().await;
    Mock::given(path("/e400"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "code"})))
        .mount(&server)
        .await;

    let (client, logger) = client(&server, Options::new());

    let rep: JsonSlot<HashMap<String, String>> = JsonSlot::new();
    let bad_request: JsonSlot<HashMap<String, String>> = JsonSlot::new();
    let err = client
        .send(
            Options::new()
                .with_uri("e400")
                .decode_into(&rep)
                .decode_status_into(400, &bad_request),
        )
        .await
        .unwrap_err();

    assert!(err.is_bad_status());
    assert_eq!(err.status(), 400);
    assert_eq!(bad_request.get().unwrap()["error"], "code");
    assert!(!rep.is_filled());
    assert!(logger.records().is_empty());
}

#[tokio::test]
async fn test_unregistered_status_leaves_targets_empty() {
    let server = MockServer::start().await;
    Mock::given(path("/e400"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "code"})))
        .mount(&server)
        .await;

    let (client, logger) = client(&server, Options::new());

    let conflict: JsonSlot<HashMap<String, String>> = JsonSlot::new();
    let err = client
        .send(
            Options::new()
                .with_uri("e400")
                .decode_status_into(409, &conflict),
        )
        .await
        .unwrap_err();

    assert!(err.is_bad_status());
    assert!(!conflict.is_filled());
    assert_eq!(logger.count(Level::Error), 1);
    assert_eq!(logger.records()[0].field("rep_body"), Some(r#"{"error":"code"}"#));
}

// =============================================================================
// Basic auth
// =============================================================================

#[tokio::test]
async fn test_basic_auth_from_base_and_override() {
    let server = MockServer::start().await;
    Mock::given(path("/basic_auth"))
        .and(basic_auth("admin", "secret"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(path("/basic_auth"))
        .respond_with(ResponseTemplate::new(401))
        .with_priority(10)
        .mount(&server)
        .await;

    let (client, _) = client(&server, Options::new().with_basic_auth("admin", "secret"));

    let response = client
        .send(Options::new().with_uri("basic_auth"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let err = client
        .send(
            Options::new()
                .with_uri("basic_auth")
                .with_basic_auth("admin", "")
                .with_log_flags(LogFlag::NoUnauthorized),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), 401);
}

// =============================================================================
// Streaming
// =============================================================================

#[tokio::test]
async fn test_streaming_request_body_sent_once() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (client, _) = client(&server, Options::new().with_retry_count(3));

    let err = client
        .send(
            Options::new()
                .with_method(Method::PUT)
                .with_uri("upload")
                .with_stream(RequestStream::from_bytes("payload")),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status(), 503);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body, b"payload");
}

#[tokio::test]
async fn test_response_stream_passthrough() {
    use futures::StreamExt;

    let server = MockServer::start().await;
    Mock::given(path("/download"))
        .respond_with(ResponseTemplate::new(200).set_body_string("file contents"))
        .mount(&server)
        .await;

    let (client, _) = client(&server, Options::new());

    let mut response = client
        .send(Options::new().with_uri("download").with_response_stream())
        .await
        .unwrap();

    assert!(response.body().is_empty());
    let mut stream = response.take_stream().unwrap();
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(body, b"file contents");
}
