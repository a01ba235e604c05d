//! Integration tests for common Courier workflows.
//!
//! These tests verify that the most common use cases work correctly.

use courier::prelude::*;
use courier::{ClientConfig, Setting, merge};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Options Tests
// =============================================================================

#[test]
fn test_nested_client_prefixes_and_uris() {
    let service = Options::new()
        .with_uri("http://billing/")
        .with_log_prefix("billing: ")
        .with_retry_count(2);
    let resource = Options::new()
        .with_uri("invoices/")
        .with_log_prefix("invoices: ");
    let call = Options::new().with_uri("42").reset_retry_count();

    let resolved = merge(&merge(&service, &resource), &call);
    assert_eq!(resolved.uri, "http://billing/invoices/42");
    assert_eq!(resolved.log_prefix, "billing: invoices: ");
    assert_eq!(resolved.retry_count, Setting::Reset);
    assert_eq!(resolved.retry_count(), 0);
    assert_eq!(resolved.method(), Method::GET);
}

#[test]
fn test_config_to_base_options() {
    let config = ClientConfig::from_toml_str(
        r#"
        base_uri = "http://krp:8082"
        log_flags = ["no_unauthorized", "no_forbidden"]
        timeout_ms = 1500
        "#,
    )
    .unwrap();

    let base = config.into_options().unwrap();
    let call = merge(&base, &Options::new().with_timeout(Duration::from_millis(10)));

    assert!(call.has_log_flag(LogFlag::NoUnauthorized));
    assert!(call.has_log_flag(LogFlag::NoForbidden));
    assert_eq!(call.timeout(), Duration::from_millis(10));
}

// =============================================================================
// Mock Client Tests
// =============================================================================

#[tokio::test]
async fn test_mock_client_as_sender() {
    let logger = Arc::new(MemoryLogger::new());
    let mock = Arc::new(MockClient::new(logger.clone()));
    mock.set_response(
        "users/1",
        MockResponse::json(&json!({"name": "Ada"})).unwrap(),
    );

    let sender: Arc<dyn HttpSender> = mock.clone();
    let (response, user) = sender
        .send_json::<serde_json::Value>(Options::new().with_uri("users/1"))
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(user, Some(json!({"name": "Ada"})));
    assert_eq!(mock.requests().len(), 1);
    assert!(logger.records().is_empty());
}

// =============================================================================
// Adapter Tests
// =============================================================================

#[cfg(feature = "adapters")]
#[tokio::test]
async fn test_adapters_share_one_mock() {
    let mock = Arc::new(MockClient::new(Arc::new(MemoryLogger::new())));
    mock.set_response("send", MockResponse::new());
    mock.set_response("jwt", MockResponse::json(&json!({"token": "abc"})).unwrap());
    mock.set_response("topics/audit", MockResponse::new());

    let sms = SmsClient::new(mock.clone());
    let jwt = JwtIssuer::new(mock.clone());
    let krp = KrpClient::new(mock.clone());

    assert!(sms.send("+15550100", "hi").await);
    assert_eq!(
        jwt.create("7", 60, serde_json::Map::new()).await.unwrap(),
        "abc"
    );
    krp.send_json("audit", "7", json!({"event": "login"}))
        .await
        .unwrap();

    let uris: Vec<String> = mock.requests().into_iter().map(|r| r.uri).collect();
    assert_eq!(uris, vec!["send", "jwt", "topics/audit"]);
}
