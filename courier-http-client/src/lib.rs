//! # Courier HTTP Client
//!
//! A configurable outbound HTTP client: per-call options merged over
//! client-level defaults, bounded retry, JSON transcoding, and status
//! classification with per-status error-body targets.
//!
//! ## Features
//!
//! - **Layered Options**: Base options merged with per-call overrides
//! - **Bounded Retry**: Fixed count and interval; streaming bodies run once
//! - **Timeouts**: Per-attempt deadline
//! - **JSON Transcoding**: Request objects encoded, success and error bodies decoded
//! - **Structured Logging**: Every failure logged once with full request context
//! - **Mock Client**: In-memory drop-in for tests of dependent code
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier_http_client::{HttpClient, HttpSender, JsonSlot, Options};
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::new(Options::new().with_uri("https://api.example.com"));
//!
//!     let user: JsonSlot<HashMap<String, String>> = JsonSlot::new();
//!     let response = client
//!         .send(Options::new().with_uri("users/1").decode_into(&user))
//!         .await?;
//!
//!     println!("Status: {} user: {:?}", response.status(), user.take());
//!     Ok(())
//! }
//! ```
//!
//! ## With Retry and Error Bodies
//!
//! ```rust,no_run
//! use courier_http_client::{HttpClient, HttpSenderExt, LogFlag, Options};
//! use serde::Deserialize;
//! use std::time::Duration;
//!
//! #[derive(Debug, Deserialize)]
//! struct ApiError {
//!     code: String,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = HttpClient::new(
//!         Options::new()
//!             .with_uri("https://api.example.com")
//!             .with_retry_count(3)
//!             .with_retry_interval(Duration::from_millis(100))
//!             .with_timeout(Duration::from_secs(5))
//!             .with_log_flags(LogFlag::NoUnauthorized),
//!     );
//!
//!     let result = client
//!         .send_json_with_error::<serde_json::Value, ApiError>(
//!             Options::new()
//!                 .with_method(http::Method::POST)
//!                 .with_uri("orders")
//!                 .with_json(serde_json::json!({"item": "widget", "quantity": 5})),
//!             &[400, 409],
//!         )
//!         .await;
//!
//!     match result {
//!         Ok((response, order)) => println!("{}: {:?}", response.status(), order),
//!         Err(rejected) => println!("{} {:?}", rejected.error, rejected.body),
//!     }
//! }
//! ```

mod body;
mod client;
mod config;
mod error;
mod flags;
mod mock;
mod options;
mod response;
mod retry;
pub mod status;
mod transport;

pub use body::{
    BoxError, ByteStream, DecodeTarget, EncodeJson, JsonSlot, RequestByteStream, RequestObject,
    RequestStream, ResponseTarget,
};
pub use client::{HttpClient, HttpSender, HttpSenderExt, RejectedJson};
pub use config::{ClientConfig, ConfigError};
pub use error::{HttpClientError, Result, SendError, SendResult, TransportError};
pub use flags::{LogFlag, LogFlags};
pub use mock::{MockClient, MockResponse};
pub use options::{BasicAuth, Options, Params, Setting, merge};
pub use response::Response;
pub use retry::{AttemptOutcome, RetryPolicy};
pub use transport::{
    ReqwestTransport, RequestBody, Transport, TransportConfig, TransportRequest,
    TransportResponse,
};

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};

/// Prelude for common imports.
///
/// ```
/// use courier_http_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::body::{JsonSlot, RequestStream};
    pub use crate::client::{HttpClient, HttpSender, HttpSenderExt, RejectedJson};
    pub use crate::config::ClientConfig;
    pub use crate::error::{HttpClientError, Result, SendError, SendResult};
    pub use crate::flags::{LogFlag, LogFlags};
    pub use crate::mock::{MockClient, MockResponse};
    pub use crate::options::Options;
    pub use crate::response::Response;
    pub use http::{HeaderMap, Method, StatusCode, header};
}
