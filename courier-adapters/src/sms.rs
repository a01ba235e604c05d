//! SMS gateway client.

use async_trait::async_trait;
use courier_http_client::{HttpSender, Method, Options};
use serde::Serialize;
use std::sync::Arc;

/// Sends text messages.
#[async_trait]
pub trait Sms: Send + Sync {
    /// Send and wait for the gateway to deliver; `true` on success.
    async fn send(&self, phone: &str, msg: &str) -> bool;

    /// Queue on the gateway without waiting for delivery; `true` on success.
    async fn send_async(&self, phone: &str, msg: &str) -> bool;
}

#[derive(Debug, Serialize)]
struct SendRequest {
    to: String,
    text: String,
    sync: bool,
}

/// [`Sms`] over the gateway's `send` endpoint.
#[derive(Clone)]
pub struct SmsClient {
    http: Arc<dyn HttpSender>,
}

impl SmsClient {
    /// Create a client on top of one whose base URI is the gateway.
    pub fn new(http: Arc<dyn HttpSender>) -> Self {
        Self { http }
    }

    async fn post(&self, phone: &str, msg: &str, sync: bool) -> bool {
        self.http
            .send(
                Options::new()
                    .with_method(Method::POST)
                    .with_uri("send")
                    .with_json(SendRequest {
                        to: phone.to_string(),
                        text: msg.to_string(),
                        sync,
                    }),
            )
            .await
            .is_ok()
    }
}

#[async_trait]
impl Sms for SmsClient {
    async fn send(&self, phone: &str, msg: &str) -> bool {
        self.post(phone, msg, true).await
    }

    async fn send_async(&self, phone: &str, msg: &str) -> bool {
        self.post(phone, msg, false).await
    }
}
