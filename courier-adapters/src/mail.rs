//! Mail gateway client.

use async_trait::async_trait;
use courier_http_client::{HttpSender, Method, Options};
use serde::Serialize;
use std::sync::Arc;

/// A message for the mail gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    /// Recipient addresses.
    pub receivers: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub message: String,
}

impl MailMessage {
    /// Create a message for the given recipients.
    pub fn new<I, S>(receivers: I, subject: impl Into<String>, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            receivers: receivers.into_iter().map(Into::into).collect(),
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Sends mail.
#[async_trait]
pub trait Mail: Send + Sync {
    /// Hand `message` to the gateway; `true` on success.
    async fn send(&self, message: &MailMessage) -> bool;
}

/// [`Mail`] over the gateway's `send` endpoint.
#[derive(Clone)]
pub struct MailClient {
    http: Arc<dyn HttpSender>,
}

impl MailClient {
    /// Create a client on top of one whose base URI is the gateway.
    pub fn new(http: Arc<dyn HttpSender>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Mail for MailClient {
    async fn send(&self, message: &MailMessage) -> bool {
        self.http
            .send(
                Options::new()
                    .with_method(Method::POST)
                    .with_uri("send")
                    .with_json(message.clone()),
            )
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_http_client::{MockClient, MockResponse};
    use courier_log::MemoryLogger;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_send_posts_message() {
        let mock = Arc::new(MockClient::new(Arc::new(MemoryLogger::new())));
        mock.set_response("send", MockResponse::new());
        let mail = MailClient::new(mock.clone());

        let message = MailMessage::new(["ops@example.com"], "Deploy", "Done");
        assert!(mail.send(&message).await);

        let request = mock.request("send").unwrap();
        assert_eq!(request.method(), Method::POST);

        let sent: Value = mock.request_json("send").unwrap();
        assert_eq!(
            sent,
            json!({"receivers": ["ops@example.com"], "subject": "Deploy", "message": "Done"})
        );
    }

    #[tokio::test]
    async fn test_send_reports_failure() {
        let mock = Arc::new(MockClient::new(Arc::new(MemoryLogger::new())));
        let mail = MailClient::new(mock.clone());
        let message = MailMessage::new(["ops@example.com"], "Deploy", "Done");

        assert!(!mail.send(&message).await);

        mock.set_response("send", MockResponse::new().with_status(500));
        assert!(!mail.send(&message).await);
    }
}
