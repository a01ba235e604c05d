//! Kafka REST proxy publisher.

use async_trait::async_trait;
use courier_http_client::{HttpClientError, HttpSender, Method, Options};
use courier_log::{Logger, field};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Content type of the REST proxy's JSON embedded format.
pub const KAFKA_JSON_V2: &str = "application/vnd.kafka.json.v2+json";

/// Queued messages beyond this are dropped by [`KrpMock`].
const MOCK_QUEUE_LIMIT: usize = 100;

/// Publishes JSON records to a topic.
#[async_trait]
pub trait Krp: Send + Sync {
    /// Publish one record.
    async fn send_json(&self, topic: &str, key: &str, value: Value) -> Result<(), HttpClientError>;

    /// Publish several records sharing one key in a single request.
    async fn send_many_json(
        &self,
        topic: &str,
        key: &str,
        values: Vec<Value>,
    ) -> Result<(), HttpClientError>;
}

#[derive(Debug, Serialize)]
struct Record {
    key: String,
    value: Value,
}

#[derive(Debug, Serialize)]
struct SendRequest {
    records: Vec<Record>,
}

/// [`Krp`] over the REST proxy's `topics/<topic>` endpoint.
#[derive(Clone)]
pub struct KrpClient {
    http: Arc<dyn HttpSender>,
}

impl KrpClient {
    /// Create a publisher on top of a client whose base URI is the proxy.
    pub fn new(http: Arc<dyn HttpSender>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Krp for KrpClient {
    async fn send_json(&self, topic: &str, key: &str, value: Value) -> Result<(), HttpClientError> {
        self.send_many_json(topic, key, vec![value]).await
    }

    async fn send_many_json(
        &self,
        topic: &str,
        key: &str,
        values: Vec<Value>,
    ) -> Result<(), HttpClientError> {
        let request = SendRequest {
            records: values
                .into_iter()
                .map(|value| Record {
                    key: key.to_string(),
                    value,
                })
                .collect(),
        };

        self.http
            .send(
                Options::new()
                    .with_method(Method::POST)
                    .with_uri(format!("topics/{}", topic))
                    .with_header("Content-Type", KAFKA_JSON_V2)
                    .with_log_prefix(format!("topics/{}(json)", topic))
                    .with_json(request),
            )
            .await?;
        Ok(())
    }
}

/// A record captured by [`KrpMock`].
#[derive(Debug, Clone, PartialEq)]
pub struct KrpMessage {
    /// Topic.
    pub topic: String,
    /// Record key.
    pub key: String,
    /// Record value.
    pub value: Value,
}

/// In-memory [`Krp`].
///
/// Outside test mode every record is only logged. In test mode records are
/// queued for [`pull_all`](Self::pull_all).
pub struct KrpMock {
    logger: Arc<dyn Logger>,
    testing: bool,
    queue: Mutex<Vec<KrpMessage>>,
}

impl KrpMock {
    /// Create a mock; `testing` enables queueing.
    pub fn new(logger: Arc<dyn Logger>, testing: bool) -> Self {
        Self {
            logger,
            testing,
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Drain the queued records.
    pub fn pull_all(&self) -> Vec<KrpMessage> {
        std::mem::take(&mut *self.queue.lock())
    }

    /// Drop the queued records.
    pub fn clean(&self) {
        self.queue.lock().clear();
    }
}

#[async_trait]
impl Krp for KrpMock {
    async fn send_json(&self, topic: &str, key: &str, value: Value) -> Result<(), HttpClientError> {
        if !self.testing {
            self.logger.info(
                "KRP: SendJson",
                &[field("topic", topic), field("key", key), field("value", &value)],
            );
            return Ok(());
        }

        let mut queue = self.queue.lock();
        if queue.len() > MOCK_QUEUE_LIMIT {
            queue.clear();
        }
        queue.push(KrpMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            value,
        });
        Ok(())
    }

    async fn send_many_json(
        &self,
        topic: &str,
        key: &str,
        values: Vec<Value>,
    ) -> Result<(), HttpClientError> {
        for value in values {
            self.send_json(topic, key, value).await?;
        }
        Ok(())
    }
}
