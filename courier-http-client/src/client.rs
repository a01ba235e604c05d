//! HTTP client implementation.

use async_trait::async_trait;
use bytes::Bytes;
use courier_log::{Logger, TracingLogger};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

use crate::body::{ByteStream, JsonSlot, collect};
use crate::error::{SendError, SendResult, TransportError};
use crate::flags::LogFlag;
use crate::options::{APPLICATION_JSON, Options};
use crate::retry::{AttemptOutcome, RetryPolicy};
use crate::status::{self, should_log_error};
use crate::transport::{ReqwestTransport, Transport, TransportRequest};
use crate::{HttpClientError, Response};

// ============================================================================
// Sender traits
// ============================================================================

/// The client contract shared by [`HttpClient`] and
/// [`MockClient`](crate::MockClient).
#[async_trait]
pub trait HttpSender: Send + Sync {
    /// Base options every call is merged against.
    fn options(&self) -> Arc<Options>;

    /// Replace the base options. A non-empty base URI is normalized to end
    /// with exactly one `/`.
    fn set_options(&self, options: Options);

    /// Merge `options` over the base and execute the call.
    async fn send(&self, options: Options) -> SendResult;
}

/// A failed JSON call, with the decoded error body when one was registered
/// for the returned status.
#[derive(Debug)]
pub struct RejectedJson<E> {
    /// The failure.
    pub error: SendError,
    /// Decoded error body.
    pub body: Option<E>,
}

/// JSON conveniences on top of [`HttpSender`].
#[async_trait]
pub trait HttpSenderExt: HttpSender {
    /// Send with JSON content headers and decode a successful body as `T`.
    ///
    /// The value is `None` when the server returned an empty body.
    async fn send_json<T>(&self, options: Options) -> Result<(Response, Option<T>), SendError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let slot = JsonSlot::new();
        let response = self
            .send(options.with_json_content().decode_into(&slot))
            .await?;
        Ok((response, slot.take()))
    }

    /// Like [`send_json`](Self::send_json), additionally decoding the body
    /// of any status in `statuses` as `E`.
    async fn send_json_with_error<T, E>(
        &self,
        options: Options,
        statuses: &[u16],
    ) -> Result<(Response, Option<T>), RejectedJson<E>>
    where
        T: DeserializeOwned + Send + 'static,
        E: DeserializeOwned + Send + 'static,
    {
        let slot = JsonSlot::new();
        let error_slot = JsonSlot::new();
        let options = statuses.iter().fold(
            options.with_json_content().decode_into(&slot),
            |opts, status| opts.decode_status_into(*status, &error_slot),
        );

        match self.send(options).await {
            Ok(response) => Ok((response, slot.take())),
            Err(error) => Err(RejectedJson {
                error,
                body: error_slot.take(),
            }),
        }
    }
}

impl<S: HttpSender + ?Sized> HttpSenderExt for S {}

// ============================================================================
// HttpClient
// ============================================================================

/// HTTP client with layered options, bounded retry, and JSON transcoding.
pub struct HttpClient {
    base: RwLock<Arc<Options>>,
    transport: Arc<dyn Transport>,
    logger: Arc<dyn Logger>,
}

impl HttpClient {
    /// Create a client with the default `reqwest` transport and the
    /// `tracing` logger.
    pub fn new(options: Options) -> Self {
        Self::with_parts(
            options,
            Arc::new(ReqwestTransport::default()),
            Arc::new(TracingLogger::new()),
        )
    }

    /// Create a client from explicit collaborators.
    pub fn with_parts(
        options: Options,
        transport: Arc<dyn Transport>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let client = Self {
            base: RwLock::new(Arc::new(Options::new())),
            transport,
            logger,
        };
        client.set_options(options);
        client
    }

    /// Replace the logger.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Replace the default transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// The logger failures are reported to.
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Run the send pipeline on already merged options.
    async fn execute(&self, mut options: Options) -> SendResult {
        if options.req_stream.is_none()
            && let Some(obj) = options.req_obj.clone()
        {
            if !options.headers.contains_key(CONTENT_TYPE) {
                options
                    .headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
            }
            match obj.encode() {
                Ok(bytes) => options.req_body = Some(Bytes::from(bytes)),
                Err(e) => {
                    let err = HttpClientError::encode(e);
                    let response = Response::new(Arc::new(options), self.logger.clone());
                    if should_log_error(response.options().log_flags()) {
                        response.log_error("Fail to marshal json", &err, &[]);
                    }
                    return Err(SendError::new(err, response));
                }
            }
        }

        if options.rep_obj.is_some() && !options.headers.contains_key(ACCEPT) {
            options
                .headers
                .insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        }

        let options = Arc::new(options);
        let transport = options
            .transport
            .clone()
            .unwrap_or_else(|| self.transport.clone());

        if options.has_log_flag(LogFlag::Request) {
            Response::new(options.clone(), self.logger.clone())
                .log_info(&format!("Request: {}", options.uri), &[]);
        }

        let policy = RetryPolicy::from_options(&options);
        let mut attempt_no = 0;
        let last = loop {
            attempt_no += 1;
            let attempt = Attempt::run(transport.as_ref(), &options).await;
            let outcome = attempt.outcome();

            if !policy.should_retry(attempt_no, outcome) {
                break attempt;
            }

            debug!(
                attempt = attempt_no,
                outcome = ?outcome,
                uri = %options.uri,
                "Retrying request"
            );
            if let Some(delay) = policy.delay() {
                tokio::time::sleep(delay).await;
            }
        };

        let (response, error) = last.into_response(options.clone(), self.logger.clone());

        if let Some(e) = error {
            let err = HttpClientError::from(e);
            if should_log_error(options.log_flags()) {
                response.log_error("Fail to send http-request", &err, &[]);
            }
            return Err(SendError::new(err, response));
        }

        if let Err(err) = status::check_status(&response) {
            return Err(SendError::new(err, response));
        }
        if let Err(err) = status::decode_success(&response) {
            return Err(SendError::new(err, response));
        }

        if options.has_log_flag(LogFlag::Response) {
            response.log_info(&format!("Response: {}", options.uri), &[]);
        }

        Ok(response)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base", &self.base.read().uri)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(Options::new())
    }
}

#[async_trait]
impl HttpSender for HttpClient {
    fn options(&self) -> Arc<Options> {
        self.base.read().clone()
    }

    fn set_options(&self, mut options: Options) {
        options.normalize_base_uri();
        *self.base.write() = Arc::new(options);
    }

    async fn send(&self, options: Options) -> SendResult {
        let merged = self.options().merged_with(&options);
        self.execute(merged).await
    }
}

// ============================================================================
// Attempts
// ============================================================================

/// Result of one round trip. Only the last one becomes the [`Response`].
struct Attempt {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
    stream: Option<ByteStream>,
    error: Option<TransportError>,
}

impl Attempt {
    fn failed(error: TransportError) -> Self {
        Self {
            status: 0,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            stream: None,
            error: Some(error),
        }
    }

    /// Run one attempt under the per-attempt deadline, if any.
    async fn run(transport: &dyn Transport, options: &Options) -> Self {
        let request = TransportRequest::for_attempt(options);
        let round_trip = Self::round_trip(transport, request, options.rep_stream);

        let timeout = options.timeout();
        if timeout.is_zero() {
            return round_trip.await;
        }
        match tokio::time::timeout(timeout, round_trip).await {
            Ok(attempt) => attempt,
            Err(_) => Self::failed(TransportError::Timeout(timeout)),
        }
    }

    async fn round_trip(
        transport: &dyn Transport,
        request: TransportRequest,
        rep_stream: bool,
    ) -> Self {
        let reply = match transport.round_trip(request).await {
            Ok(reply) => reply,
            Err(e) => return Self::failed(e),
        };

        let status = reply.status.as_u16();
        let mut attempt = Self {
            status,
            headers: reply.headers,
            body: Bytes::new(),
            stream: None,
            error: None,
        };

        if rep_stream && status::is_success(status) {
            attempt.stream = Some(reply.body);
            return attempt;
        }

        match collect(reply.body).await {
            Ok(body) => attempt.body = body,
            Err(e) => attempt.error = Some(TransportError::Body(e.to_string())),
        }
        attempt
    }

    fn outcome(&self) -> AttemptOutcome {
        match self.error {
            Some(_) => AttemptOutcome::TransportError,
            None => AttemptOutcome::Status(self.status),
        }
    }

    fn into_response(
        self,
        options: Arc<Options>,
        logger: Arc<dyn Logger>,
    ) -> (Response, Option<TransportError>) {
        let response = Response::new(options, logger)
            .with_status(self.status)
            .with_headers(self.headers)
            .with_body(self.body)
            .with_stream(self.stream);
        (response, self.error)
    }
}
