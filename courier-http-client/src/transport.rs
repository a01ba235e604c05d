//! Transport seam and the `reqwest` implementation.

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use std::fmt;
use std::time::Duration;

use crate::body::{BoxError, ByteStream, RequestByteStream};
use crate::error::TransportError;
use crate::options::{BasicAuth, Options};

/// Body of one outgoing request.
pub enum RequestBody {
    /// No body.
    Empty,
    /// Buffered body.
    Bytes(Bytes),
    /// Streaming body.
    Stream(RequestByteStream),
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// One HTTP request, fully resolved.
#[derive(Debug)]
pub struct TransportRequest {
    /// Method.
    pub method: Method,
    /// Absolute URI without query.
    pub uri: String,
    /// Encoded query string, if any.
    pub query: Option<String>,
    /// Headers.
    pub headers: HeaderMap,
    /// Basic-auth credentials.
    pub basic_auth: Option<BasicAuth>,
    /// Body.
    pub body: RequestBody,
}

impl TransportRequest {
    /// Build the request for one attempt.
    ///
    /// A streaming body is taken out of the options, so only the first
    /// attempt that builds a request sends it.
    pub(crate) fn for_attempt(options: &Options) -> Self {
        let body = match (&options.req_stream, &options.req_body) {
            (Some(stream), _) => stream
                .take()
                .map_or(RequestBody::Empty, RequestBody::Stream),
            (None, Some(bytes)) if !bytes.is_empty() => RequestBody::Bytes(bytes.clone()),
            _ => RequestBody::Empty,
        };

        Self {
            method: options.method(),
            uri: options.uri.clone(),
            query: (!options.params.is_empty()).then(|| options.params.encode()),
            headers: options.headers.clone(),
            basic_auth: options.basic_auth.clone(),
            body,
        }
    }
}

/// Response head plus an unread body.
pub struct TransportResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body stream.
    pub body: ByteStream,
}

impl TransportResponse {
    /// A response with a buffered body.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let chunk: Result<Bytes, BoxError> = Ok(body.into());
        Self {
            status,
            headers: HeaderMap::new(),
            body: Box::pin(futures::stream::iter([chunk])),
        }
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Executes one HTTP round trip.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send the request and return the response head with an unread body.
    async fn round_trip(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError>;
}

// ============================================================================
// reqwest transport
// ============================================================================

/// Configuration of the default `reqwest` transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// How long idle pooled connections are kept.
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// User agent string.
    pub user_agent: String,
    /// Enable gzip decompression.
    pub gzip: bool,
    /// Enable brotli decompression.
    pub brotli: bool,
    /// Follow redirects.
    pub follow_redirects: bool,
    /// Maximum redirects to follow.
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
            user_agent: format!("courier-http-client/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
            brotli: true,
            follow_redirects: true,
            max_redirects: 10,
        }
    }
}

/// [`Transport`] backed by a `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport from the given configuration.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let redirect = if config.follow_redirects {
            reqwest::redirect::Policy::limited(config.max_redirects)
        } else {
            reqwest::redirect::Policy::none()
        };

        let inner = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .gzip(config.gzip)
            .brotli(config.brotli)
            .redirect(redirect)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Ok(Self { inner })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn round_trip(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let mut url = url::Url::parse(&request.uri)
            .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", request.uri, e)))?;
        if let Some(query) = &request.query {
            url.set_query(Some(query));
        }

        let mut builder = self.inner.request(request.method, url).headers(request.headers);

        if let Some(auth) = &request.basic_auth {
            let value = HeaderValue::try_from(auth.header_value())
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            builder = builder.header(AUTHORIZATION, value);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Bytes(bytes) => builder.body(bytes),
            RequestBody::Stream(stream) => builder.body(reqwest::Body::wrap_stream(stream)),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body: ByteStream =
            Box::pin(response.bytes_stream().map_err(|e| Box::new(e) as BoxError));

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
