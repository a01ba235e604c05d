//! HTTP client error types.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::Response;

/// Result type for HTTP client operations.
pub type Result<T> = std::result::Result<T, HttpClientError>;

/// Result of [`HttpSender::send`](crate::HttpSender::send).
pub type SendResult = std::result::Result<Response, SendError>;

/// Failures below HTTP semantics: the round trip itself did not complete.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The per-attempt deadline expired.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection could not be established.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The request could not be built (bad URI, bad header value).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Reading the response body failed.
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// Underlying HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[source] Arc<reqwest::Error>),
}

impl TransportError {
    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_)) || matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Check if this is a connection error.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connection(_)) || matches!(self, Self::Http(e) if e.is_connect())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            Self::Connection(e.to_string())
        } else if e.is_builder() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Http(Arc::new(e))
        }
    }
}

/// HTTP client errors.
#[derive(Debug, Clone, Error)]
pub enum HttpClientError {
    /// The request object could not be serialized.
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] Arc<serde_json::Error>),

    /// The round trip failed on every attempt that was made.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The final status was outside `[200, 300)` and no status-specific
    /// decode target consumed the body.
    #[error("bad_status_code")]
    BadStatusCode,

    /// A success body or status-specific error body was not valid JSON
    /// for its target.
    #[error("Failed to decode response body: {0}")]
    Decode(#[source] Arc<serde_json::Error>),

    /// The mock client has no canned response for this URI.
    #[error("page_not_found: {0}")]
    RouteNotFound(String),
}

impl HttpClientError {
    pub(crate) fn encode(e: serde_json::Error) -> Self {
        Self::Encode(Arc::new(e))
    }

    pub(crate) fn decode(e: serde_json::Error) -> Self {
        Self::Decode(Arc::new(e))
    }

    /// Check if this is the bad-status sentinel.
    pub fn is_bad_status(&self) -> bool {
        matches!(self, Self::BadStatusCode)
    }

    /// Check if this is a transport-level failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Check if this is an encode or decode failure.
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Encode(_) | Self::Decode(_))
    }
}

/// A failed call: the error plus whatever response was observed.
///
/// The status code and raw body stay available so callers can inspect
/// them without re-issuing the request.
pub struct SendError {
    error: HttpClientError,
    response: Option<Box<Response>>,
}

impl SendError {
    pub(crate) fn new(error: HttpClientError, response: Response) -> Self {
        Self {
            error,
            response: Some(Box::new(response)),
        }
    }

    pub(crate) fn bare(error: HttpClientError) -> Self {
        Self {
            error,
            response: None,
        }
    }

    /// The error that ended the call.
    pub fn error(&self) -> &HttpClientError {
        &self.error
    }

    /// Consume and return the error.
    pub fn into_error(self) -> HttpClientError {
        self.error
    }

    /// The response observed before the failure, if any.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_deref()
    }

    /// Consume and return the response, if any.
    pub fn into_response(self) -> Option<Response> {
        self.response.map(|r| *r)
    }

    /// Status code of the observed response, `0` when none was received.
    pub fn status(&self) -> u16 {
        self.response.as_ref().map_or(0, |r| r.status())
    }

    /// Check if this is the bad-status sentinel.
    pub fn is_bad_status(&self) -> bool {
        self.error.is_bad_status()
    }
}

impl fmt::Debug for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendError")
            .field("error", &self.error)
            .field("status", &self.status())
            .finish()
    }
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

impl From<SendError> for HttpClientError {
    fn from(e: SendError) -> Self {
        e.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        let err = HttpClientError::from(TransportError::Timeout(Duration::from_millis(20)));
        assert!(err.is_transport());
        assert!(err.is_timeout());
        assert!(!err.is_bad_status());
        assert!(err.to_string().contains("20ms"));
    }

    #[test]
    fn test_bad_status_sentinel() {
        let err = HttpClientError::BadStatusCode;
        assert!(err.is_bad_status());
        assert_eq!(err.to_string(), "bad_status_code");
    }

    #[test]
    fn test_json_errors_keep_source() {
        let source = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = HttpClientError::decode(source);
        assert!(err.is_json());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_bare_send_error_has_no_response() {
        let err = SendError::bare(HttpClientError::RouteNotFound("send".into()));
        assert!(err.response().is_none());
        assert_eq!(err.status(), 0);
        assert!(err.to_string().contains("send"));
    }
}
