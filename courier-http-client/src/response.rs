//! HTTP response model and its logging helpers.

use bytes::Bytes;
use courier_log::{Field, Logger, field};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

use crate::body::ByteStream;
use crate::flags::LogFlag;
use crate::options::Options;
use crate::{HttpClientError, Result};

/// Outcome of one call.
///
/// Status and raw body are kept on failures too. When stream passthrough
/// was requested and the call succeeded, the body is left unread in
/// [`Response::take_stream`] and the caller owns it.
pub struct Response {
    options: Arc<Options>,
    logger: Arc<dyn Logger>,
    status: u16,
    success: bool,
    headers: HeaderMap,
    body: Bytes,
    stream: Option<ByteStream>,
}

impl Response {
    /// Create an empty response for the given resolved options.
    pub fn new(options: Arc<Options>, logger: Arc<dyn Logger>) -> Self {
        Self {
            options,
            logger,
            status: 0,
            success: false,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            stream: None,
        }
    }

    /// Set the status code; success is recomputed.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self.success = (200..300).contains(&status);
        self
    }

    /// Set the response headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the raw body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub(crate) fn with_stream(mut self, stream: Option<ByteStream>) -> Self {
        self.stream = stream;
        self
    }

    /// Status code; `0` when no response was received.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Status code as [`StatusCode`], when one was received.
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status).ok()
    }

    /// Check if the status is in `[200, 300)`.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a specific header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Raw body; empty when the body was streamed to the caller.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the raw body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(HttpClientError::decode)
    }

    /// Resolved options the call was made with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Take the unread body stream.
    pub fn take_stream(&mut self) -> Option<ByteStream> {
        self.stream.take()
    }

    /// Check if an unread body stream is attached.
    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    // ------------------------------------------------------------------------
    // Logging
    // ------------------------------------------------------------------------

    /// Log a failure with full request/response context.
    ///
    /// With [`LogFlag::ErrorToInfo`] the line goes to the info level with
    /// the error appended as an `error` field.
    pub fn log_error(&self, title: &str, err: &HttpClientError, fields: &[Field]) {
        if self.options.has_log_flag(LogFlag::ErrorToInfo) {
            let mut fields = fields.to_vec();
            fields.push(field("error", err));
            self.log_info(title, &fields);
        } else {
            let message = format!("{}{}", self.options.log_prefix, title);
            self.logger.error(&message, err, &self.context(fields));
        }
    }

    /// Log an informational line with full request/response context.
    pub fn log_info(&self, title: &str, fields: &[Field]) {
        let message = format!("{}{}", self.options.log_prefix, title);
        self.logger.info(&message, &self.context(fields));
    }

    fn context(&self, fields: &[Field]) -> Vec<Field> {
        let opts = &self.options;
        let req_body = opts
            .req_body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default();

        let mut all = fields.to_vec();
        all.extend([
            field("method", opts.method()),
            field("uri", &opts.uri),
            field("params", opts.params.encode()),
            field("req_body", req_body),
            field("status_code", self.status),
            field("rep_body", String::from_utf8_lossy(&self.body)),
        ]);
        all
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("success", &self.success)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("stream", &self.stream.is_some())
            .finish()
    }
}
