//! In-memory [`HttpSender`] for tests of code built on the client.

use async_trait::async_trait;
use bytes::Bytes;
use courier_log::{Logger, field};
use http::HeaderMap;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

use crate::client::HttpSender;
use crate::error::{SendError, SendResult};
use crate::options::Options;
use crate::status;
use crate::{HttpClientError, Response};

/// A canned reply for one URI.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body.
    pub body: Bytes,
    /// Error returned together with the response.
    pub error: Option<HttpClientError>,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            error: None,
        }
    }
}

impl MockResponse {
    /// A `200` reply with an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// A `200` reply whose body is `value` encoded as JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, HttpClientError> {
        let body = serde_json::to_vec(value).map_err(HttpClientError::encode)?;
        Ok(Self::new().with_body(body))
    }

    /// Set the status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Set the raw body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Fail the call with `error`.
    pub fn with_error(mut self, error: HttpClientError) -> Self {
        self.error = Some(error);
        self
    }
}

#[derive(Default)]
struct MockState {
    requests: Vec<Options>,
    responses: HashMap<String, MockResponse>,
}

/// Drop-in [`HttpSender`] answering from a table of canned replies.
///
/// Every call is recorded with its request object already encoded, so tests
/// can assert on what was sent. Calls are matched on the merged URI.
pub struct MockClient {
    logger: Arc<dyn Logger>,
    base: RwLock<Arc<Options>>,
    state: Mutex<MockState>,
}

impl MockClient {
    /// Create an empty mock.
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger,
            base: RwLock::new(Arc::new(Options::new())),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Replace the whole reply table.
    pub fn set_responses(&self, responses: HashMap<String, MockResponse>) {
        self.state.lock().responses = responses;
    }

    /// Register the reply for `uri`.
    pub fn set_response(&self, uri: impl Into<String>, response: MockResponse) {
        self.state.lock().responses.insert(uri.into(), response);
    }

    /// Every recorded request, oldest first.
    pub fn requests(&self) -> Vec<Options> {
        self.state.lock().requests.clone()
    }

    /// Every recorded request sent to `uri`, oldest first.
    pub fn requests_to(&self, uri: &str) -> Vec<Options> {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.uri == uri)
            .cloned()
            .collect()
    }

    /// The first recorded request sent to `uri`.
    pub fn request(&self, uri: &str) -> Option<Options> {
        self.state
            .lock()
            .requests
            .iter()
            .find(|r| r.uri == uri)
            .cloned()
    }

    /// The body of the first request sent to `uri`, decoded as `T`.
    ///
    /// Requests without a body yield `None`; a body that does not decode is
    /// logged and also yields `None`.
    pub fn request_json<T: DeserializeOwned>(&self, uri: &str) -> Option<T> {
        let body = self.request(uri)?.req_body.filter(|b| !b.is_empty())?;
        match serde_json::from_slice(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                self.logger
                    .error("Fail to unmarshal json", &e, &[field("uri", uri)]);
                None
            }
        }
    }

    /// Drop all recorded requests and canned replies.
    pub fn clean(&self) {
        let mut state = self.state.lock();
        state.requests.clear();
        state.responses.clear();
    }
}

impl std::fmt::Debug for MockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockClient")
            .field("requests", &state.requests.len())
            .field("responses", &state.responses.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HttpSender for MockClient {
    fn options(&self) -> Arc<Options> {
        self.base.read().clone()
    }

    fn set_options(&self, mut options: Options) {
        options.normalize_base_uri();
        *self.base.write() = Arc::new(options);
    }

    async fn send(&self, options: Options) -> SendResult {
        let mut options = self.options().merged_with(&options);

        if let Some(obj) = &options.req_obj {
            match obj.encode() {
                Ok(bytes) => options.req_body = Some(Bytes::from(bytes)),
                Err(e) => {
                    let err = HttpClientError::encode(e);
                    self.logger.error("Fail to marshal json", &err, &[]);
                    return Err(SendError::bare(err));
                }
            }
        }

        let canned = {
            let mut state = self.state.lock();
            state.requests.push(options.clone());
            state.responses.get(&options.uri).cloned()
        };

        let Some(canned) = canned else {
            self.logger.info(
                "Httpc-mock, path not found",
                &[field("path", &options.uri)],
            );
            return Err(SendError::bare(HttpClientError::RouteNotFound(options.uri)));
        };

        let response = Response::new(Arc::new(options), self.logger.clone())
            .with_status(canned.status)
            .with_headers(canned.headers)
            .with_body(canned.body);

        if let Some(err) = canned.error {
            return Err(SendError::new(err, response));
        }
        if let Err(err) = status::check_status(&response) {
            return Err(SendError::new(err, response));
        }
        if let Err(err) = status::decode_success(&response) {
            return Err(SendError::new(err, response));
        }

        Ok(response)
    }
}
