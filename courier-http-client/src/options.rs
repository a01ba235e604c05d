//! Per-call options and the layered merge.

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use crate::body::{JsonSlot, RequestObject, RequestStream, ResponseTarget};
use crate::flags::{LogFlag, LogFlags};
use crate::transport::Transport;

pub(crate) const APPLICATION_JSON: &str = "application/json";

// ============================================================================
// Setting
// ============================================================================

/// A scalar that an override layer may leave alone, replace, or zero out.
///
/// `Set` with the zero value replaces nothing; only `Reset` forces zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting<T> {
    /// Take the value from the layer below.
    Inherit,
    /// Replace the value from the layer below.
    Set(T),
    /// Force the value to zero, even if the layer below set one.
    Reset,
}

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Setting::Inherit
    }
}

impl<T: Copy + Default + PartialEq> Setting<T> {
    /// Layer `self` on top of `base`.
    pub fn over(self, base: Setting<T>) -> Setting<T> {
        match self {
            Setting::Inherit => base,
            Setting::Set(v) if v == T::default() => base,
            other => other,
        }
    }

    /// The effective value; unset and reset both yield `T::default()`.
    pub fn value(self) -> T {
        match self {
            Setting::Set(v) => v,
            Setting::Inherit | Setting::Reset => T::default(),
        }
    }
}

// ============================================================================
// Basic auth
// ============================================================================

/// Basic-auth credential pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl BasicAuth {
    /// Create a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// `Authorization` header value for these credentials.
    pub fn header_value(&self) -> String {
        use base64::Engine;
        let credentials = format!("{}:{}", self.username, self.password);
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        format!("Basic {}", encoded)
    }
}

// ============================================================================
// Query parameters
// ============================================================================

/// Multi-valued query parameters, kept sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, Vec<String>>);

impl Params {
    /// Create empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all values of `key`.
    pub fn set<I, V>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.0
            .insert(key.into(), values.into_iter().map(Into::into).collect());
    }

    /// Append one value to `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    /// All values of `key`.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overwrite key slots with the ones in `other`.
    pub fn overlay(&mut self, other: &Params) {
        for (key, values) in &other.0 {
            self.0.insert(key.clone(), values.clone());
        }
    }

    /// URL-encode as `k=v&k=v2`, keys in sorted order.
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.0 {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.append(k, v);
        }
        params
    }
}

/// Overwrite header slots of `base` with every header named in `over`.
fn overlay_headers(base: &mut HeaderMap, over: &HeaderMap) {
    for name in over.keys() {
        base.remove(name);
        for value in over.get_all(name) {
            base.append(name.clone(), value.clone());
        }
    }
}

// ============================================================================
// Options
// ============================================================================

/// Configuration for one HTTP call.
///
/// The client keeps one `Options` as its base layer; every call passes an
/// override layer and the two are combined by [`Options::merged_with`].
/// Fields left at their default inherit from the base.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Transport to execute the call with.
    pub transport: Option<Arc<dyn Transport>>,
    /// Target URI; joined to the base URI on merge.
    pub uri: String,
    /// HTTP method; `GET` when unset after merge.
    pub method: Option<Method>,
    /// Query parameters.
    pub params: Params,
    /// Request headers.
    pub headers: HeaderMap,
    /// Basic-auth credentials.
    pub basic_auth: Option<BasicAuth>,
    /// Log behaviour.
    pub log_flags: Setting<LogFlags>,
    /// Prefix prepended to every log message; concatenated on merge.
    pub log_prefix: String,
    /// Number of retries after the first attempt.
    pub retry_count: Setting<u32>,
    /// Sleep between attempts.
    pub retry_interval: Setting<Duration>,
    /// Deadline for a single attempt.
    pub timeout: Setting<Duration>,
    /// Streaming request body; never retried.
    pub req_stream: Option<RequestStream>,
    /// Raw request body.
    pub req_body: Option<Bytes>,
    /// Request object, JSON-encoded into `req_body` on send.
    pub req_obj: Option<RequestObject>,
    /// Leave a successful response body unread for the caller.
    pub rep_stream: bool,
    /// Target for a successful JSON body.
    pub rep_obj: Option<ResponseTarget>,
    /// Targets for error bodies, by exact status code.
    pub status_rep_obj: Option<HashMap<u16, ResponseTarget>>,
}

impl Options {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the URI.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// Set the method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Append a query parameter value.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.append(key, value);
        self
    }

    /// Replace all query parameters.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Append a header value. Invalid names or values are ignored.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Set `Content-Type` and `Accept` to `application/json`.
    pub fn with_json_content(mut self) -> Self {
        let json = HeaderValue::from_static(APPLICATION_JSON);
        self.headers.insert(CONTENT_TYPE, json.clone());
        self.headers.insert(ACCEPT, json);
        self
    }

    /// Set basic-auth credentials.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.basic_auth = Some(BasicAuth::new(username, password));
        self
    }

    /// Set the log flags.
    pub fn with_log_flags(mut self, flags: impl Into<LogFlags>) -> Self {
        self.log_flags = Setting::Set(flags.into());
        self
    }

    /// Clear log flags inherited from the base.
    pub fn reset_log_flags(mut self) -> Self {
        self.log_flags = Setting::Reset;
        self
    }

    /// Set the log prefix.
    pub fn with_log_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_prefix = prefix.into();
        self
    }

    /// Set the retry count.
    pub fn with_retry_count(mut self, count: u32) -> Self {
        self.retry_count = Setting::Set(count);
        self
    }

    /// Disable retries inherited from the base.
    pub fn reset_retry_count(mut self) -> Self {
        self.retry_count = Setting::Reset;
        self
    }

    /// Set the sleep between attempts.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = Setting::Set(interval);
        self
    }

    /// Disable the retry interval inherited from the base.
    pub fn reset_retry_interval(mut self) -> Self {
        self.retry_interval = Setting::Reset;
        self
    }

    /// Set the per-attempt deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Setting::Set(timeout);
        self
    }

    /// Disable the timeout inherited from the base.
    pub fn reset_timeout(mut self) -> Self {
        self.timeout = Setting::Reset;
        self
    }

    /// Send a streaming body.
    pub fn with_stream(mut self, stream: RequestStream) -> Self {
        self.req_stream = Some(stream);
        self
    }

    /// Send raw bytes.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.req_body = Some(body.into());
        self
    }

    /// Send `value` encoded as JSON.
    pub fn with_json<T>(mut self, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.req_obj = Some(RequestObject::new(value));
        self
    }

    /// Leave a successful response body unread for the caller.
    pub fn with_response_stream(mut self) -> Self {
        self.rep_stream = true;
        self
    }

    /// Decode a successful JSON body into `slot`.
    pub fn decode_into<T>(mut self, slot: &JsonSlot<T>) -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.rep_obj = Some(ResponseTarget::from(slot));
        self
    }

    /// Decode the JSON body of a `status` response into `slot`.
    pub fn decode_status_into<T>(mut self, status: u16, slot: &JsonSlot<T>) -> Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.status_rep_obj
            .get_or_insert_with(HashMap::new)
            .insert(status, ResponseTarget::from(slot));
        self
    }

    // ------------------------------------------------------------------------
    // Resolved accessors
    // ------------------------------------------------------------------------

    /// Effective method.
    pub fn method(&self) -> Method {
        self.method.clone().unwrap_or(Method::GET)
    }

    /// Effective log flags.
    pub fn log_flags(&self) -> LogFlags {
        self.log_flags.value()
    }

    /// Check if a log flag is set.
    pub fn has_log_flag(&self, flag: LogFlag) -> bool {
        self.log_flags().contains(flag)
    }

    /// Effective retry count.
    pub fn retry_count(&self) -> u32 {
        self.retry_count.value()
    }

    /// Effective retry interval.
    pub fn retry_interval(&self) -> Duration {
        self.retry_interval.value()
    }

    /// Effective per-attempt timeout; zero means no deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout.value()
    }

    /// Decode target registered for `status`.
    pub fn status_target(&self, status: u16) -> Option<&ResponseTarget> {
        self.status_rep_obj.as_ref().and_then(|m| m.get(&status))
    }

    /// Normalize a base URI to end with exactly one `/`.
    pub(crate) fn normalize_base_uri(&mut self) {
        if !self.uri.is_empty() {
            self.uri = format!("{}/", self.uri.trim_end_matches('/'));
        }
    }

    // ------------------------------------------------------------------------
    // Merge
    // ------------------------------------------------------------------------

    /// Layer `over` on top of `self`.
    ///
    /// Scalars and body/decode fields present on `over` replace the base;
    /// headers and params are overwritten per key; URI and log prefix are
    /// concatenated. `rep_stream` stays on once either layer sets it.
    pub fn merged_with(&self, over: &Options) -> Options {
        let mut headers = self.headers.clone();
        overlay_headers(&mut headers, &over.headers);

        let mut params = self.params.clone();
        params.overlay(&over.params);

        let method = over
            .method
            .clone()
            .or_else(|| self.method.clone())
            .unwrap_or(Method::GET);

        Options {
            transport: over.transport.clone().or_else(|| self.transport.clone()),
            uri: format!("{}{}", self.uri, over.uri),
            method: Some(method),
            params,
            headers,
            basic_auth: over.basic_auth.clone().or_else(|| self.basic_auth.clone()),
            log_flags: over.log_flags.over(self.log_flags),
            log_prefix: format!("{}{}", self.log_prefix, over.log_prefix),
            retry_count: over.retry_count.over(self.retry_count),
            retry_interval: over.retry_interval.over(self.retry_interval),
            timeout: over.timeout.over(self.timeout),
            req_stream: over.req_stream.clone().or_else(|| self.req_stream.clone()),
            req_body: over.req_body.clone().or_else(|| self.req_body.clone()),
            req_obj: over.req_obj.clone().or_else(|| self.req_obj.clone()),
            rep_stream: self.rep_stream || over.rep_stream,
            rep_obj: over.rep_obj.clone().or_else(|| self.rep_obj.clone()),
            status_rep_obj: over
                .status_rep_obj
                .clone()
                .or_else(|| self.status_rep_obj.clone()),
        }
    }
}

/// Combine a base layer with a call-specific override layer.
pub fn merge(base: &Options, over: &Options) -> Options {
    base.merged_with(over)
}
