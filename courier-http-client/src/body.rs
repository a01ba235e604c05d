//! Request body sources and response decode targets.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed error carried by body streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A boxed stream of response body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// A boxed stream of request body chunks.
pub type RequestByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send + Sync>>;

// ============================================================================
// Request side
// ============================================================================

/// A streaming request body.
///
/// Cloning shares the same underlying stream; the first attempt that sends
/// it takes it, so a stream body is sent at most once.
#[derive(Clone)]
pub struct RequestStream {
    inner: Arc<Mutex<Option<RequestByteStream>>>,
}

impl RequestStream {
    /// Wrap a stream of chunks.
    pub fn new<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let stream: RequestByteStream = Box::pin(stream.map(|chunk| chunk.map_err(Into::into)));
        Self {
            inner: Arc::new(Mutex::new(Some(stream))),
        }
    }

    /// A single-chunk stream.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let chunk: Result<Bytes, BoxError> = Ok(bytes.into());
        Self::new(futures::stream::iter([chunk]))
    }

    /// Check if the stream was already handed to a transport.
    pub fn is_consumed(&self) -> bool {
        self.inner.lock().is_none()
    }

    pub(crate) fn take(&self) -> Option<RequestByteStream> {
        self.inner.lock().take()
    }
}

impl fmt::Debug for RequestStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestStream")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// Values that can be JSON-encoded as a request body.
pub trait EncodeJson: Send + Sync {
    /// Serialize to JSON bytes.
    fn encode_json(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T> EncodeJson for T
where
    T: Serialize + Send + Sync,
{
    fn encode_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// A request object, encoded to JSON when the call is sent.
#[derive(Clone)]
pub struct RequestObject(Arc<dyn EncodeJson>);

impl RequestObject {
    /// Wrap any serializable value.
    pub fn new<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self(Arc::new(value))
    }

    /// Encode the object.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        self.0.encode_json()
    }
}

impl fmt::Debug for RequestObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestObject(..)")
    }
}

// ============================================================================
// Response side
// ============================================================================

/// Destination for a JSON response body.
pub trait DecodeTarget: Send + Sync {
    /// Decode `body` into the target.
    fn decode(&self, body: &[u8]) -> serde_json::Result<()>;
}

/// A shareable slot that a JSON body is decoded into.
///
/// The caller keeps one handle and passes a clone in the options; after
/// the call the decoded value is read from the kept handle.
///
/// ```
/// use courier_http_client::{DecodeTarget, JsonSlot};
///
/// let slot: JsonSlot<Vec<u32>> = JsonSlot::new();
/// slot.decode(b"[1, 2, 3]").unwrap();
/// assert_eq!(slot.take(), Some(vec![1, 2, 3]));
/// ```
pub struct JsonSlot<T> {
    value: Arc<Mutex<Option<T>>>,
}

impl<T> JsonSlot<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self {
            value: Arc::new(Mutex::new(None)),
        }
    }

    /// Take the decoded value, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        self.value.lock().take()
    }

    /// Check if a value was decoded.
    pub fn is_filled(&self) -> bool {
        self.value.lock().is_some()
    }
}

impl<T: Clone> JsonSlot<T> {
    /// Copy of the decoded value.
    pub fn get(&self) -> Option<T> {
        self.value.lock().clone()
    }
}

impl<T> Clone for JsonSlot<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
        }
    }
}

impl<T> Default for JsonSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSlot")
            .field("filled", &self.is_filled())
            .finish()
    }
}

impl<T> DecodeTarget for JsonSlot<T>
where
    T: DeserializeOwned + Send,
{
    fn decode(&self, body: &[u8]) -> serde_json::Result<()> {
        let value = serde_json::from_slice(body)?;
        *self.value.lock() = Some(value);
        Ok(())
    }
}

/// Handle to a [`DecodeTarget`] stored in options.
#[derive(Clone)]
pub struct ResponseTarget(Arc<dyn DecodeTarget>);

impl ResponseTarget {
    /// Wrap any decode target.
    pub fn new(target: impl DecodeTarget + 'static) -> Self {
        Self(Arc::new(target))
    }

    /// Decode `body` into the target.
    pub fn decode(&self, body: &[u8]) -> serde_json::Result<()> {
        self.0.decode(body)
    }
}

impl<T> From<&JsonSlot<T>> for ResponseTarget
where
    T: DeserializeOwned + Send + 'static,
{
    fn from(slot: &JsonSlot<T>) -> Self {
        Self::new(slot.clone())
    }
}

impl fmt::Debug for ResponseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseTarget(..)")
    }
}

/// Drain a body stream into one buffer.
pub(crate) async fn collect(mut stream: ByteStream) -> Result<Bytes, BoxError> {
    let mut buf = bytes::BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use std::collections::HashMap;

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cannot encode"))
        }
    }

    #[tokio::test]
    async fn test_request_stream_is_taken_once() {
        let stream = RequestStream::from_bytes("payload");
        let shared = stream.clone();

        let taken = shared.take().expect("stream present");
        assert!(stream.is_consumed());
        assert!(stream.take().is_none());

        let body = collect(taken).await.unwrap();
        assert_eq!(&body[..], b"payload");
    }

    #[test]
    fn test_request_object_encodes() {
        let obj = RequestObject::new(HashMap::from([("hello", "world")]));
        assert_eq!(obj.encode().unwrap(), br#"{"hello":"world"}"#.to_vec());
    }

    #[test]
    fn test_request_object_encode_failure() {
        let obj = RequestObject::new(Unencodable);
        assert!(obj.encode().is_err());
    }

    #[test]
    fn test_slot_decode_and_target() {
        let slot: JsonSlot<HashMap<String, String>> = JsonSlot::new();
        let target = ResponseTarget::from(&slot);

        target.decode(br#"{"error":"code"}"#).unwrap();
        assert_eq!(slot.get().unwrap()["error"], "code");
        assert!(slot.is_filled());
    }

    #[test]
    fn test_slot_decode_failure_leaves_slot_empty() {
        let slot: JsonSlot<u32> = JsonSlot::new();
        assert!(slot.decode(b"not json").is_err());
        assert!(!slot.is_filled());
    }
}
