//! Client for a JWT issuing service.

use courier_http_client::{HttpClientError, HttpSender, JsonSlot, Method, Options};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct CreateReply {
    #[serde(default)]
    token: String,
}

/// Issues tokens by posting claims to the service's `jwt` endpoint.
#[derive(Clone)]
pub struct JwtIssuer {
    http: Arc<dyn HttpSender>,
}

impl JwtIssuer {
    /// Create an issuer on top of a client whose base URI is the service.
    pub fn new(http: Arc<dyn HttpSender>) -> Self {
        Self { http }
    }

    /// Issue a token for `payload`.
    ///
    /// `sub` is added when non-empty and `exp_seconds` when non-zero; both
    /// override same-named payload entries.
    pub async fn create(
        &self,
        sub: &str,
        exp_seconds: i64,
        payload: Map<String, Value>,
    ) -> Result<String, HttpClientError> {
        let mut claims = payload;
        if !sub.is_empty() {
            claims.insert("sub".into(), Value::from(sub));
        }
        if exp_seconds != 0 {
            claims.insert("exp_seconds".into(), Value::from(exp_seconds));
        }

        let reply: JsonSlot<CreateReply> = JsonSlot::new();
        self.http
            .send(
                Options::new()
                    .with_method(Method::POST)
                    .with_uri("jwt")
                    .with_json(Value::Object(claims))
                    .decode_into(&reply),
            )
            .await?;

        Ok(reply.take().map(|r| r.token).unwrap_or_default())
    }
}
