//! # Courier Adapters
//!
//! Thin service clients built on [`courier_http_client::HttpSender`].
//! Each one takes the sender as `Arc<dyn HttpSender>`, so production code
//! passes an [`HttpClient`](courier_http_client::HttpClient) configured with
//! the service's base URI and tests pass a
//! [`MockClient`](courier_http_client::MockClient).
//!
//! - [`krp`]: Kafka REST proxy publisher and its in-memory mock
//! - [`jwt`]: JWT issuing service client
//! - [`mail`]: mail gateway client
//! - [`sms`]: SMS gateway client
//!
//! ```rust,no_run
//! use courier_adapters::sms::{Sms, SmsClient};
//! use courier_http_client::{HttpClient, Options};
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let http = HttpClient::new(Options::new().with_uri("http://sms-gateway:8080"));
//! let sms = SmsClient::new(Arc::new(http));
//! let delivered = sms.send("+15550100", "Your code is 1234").await;
//! # }
//! ```

pub mod jwt;
pub mod krp;
pub mod mail;
pub mod sms;

pub use jwt::JwtIssuer;
pub use krp::{Krp, KrpClient, KrpMessage, KrpMock};
pub use mail::{Mail, MailClient, MailMessage};
pub use sms::{Sms, SmsClient};
