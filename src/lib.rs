// Courier - a configurable outbound HTTP client and the service adapters built on it
//
// This library re-exports the HTTP client, the logging seam, and (behind the
// `adapters` feature) the service adapters.

// Re-export the client
pub use courier_http_client::*;

// Re-export the logging seam
pub use courier_log as log;

// Re-export optional crates
#[cfg(feature = "adapters")]
pub use courier_adapters as adapters;

// Prelude for common imports
pub mod prelude {
    pub use courier_http_client::prelude::*;
    pub use courier_log::{Logger, MemoryLogger, TracingLogger};

    #[cfg(feature = "adapters")]
    pub use courier_adapters::{
        JwtIssuer, Krp, KrpClient, KrpMock, Mail, MailClient, MailMessage, Sms, SmsClient,
    };
}
