//! Client configuration loading.

use courier_log::Logger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::client::HttpClient;
use crate::flags::{LogFlag, LogFlags};
use crate::options::{BasicAuth, Options};
use crate::transport::{ReqwestTransport, TransportConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] std::io::Error),

    /// The configuration text is not valid TOML for [`ClientConfig`].
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// A value could not be interpreted.
    #[error("Invalid value for {key}: {message}")]
    Invalid {
        /// Offending key.
        key: String,
        /// What was wrong with it.
        message: String,
    },

    /// A log flag name is not known.
    #[error("Unknown log flag: {0}")]
    UnknownLogFlag(String),

    /// The default transport could not be built.
    #[error("Failed to build transport: {0}")]
    Transport(String),
}

/// Client-level base options as plain data.
///
/// ```
/// use courier_http_client::ClientConfig;
///
/// let config = ClientConfig::from_toml_str(r#"
///     base_uri = "http://sms-gateway:8080"
///     retry_count = 2
///     retry_interval_ms = 100
///     log_flags = ["no_unauthorized"]
/// "#).unwrap();
///
/// let options = config.into_options().unwrap();
/// assert_eq!(options.retry_count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URI every call URI is appended to.
    pub base_uri: String,
    /// Headers sent with every call.
    pub headers: BTreeMap<String, String>,
    /// Basic-auth credentials sent with every call.
    pub basic_auth: Option<BasicAuth>,
    /// Log flag names, see [`LogFlag::name`].
    pub log_flags: Vec<String>,
    /// Prefix for every log message.
    pub log_prefix: String,
    /// Retries after the first attempt.
    pub retry_count: u32,
    /// Sleep between attempts, in milliseconds.
    pub retry_interval_ms: u64,
    /// Per-attempt deadline in milliseconds; `0` disables it.
    pub timeout_ms: u64,
}

impl ClientConfig {
    /// Parse from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from `<PREFIX>_*` environment variables, reading `.env` first
    /// when one exists.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    /// Load from `<PREFIX>_*` keys of an arbitrary lookup.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            let key = format!("{}_{}", prefix, name);
            lookup(&key).map(|value| (key, value))
        };
        let number = |name: &str| -> Result<Option<u64>, ConfigError> {
            get(name)
                .map(|(key, value)| {
                    value.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                        key,
                        message: e.to_string(),
                    })
                })
                .transpose()
        };

        let mut config = Self::default();

        if let Some((_, uri)) = get("BASE_URI") {
            config.base_uri = uri;
        }
        if let Some((_, prefix)) = get("LOG_PREFIX") {
            config.log_prefix = prefix;
        }
        if let Some((_, flags)) = get("LOG_FLAGS") {
            config.log_flags = flags
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(count) = number("RETRY_COUNT")? {
            config.retry_count = u32::try_from(count).map_err(|e| ConfigError::Invalid {
                key: format!("{}_RETRY_COUNT", prefix),
                message: e.to_string(),
            })?;
        }
        if let Some(ms) = number("RETRY_INTERVAL_MS")? {
            config.retry_interval_ms = ms;
        }
        if let Some(ms) = number("TIMEOUT_MS")? {
            config.timeout_ms = ms;
        }
        if let Some((_, username)) = get("BASIC_AUTH_USERNAME") {
            let password = get("BASIC_AUTH_PASSWORD")
                .map(|(_, p)| p)
                .unwrap_or_default();
            config.basic_auth = Some(BasicAuth::new(username, password));
        }

        Ok(config)
    }

    /// Parsed log flags.
    pub fn log_flags(&self) -> Result<LogFlags, ConfigError> {
        self.log_flags
            .iter()
            .map(|name| {
                LogFlag::from_name(name).ok_or_else(|| ConfigError::UnknownLogFlag(name.clone()))
            })
            .collect()
    }

    /// Convert into a base [`Options`] layer.
    pub fn into_options(self) -> Result<Options, ConfigError> {
        let mut options = Options::new()
            .with_uri(&self.base_uri)
            .with_log_prefix(&self.log_prefix);

        for (name, value) in &self.headers {
            let name = http::HeaderName::try_from(name.as_str()).map_err(|e| {
                ConfigError::Invalid {
                    key: format!("headers.{}", name),
                    message: e.to_string(),
                }
            })?;
            let value = http::HeaderValue::try_from(value.as_str()).map_err(|e| {
                ConfigError::Invalid {
                    key: format!("headers.{}", name),
                    message: e.to_string(),
                }
            })?;
            options.headers.append(name, value);
        }

        let flags = self.log_flags()?;
        if !flags.is_empty() {
            options = options.with_log_flags(flags);
        }
        if self.retry_count > 0 {
            options = options.with_retry_count(self.retry_count);
        }
        if self.retry_interval_ms > 0 {
            options = options.with_retry_interval(Duration::from_millis(self.retry_interval_ms));
        }
        if self.timeout_ms > 0 {
            options = options.with_timeout(Duration::from_millis(self.timeout_ms));
        }
        options.basic_auth = self.basic_auth;

        Ok(options)
    }

    /// Build a client with a `reqwest` transport and the given logger.
    pub fn build_client(
        self,
        transport: TransportConfig,
        logger: Arc<dyn Logger>,
    ) -> Result<HttpClient, ConfigError> {
        let transport =
            ReqwestTransport::new(transport).map_err(|e| ConfigError::Transport(e.to_string()))?;
        Ok(HttpClient::with_parts(
            self.into_options()?,
            Arc::new(transport),
            logger,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpSender;
    use courier_log::MemoryLogger;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let options = ClientConfig::default().into_options().unwrap();
        assert_eq!(options.uri, "");
        assert_eq!(options.retry_count(), 0);
        assert_eq!(options.timeout(), Duration::ZERO);
        assert!(options.log_flags().is_empty());
    }

    #[test]
    fn test_from_toml() {
        let config = ClientConfig::from_toml_str(
            r#"
            base_uri = "http://krp:8082"
            log_prefix = "krp: "
            log_flags = ["no_bad_status", "error_to_info"]
            retry_count = 3
            retry_interval_ms = 50
            timeout_ms = 2000

            [headers]
            X-Api-Key = "secret"

            [basic_auth]
            username = "admin"
            password = "pw"
            "#,
        )
        .unwrap();

        let options = config.into_options().unwrap();
        assert_eq!(options.uri, "http://krp:8082");
        assert_eq!(options.log_prefix, "krp: ");
        assert!(options.has_log_flag(LogFlag::NoBadStatus));
        assert!(options.has_log_flag(LogFlag::ErrorToInfo));
        assert_eq!(options.retry_count(), 3);
        assert_eq!(options.retry_interval(), Duration::from_millis(50));
        assert_eq!(options.timeout(), Duration::from_secs(2));
        assert_eq!(options.headers.get("x-api-key").unwrap(), "secret");
        assert_eq!(options.basic_auth, Some(BasicAuth::new("admin", "pw")));
    }

    #[test]
    fn test_invalid_toml() {
        let err = ClientConfig::from_toml_str("retry_count = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_lookup() {
        let config = ClientConfig::from_lookup(
            "SMS",
            lookup(&[
                ("SMS_BASE_URI", "http://sms/"),
                ("SMS_RETRY_COUNT", "2"),
                ("SMS_RETRY_INTERVAL_MS", "10"),
                ("SMS_TIMEOUT_MS", "500"),
                ("SMS_LOG_FLAGS", "request, response"),
                ("SMS_BASIC_AUTH_USERNAME", "user"),
                ("OTHER_RETRY_COUNT", "9"),
            ]),
        )
        .unwrap();

        assert_eq!(config.base_uri, "http://sms/");
        assert_eq!(config.retry_count, 2);
        assert_eq!(config.retry_interval_ms, 10);
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.log_flags, vec!["request", "response"]);
        assert_eq!(config.basic_auth, Some(BasicAuth::new("user", "")));
    }

    #[test]
    fn test_from_lookup_rejects_bad_number() {
        let err = ClientConfig::from_lookup("SMS", lookup(&[("SMS_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "SMS_TIMEOUT_MS"));
    }

    #[test]
    fn test_unknown_log_flag() {
        let config = ClientConfig {
            log_flags: vec!["verbose".into()],
            ..Default::default()
        };
        assert!(matches!(
            config.into_options(),
            Err(ConfigError::UnknownLogFlag(name)) if name == "verbose"
        ));
    }

    #[test]
    fn test_invalid_header() {
        let config = ClientConfig {
            headers: BTreeMap::from([("bad header".to_string(), "v".to_string())]),
            ..Default::default()
        };
        assert!(matches!(config.into_options(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_build_client_normalizes_base_uri() {
        let config = ClientConfig {
            base_uri: "http://jwt-service//".into(),
            ..Default::default()
        };
        let client = config
            .build_client(TransportConfig::default(), Arc::new(MemoryLogger::new()))
            .unwrap();
        assert_eq!(client.options().uri, "http://jwt-service/");
    }
}
