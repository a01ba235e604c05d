//! Courier Logging
//!
//! The logging collaborator used by the Courier HTTP client and adapters.
//!
//! # Features
//!
//! - **Logger seam**: [`Logger`] takes a message plus an ordered list of
//!   key/value fields, at `info` or `error` severity
//! - **Tracing backend**: [`TracingLogger`] forwards every call to `tracing`
//! - **Recording backend**: [`MemoryLogger`] keeps every call in memory so
//!   tests can assert on what was logged
//! - **Environment-controlled setup**: [`init`] installs a `tracing`
//!   subscriber configured from `COURIER_*` variables
//!
//! # Usage
//!
//! ```rust
//! use courier_log::{field, Logger, TracingLogger};
//!
//! let logger = TracingLogger::new();
//! logger.info("Request: http://localhost/users", &[field("attempt", 1)]);
//! ```
//!
//! # Environment Variables
//!
//! - `COURIER_DEBUG=1` - Enable debug logging
//! - `COURIER_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `COURIER_LOG_FORMAT=pretty|json|compact` - Set output format
//! - `COURIER_LOG_COLOR=1|0` - Enable/disable colors

use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};
use std::env;
use std::error::Error as StdError;
use std::fmt;

// ============================================================================
// Log Levels
// ============================================================================

/// Log level for Courier logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warning level
    Warn,
    /// Error level (least verbose)
    Error,
    /// Off (no logging)
    Off,
}

impl Level {
    /// Get level from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "off" | "none" => Some(Level::Off),
            _ => None,
        }
    }

    /// Get level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Log Format
// ============================================================================

/// Output format for log messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Multi-line human readable format
    Pretty,
    /// Compact single-line format
    Compact,
    /// JSON format for structured logging
    Json,
}

impl Format {
    /// Get format from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

// ============================================================================
// Global Configuration
// ============================================================================

static CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::from_env);

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether debug mode is enabled
    pub debug: bool,
    /// Minimum log level
    pub level: Level,
    /// Output format
    pub format: Format,
    /// Whether colors are enabled
    pub color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: Level::Info,
            format: Format::Json,
            color: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| {
            lookup(key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        };

        let debug = flag("COURIER_DEBUG").unwrap_or(false);

        let level = lookup("COURIER_LOG_LEVEL")
            .and_then(|s| Level::from_str(&s))
            .unwrap_or(if debug { Level::Debug } else { Level::Info });

        let format = lookup("COURIER_LOG_FORMAT")
            .and_then(|s| Format::from_str(&s))
            .unwrap_or(Format::Json);

        let color = flag("COURIER_LOG_COLOR")
            .unwrap_or_else(|| lookup("NO_COLOR").is_none() && lookup("TERM").is_some());

        Self {
            debug,
            level,
            format,
            color,
        }
    }
}

/// Get the global configuration.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

/// Install a global `tracing` subscriber configured from the environment.
///
/// `RUST_LOG` takes precedence over `COURIER_LOG_LEVEL` when set. Calling
/// this more than once (or after another subscriber was installed) is a
/// no-op.
pub fn init() {
    init_with(config());
}

/// Install a global `tracing` subscriber for the given configuration.
pub fn init_with(config: &LogConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.directive()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.color)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        Format::Pretty => builder.pretty().try_init(),
        Format::Compact => builder.compact().try_init(),
        #[cfg(feature = "json")]
        Format::Json => builder.json().try_init(),
        #[cfg(not(feature = "json"))]
        Format::Json => builder.try_init(),
    };

    if installed.is_err() {
        tracing::debug!(target: "courier", "tracing subscriber already installed");
    }
}

// ============================================================================
// Fields
// ============================================================================

/// A single structured key/value pair attached to a log line.
pub type Field = (&'static str, String);

/// Build a [`Field`] from any displayable value.
pub fn field(key: &'static str, value: impl fmt::Display) -> Field {
    (key, value.to_string())
}

/// Renders fields as `key=value` pairs separated by spaces.
///
/// Values that are empty or contain whitespace are quoted.
pub struct FieldList<'a>(pub &'a [Field]);

impl fmt::Display for FieldList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if value.is_empty() || value.contains(char::is_whitespace) {
                write!(f, "{}={:?}", key, value)?;
            } else {
                write!(f, "{}={}", key, value)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Logger
// ============================================================================

/// Leveled, structured logger.
///
/// Implementations must be cheap to share; the HTTP client holds one behind
/// an `Arc` and calls it from whatever task issues the request.
pub trait Logger: Send + Sync {
    /// Log an informational message.
    fn info(&self, message: &str, fields: &[Field]);

    /// Log an error together with the failure that caused it.
    fn error(&self, message: &str, error: &(dyn StdError + 'static), fields: &[Field]);
}

/// Logger that forwards to `tracing` on the `courier` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    /// Create a new tracing logger.
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn info(&self, message: &str, fields: &[Field]) {
        tracing::info!(target: "courier", fields = %FieldList(fields), "{}", message);
    }

    fn error(&self, message: &str, error: &(dyn StdError + 'static), fields: &[Field]) {
        tracing::error!(
            target: "courier",
            error = %error,
            fields = %FieldList(fields),
            "{}",
            message
        );
    }
}

/// One call recorded by [`MemoryLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity of the call.
    pub level: Level,
    /// Message passed by the caller.
    pub message: String,
    /// Rendered error, for error-level calls.
    pub error: Option<String>,
    /// Fields in the order they were passed.
    pub fields: Vec<Field>,
}

impl LogRecord {
    /// Look up the first field with the given key.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Logger that keeps every call in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    /// Create an empty memory logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Number of records at the given level.
    pub fn count(&self, level: Level) -> usize {
        self.lock().iter().filter(|r| r.level == level).count()
    }

    /// Drop all records.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock()
    }

    fn push(&self, level: Level, message: &str, error: Option<String>, fields: &[Field]) {
        self.lock().push(LogRecord {
            level,
            message: message.to_string(),
            error,
            fields: fields.to_vec(),
        });
    }
}

impl Logger for MemoryLogger {
    fn info(&self, message: &str, fields: &[Field]) {
        self.push(Level::Info, message, None, fields);
    }

    fn error(&self, message: &str, error: &(dyn StdError + 'static), fields: &[Field]) {
        self.push(Level::Error, message, Some(error.to_string()), fields);
    }
}

// ============================================================================
// Tests
// ============================================================================
