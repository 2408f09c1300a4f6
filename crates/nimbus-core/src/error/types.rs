//! Core error type and context helpers

use thiserror::Error;

/// Result type alias for exporter operations
pub type NimbusResult<T> = Result<T, NimbusError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C: std::fmt::Display>(self, context: C) -> NimbusResult<T>;

    /// Add context lazily (only evaluated on error)
    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> NimbusResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn context<C: std::fmt::Display>(self, context: C) -> NimbusResult<T> {
        self.map_err(|e| NimbusError::other(format!("{}: {}", context, e)))
    }

    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> NimbusResult<T> {
        self.map_err(|e| NimbusError::other(format!("{}: {}", f(), e)))
    }
}

/// Main error type for the exporter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NimbusError {
    /// Invalid or missing configuration. Always fatal at startup.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// Network or API failure talking to the provider
    #[error("Upstream error ({service}): {message}")]
    Upstream { service: String, message: String },

    /// An encoded label identity could not be decoded
    #[error("Malformed label {label:?}: {reason}")]
    MalformedLabel { label: String, reason: String },

    /// Statistic name not in {Average, Sum, Minimum, Maximum, SampleCount}
    #[error("Unsupported statistic: {0}")]
    UnsupportedStatistic(String),

    /// A reducer that requires samples was handed none
    #[error("Cannot reduce {statistic} over an empty sample set")]
    EmptyInput { statistic: String },

    /// Outbound call exceeded its deadline
    #[error("Timed out after {seconds} seconds: {operation}")]
    Timeout { seconds: u64, operation: String },

    /// Work was abandoned because shutdown was requested
    #[error("Operation was cancelled")]
    Cancelled,

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// Scrape output could not be encoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Generic error with context
    #[error("Error: {message}")]
    Other { message: String },
}
