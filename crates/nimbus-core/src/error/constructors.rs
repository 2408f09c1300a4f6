//! Constructor and classification methods for NimbusError

use super::types::NimbusError;

impl NimbusError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new upstream error for the given provider service
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a malformed-label error
    pub fn malformed_label(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedLabel {
            label: label.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported-statistic error
    pub fn unsupported_statistic(name: impl Into<String>) -> Self {
        Self::UnsupportedStatistic(name.into())
    }

    /// Create an empty-input error for a reducer
    pub fn empty_input(statistic: impl std::fmt::Display) -> Self {
        Self::EmptyInput {
            statistic: statistic.to_string(),
        }
    }

    /// Create a new timeout error
    pub fn timeout(seconds: u64, operation: impl Into<String>) -> Self {
        Self::Timeout {
            seconds,
            operation: operation.into(),
        }
    }

    /// Create a new IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
        }
    }

    /// Create an IO error for a specific path
    pub fn io_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Stable code for programmatic handling and log filtering
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "NIMBUS_CONFIG",
            Self::Upstream { .. } => "NIMBUS_UPSTREAM",
            Self::MalformedLabel { .. } => "NIMBUS_MALFORMED_LABEL",
            Self::UnsupportedStatistic(_) => "NIMBUS_UNSUPPORTED_STATISTIC",
            Self::EmptyInput { .. } => "NIMBUS_EMPTY_INPUT",
            Self::Timeout { .. } => "NIMBUS_TIMEOUT",
            Self::Cancelled => "NIMBUS_CANCELLED",
            Self::Io { .. } => "NIMBUS_IO",
            Self::Encoding(_) => "NIMBUS_ENCODING",
            Self::Other { .. } => "NIMBUS_OTHER",
        }
    }

    /// Short label used for the `kind` dimension of the error counter
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Upstream { .. } => "upstream",
            Self::MalformedLabel { .. } => "malformed_label",
            Self::UnsupportedStatistic(_) => "unsupported_statistic",
            Self::EmptyInput { .. } => "empty_input",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::Io { .. } => "io",
            Self::Encoding(_) => "encoding",
            Self::Other { .. } => "other",
        }
    }

    /// Whether the next poll cycle can reasonably be expected to succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Timeout { .. })
    }

    /// Whether the process must exit
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}
