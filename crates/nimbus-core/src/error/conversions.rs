//! From trait implementations for NimbusError conversions

use super::types::NimbusError;

impl From<anyhow::Error> for NimbusError {
    fn from(error: anyhow::Error) -> Self {
        Self::other(error.to_string())
    }
}

impl From<std::io::Error> for NimbusError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for NimbusError {
    fn from(error: serde_json::Error) -> Self {
        Self::config(format!("JSON error: {}", error))
    }
}

impl From<serde_yaml::Error> for NimbusError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::config(format!("YAML error: {}", error))
    }
}

impl From<prometheus::Error> for NimbusError {
    fn from(error: prometheus::Error) -> Self {
        Self::encoding(error.to_string())
    }
}

impl From<std::string::FromUtf8Error> for NimbusError {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Self::encoding(error.to_string())
    }
}
