//! Log verbosity mapping

use serde::{Deserialize, Serialize};

/// Filter directive for a 0-5 verbosity level.
///
/// 0-2 only report errors, 3 adds warnings, 4 info, 5 debug. Anything
/// else falls back to warnings.
pub fn log_level_directive(level: u8) -> &'static str {
    match level {
        0..=2 => "error",
        3 => "warn",
        4 => "info",
        5 => "debug",
        _ => "warn",
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = crate::error::NimbusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(crate::error::NimbusError::config(format!(
                "Unknown log format '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(log_level_directive(0), "error");
        assert_eq!(log_level_directive(2), "error");
        assert_eq!(log_level_directive(3), "warn");
        assert_eq!(log_level_directive(4), "info");
        assert_eq!(log_level_directive(5), "debug");
        assert_eq!(log_level_directive(9), "warn");
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
