//! Startup validation. Every failure here is fatal.

use super::model::Config;
use crate::error::{NimbusError, NimbusResult};

pub fn validate(config: &Config, known_namespaces: &[&str]) -> NimbusResult<()> {
    if config.api_key.is_empty() || config.api_secret.is_empty() {
        return Err(NimbusError::config("Either api_key or api_secret is empty"));
    }
    if config.regions.is_empty() {
        return Err(NimbusError::config(
            "No regions specified, set at least one",
        ));
    }
    if config.regions.iter().any(|r| r.trim().is_empty()) {
        return Err(NimbusError::config("Empty region name"));
    }
    if config.poll_interval == 0 {
        return Err(NimbusError::config("poll_interval must be greater than zero"));
    }
    if config.period_seconds == 0 || config.range_seconds == 0 {
        return Err(NimbusError::config(
            "period_seconds and range_seconds must be greater than zero",
        ));
    }
    if config.listen.parse::<std::net::SocketAddr>().is_err() {
        return Err(NimbusError::config_with_context(
            format!("Invalid listen address '{}'", config.listen),
            "expected host:port",
        ));
    }

    let named = config
        .namespaces
        .iter()
        .flatten()
        .map(String::as_str)
        .chain(config.metrics.keys().map(String::as_str));
    for namespace in named {
        if !known_namespaces.contains(&namespace) {
            return Err(NimbusError::config_with_context(
                format!("Unknown namespace '{}'", namespace),
                format!("known namespaces: {}", known_namespaces.join(", ")),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamespaceOverride;

    const KNOWN: &[&str] = &["AWS/EC2", "AWS/RDS"];

    fn valid() -> Config {
        Config {
            api_key: "k".into(),
            api_secret: "s".into(),
            regions: vec!["eu-west-1".into()],
            ..Config::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        validate(&valid(), KNOWN).unwrap();
    }

    #[test]
    fn test_fatal_cases() {
        let cases = [
            Config { api_key: String::new(), ..valid() },
            Config { api_secret: String::new(), ..valid() },
            Config { regions: Vec::new(), ..valid() },
            Config { poll_interval: 0, ..valid() },
            Config { range_seconds: 0, ..valid() },
            Config { listen: "not an address".into(), ..valid() },
            Config { namespaces: Some(vec!["AWS/Lambda".into()]), ..valid() },
        ];
        for config in cases {
            let err = validate(&config, KNOWN).unwrap_err();
            assert!(err.is_fatal(), "{config:?}");
        }
    }

    #[test]
    fn test_unknown_override_namespace() {
        let mut config = valid();
        config
            .metrics
            .insert("AWS/Nope".into(), NamespaceOverride::default());
        let err = validate(&config, KNOWN).unwrap_err();
        assert!(err.to_string().contains("AWS/Nope"));
    }
}
