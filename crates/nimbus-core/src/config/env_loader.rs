//! Environment variable fallbacks

use std::env;

use super::model::Config;

pub const ENV_API_KEY: &str = "NIMBUS_API_KEY";
pub const ENV_API_SECRET: &str = "NIMBUS_API_SECRET";

/// Fill empty credentials from the process environment
pub fn apply_env_fallback(config: &mut Config) {
    apply_env_fallback_from(config, |key| env::var(key).ok());
}

/// Fill empty credentials using `lookup`. File values always win.
pub fn apply_env_fallback_from(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if config.api_key.is_empty() {
        if let Some(key) = lookup(ENV_API_KEY) {
            config.api_key = key;
        }
    }
    if config.api_secret.is_empty() {
        if let Some(secret) = lookup(ENV_API_SECRET) {
            config.api_secret = secret;
        }
    }
}
