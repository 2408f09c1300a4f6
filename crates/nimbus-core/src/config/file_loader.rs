//! File-based configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use super::env_loader::apply_env_fallback;
use super::model::Config;
use super::validation::validate;
use crate::error::{NimbusError, NimbusResult};

/// Load, apply environment fallbacks and validate.
///
/// `known_namespaces` are the namespaces a catalog exists for.
pub fn load_config(path: &str, known_namespaces: &[&str]) -> NimbusResult<Config> {
    let path = expand_path(path)?;
    let mut config = load_from_file(&path)?;
    apply_env_fallback(&mut config);
    validate(&config, known_namespaces)?;
    Ok(config)
}

fn expand_path(path: &str) -> NimbusResult<PathBuf> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| {
            NimbusError::config_with_context(
                format!("Failed to expand config path: {}", e),
                format!("Expanding '{}'", path),
            )
        })
}

/// Parse a configuration file.
///
/// The format follows the extension: `.toml`, `.json`, anything else is YAML.
/// A missing file is an error; the exporter cannot run on defaults alone.
pub fn load_from_file(path: &Path) -> NimbusResult<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        NimbusError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| {
            NimbusError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
        Some("json") => serde_json::from_str(&content).map_err(|e| {
            NimbusError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
        _ => serde_yaml::from_str(&content).map_err(|e| {
            NimbusError::config_with_context(
                format!("Failed to parse YAML config: {}", e),
                format!("Deserializing YAML configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(config)
}
