//! Exporter configuration
//!
//! Loading goes file -> environment fallback -> validation. Per-metric
//! settings are then resolved against the built-in catalogs.

mod env_loader;
mod file_loader;
mod logging;
mod model;
mod resolve;
mod validation;

pub use env_loader::{ENV_API_KEY, ENV_API_SECRET, apply_env_fallback, apply_env_fallback_from};
pub use file_loader::{load_config, load_from_file};
pub use logging::{LogFormat, log_level_directive};
pub use model::{Config, DEFAULT_LISTEN, DEFAULT_LOG_LEVEL, MetricOverride, NamespaceOverride};
pub use resolve::{resolve_namespace, resolve_plan};
pub use validation::validate;
