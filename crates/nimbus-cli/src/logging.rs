//! Tracing subscriber bootstrap

use anyhow::anyhow;
use nimbus_core::config::{LogFormat, log_level_directive};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over the configured level when set
pub fn filter_for(level: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level_directive(level)))
}

pub fn init(level: u8, format: LogFormat) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_target(false);

    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow!("failed to initialise logging: {e}"))
}
