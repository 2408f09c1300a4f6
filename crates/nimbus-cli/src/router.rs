//! Command routing logic for CLI

use nimbus_aws::known_namespaces;
use nimbus_core::config::{DEFAULT_LOG_LEVEL, LogFormat, load_config};
use tracing::info;

use crate::args::{Cli, Commands};
use crate::{commands, logging};

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli) -> anyhow::Result<()> {
    let format = LogFormat::from(cli.log_format);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let mut config = load_config(&cli.config, &known_namespaces())?;
            if let Some(listen) = cli.listen {
                config.listen = listen;
            }
            logging::init(cli.log_level.unwrap_or(config.log_level), format)?;
            info!(config = %cli.config, regions = ?config.regions, "configuration loaded");
            commands::serve::serve(config).await
        }
        Commands::CheckConfig => {
            logging::init(cli.log_level.unwrap_or(DEFAULT_LOG_LEVEL), format)?;
            commands::check_config::check(&cli.config)
        }
        Commands::Catalog => commands::catalog::show(),
    }
}
