//! CLI argument definitions using clap
//!
//! - nimbus                      # Serve (default)
//! - nimbus check-config         # Validate config and print the metric plan
//! - nimbus catalog              # Print the built-in catalogs

use clap::{Parser, Subcommand, ValueEnum};
use nimbus_core::config::LogFormat;

/// Default configuration file name used across all CLI commands.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(name = "nimbus")]
#[command(about = "Exports CloudWatch metrics on a Prometheus scrape endpoint")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (yaml, toml or json)
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Address to serve /metrics on, overriding the config file
    #[arg(long, global = true)]
    pub listen: Option<String>,

    /// Log verbosity 0-5, overriding the config file
    #[arg(long, global = true, value_parser = clap::value_parser!(u8).range(0..=5))]
    pub log_level: Option<u8>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Poll every configured region and serve the results
    Serve,

    /// Load and validate the configuration, then print the resolved plan
    CheckConfig,

    /// List built-in namespaces with their series names and kinds
    Catalog,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["nimbus"]).unwrap();
        assert_eq!(cli.config, DEFAULT_CONFIG_FILE);
        assert!(cli.command.is_none());
        assert!(cli.listen.is_none());
        assert_eq!(LogFormat::from(cli.log_format), LogFormat::Pretty);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "nimbus",
            "check-config",
            "--config",
            "/etc/nimbus.toml",
            "--log-level",
            "5",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Commands::CheckConfig));
        assert_eq!(cli.config, "/etc/nimbus.toml");
        assert_eq!(cli.log_level, Some(5));
        assert_eq!(cli.log_format, LogFormatArg::Json);
    }

    #[test]
    fn test_log_level_out_of_range() {
        assert!(Cli::try_parse_from(["nimbus", "--log-level", "6"]).is_err());
    }
}
