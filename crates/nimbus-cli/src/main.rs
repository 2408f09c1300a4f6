//! nimbus exporter
//!
//! Polls CloudWatch for every configured region and serves the results on a
//! Prometheus scrape endpoint.
//!
//! ```bash
//! nimbus --config config.yaml              # serve (default)
//! nimbus check-config --config config.yaml # validate and print the plan
//! nimbus catalog                           # list built-in metrics
//! ```

mod args;
mod commands;
mod http_server;
mod logging;
mod router;
mod signal_handler;

use clap::Parser;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    router::route(cli).await
}
