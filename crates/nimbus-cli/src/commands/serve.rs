//! Poll every region and serve the scrape endpoint

use std::sync::Arc;

use futures::future::join_all;
use nimbus_aws::{AwsSession, CloudWatchClient, build_plans, builtin_catalogs};
use nimbus_core::{
    Config, ExporterTelemetry, ExpositionAdapter, MetricCollector, RegionPoller, SeriesStore,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::http_server;
use crate::signal_handler::SignalHandler;

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let telemetry = ExporterTelemetry::new()?;
    let store = Arc::new(SeriesStore::new());
    let cancel = CancellationToken::new();

    let pollers = spawn_pollers(&config, &store, &telemetry, &cancel).await;
    info!(regions = pollers.len(), "pollers started");

    let signals = SignalHandler::start(cancel.clone())?;
    let adapter = ExpositionAdapter::new(Arc::clone(&store)).with_telemetry(telemetry);
    let served = http_server::serve(&config.listen, http_server::router(adapter), cancel.clone()).await;

    // a failed bind returns before any signal; stop the pollers either way
    cancel.cancel();
    for result in join_all(pollers).await {
        if let Err(e) = result {
            warn!(error = %e, "poller task ended abnormally");
        }
    }
    signals.stop().await;
    served
}

async fn spawn_pollers(
    config: &Config,
    store: &Arc<SeriesStore>,
    telemetry: &ExporterTelemetry,
    cancel: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    let catalogs = builtin_catalogs();
    let mut handles = Vec::with_capacity(config.regions.len());

    for region in &config.regions {
        let session =
            AwsSession::connect(region, &config.api_key, &config.api_secret, config.request_timeout()).await;
        let monitoring = Arc::new(
            CloudWatchClient::new(session.cloudwatch()).with_request_timeout(config.request_timeout()),
        );
        let collector = Arc::new(
            MetricCollector::new(monitoring, Arc::clone(store)).with_telemetry(telemetry.clone()),
        );

        let plans = build_plans(&session, &catalogs, config);
        if plans.is_empty() {
            warn!(region = %region, "no namespaces to poll");
            continue;
        }

        let poller = Arc::new(
            RegionPoller::new(
                region.clone(),
                plans,
                config.tag_filter(),
                collector,
                config.poller_settings(),
            )
            .with_telemetry(telemetry.clone()),
        );
        handles.push(tokio::spawn(poller.run(cancel.clone())));
    }
    handles
}
