//! The region poller

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::types::{CycleReport, NamespacePlan, PollerSettings};
use crate::collector::{CollectionOutcome, MetricCollector};
use crate::error::{NimbusError, NimbusResult};
use crate::telemetry::ExporterTelemetry;
use crate::types::{Resource, TagFilter};

/// Polls every configured namespace of one region until cancelled
pub struct RegionPoller {
    region: String,
    plans: Vec<NamespacePlan>,
    filter: TagFilter,
    collector: Arc<MetricCollector>,
    settings: PollerSettings,
    telemetry: Option<ExporterTelemetry>,
    /// Latest successful discovery per namespace, swapped whole
    resources: DashMap<&'static str, Arc<Vec<Resource>>>,
    semaphore: Arc<Semaphore>,
}

impl RegionPoller {
    pub fn new(
        region: impl Into<String>,
        plans: Vec<NamespacePlan>,
        filter: TagFilter,
        collector: Arc<MetricCollector>,
        settings: PollerSettings,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(settings.max_concurrency.max(1)));
        for plan in &plans {
            for metric in &plan.metrics {
                collector.register(metric);
            }
        }
        Self {
            region: region.into(),
            plans,
            filter,
            collector,
            settings,
            telemetry: None,
            resources: DashMap::new(),
            semaphore,
        }
    }

    pub fn with_telemetry(mut self, telemetry: ExporterTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Resources currently used for a namespace
    pub fn resources(&self, namespace: &str) -> Option<Arc<Vec<Resource>>> {
        self.resources.get(namespace).map(|r| Arc::clone(r.value()))
    }

    /// Run cycles until `cancel` fires
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(region = %self.region, namespaces = self.plans.len(), "starting poller");
        loop {
            let report = self.run_cycle(&cancel).await;
            if report.cancelled {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }
        info!(region = %self.region, "poller stopped");
    }

    /// One discovery barrier followed by one collection fan-out
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::new(&self.region);

        let ready = self.discover(&mut report).await;
        if cancel.is_cancelled() {
            report.cancelled = true;
            return report;
        }

        self.collect(&ready, cancel, &mut report).await;
        report.duration = started.elapsed();

        if let Some(telemetry) = &self.telemetry {
            telemetry.record_cycle(&self.region, report.duration);
        }
        info!(
            region = %self.region,
            metrics = report.metrics_attempted,
            failed = report.metrics_failed,
            entries = report.entries_written,
            skipped_namespaces = report.discovery_failures.len(),
            elapsed_ms = report.duration.as_millis() as u64,
            "poll cycle finished"
        );
        report
    }

    /// Discover all namespaces concurrently and swap in the successful lists.
    ///
    /// Returns the namespaces that may be collected this cycle.
    async fn discover(&self, report: &mut CycleReport) -> Vec<&NamespacePlan> {
        // listing plus per-resource lookups can take many calls; each call
        // carries its own deadline
        let tasks = self.plans.iter().map(|plan| async move {
            (plan, plan.discoverer.discover(&self.filter).await)
        });

        let mut ready = Vec::with_capacity(self.plans.len());
        for (plan, result) in join_all(tasks).await {
            let namespace = plan.namespace();
            match result {
                Ok(resources) => {
                    debug!(
                        region = %self.region,
                        namespace = namespace,
                        count = resources.len(),
                        "discovered resources"
                    );
                    report.resources.insert(namespace.to_string(), resources.len());
                    if let Some(telemetry) = &self.telemetry {
                        telemetry.set_resources(&self.region, namespace, resources.len());
                    }
                    self.resources.insert(namespace, Arc::new(resources));
                    ready.push(plan);
                }
                Err(e) => {
                    warn!(
                        region = %self.region,
                        namespace = namespace,
                        error = %e,
                        "discovery failed, skipping namespace this cycle"
                    );
                    if let Some(telemetry) = &self.telemetry {
                        telemetry.record_error(&e);
                    }
                    report.discovery_failures.push(namespace.to_string());
                }
            }
        }
        ready
    }

    async fn collect(
        &self,
        ready: &[&NamespacePlan],
        cancel: &CancellationToken,
        report: &mut CycleReport,
    ) {
        let now = Utc::now();
        let mut tasks: JoinSet<NimbusResult<CollectionOutcome>> = JoinSet::new();

        for plan in ready {
            let Some(resources) = self.resources(plan.namespace()) else {
                continue;
            };
            for metric in &plan.metrics {
                let collector = Arc::clone(&self.collector);
                let metric = Arc::clone(metric);
                let resources = Arc::clone(&resources);
                let semaphore = Arc::clone(&self.semaphore);
                let region = self.region.clone();
                let cancel = cancel.clone();

                tasks.spawn(async move {
                    let _permit = tokio::select! {
                        _ = cancel.cancelled() => return Err(NimbusError::Cancelled),
                        permit = semaphore.acquire_owned() => permit
                            .map_err(|_| NimbusError::other("collection semaphore closed"))?,
                    };
                    Ok(collector
                        .collect(&metric, &region, &resources, now, &cancel)
                        .await)
                });
                report.metrics_attempted += 1;
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(outcome)) => {
                    report.entries_written += outcome.entries_written;
                    if outcome.was_cancelled() {
                        report.cancelled = true;
                    }
                    if !outcome.is_success() {
                        report.metrics_failed += 1;
                    }
                }
                Ok(Err(NimbusError::Cancelled)) => {
                    report.cancelled = true;
                    report.metrics_failed += 1;
                }
                Ok(Err(e)) => {
                    error!(region = %self.region, error = %e, "collection task failed");
                    report.metrics_failed += 1;
                }
                Err(e) => {
                    error!(region = %self.region, error = %e, "collection task panicked");
                    report.metrics_failed += 1;
                }
            }
        }
    }
}
