//! Metrics about the exporter itself

use std::time::Duration;

use prometheus::{
    Gauge, GaugeVec, Histogram, HistogramOpts, IntCounterVec, IntGaugeVec, Opts, Registry,
};

use crate::error::{NimbusError, NimbusResult};

/// Registry of exporter health series, appended to every scrape
#[derive(Clone)]
pub struct ExporterTelemetry {
    registry: Registry,
    collection_errors: IntCounterVec,
    upstream_queries: IntCounterVec,
    resources: IntGaugeVec,
    cycle_duration: GaugeVec,
    scrape_duration: Histogram,
    last_scrape: Gauge,
}

impl std::fmt::Debug for ExporterTelemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterTelemetry").finish_non_exhaustive()
    }
}

impl ExporterTelemetry {
    pub fn new() -> NimbusResult<Self> {
        let registry = Registry::new();

        let collection_errors = IntCounterVec::new(
            Opts::new(
                "nimbus_collection_errors_total",
                "Failures while discovering resources or collecting metrics",
            ),
            &["kind"],
        )?;
        let upstream_queries = IntCounterVec::new(
            Opts::new(
                "nimbus_upstream_queries_total",
                "Monitoring API queries issued",
            ),
            &["region"],
        )?;
        let resources = IntGaugeVec::new(
            Opts::new(
                "nimbus_resources",
                "Resources found by the latest discovery",
            ),
            &["region", "namespace"],
        )?;
        let cycle_duration = GaugeVec::new(
            Opts::new(
                "nimbus_cycle_duration_seconds",
                "Wall time of the latest poll cycle",
            ),
            &["region"],
        )?;
        let scrape_duration = Histogram::with_opts(HistogramOpts::new(
            "nimbus_scrape_duration_seconds",
            "Time spent rendering a scrape",
        ))?;
        let last_scrape = Gauge::with_opts(Opts::new(
            "nimbus_last_scrape_series",
            "Series families rendered by the latest scrape",
        ))?;

        registry.register(Box::new(collection_errors.clone()))?;
        registry.register(Box::new(upstream_queries.clone()))?;
        registry.register(Box::new(resources.clone()))?;
        registry.register(Box::new(cycle_duration.clone()))?;
        registry.register(Box::new(scrape_duration.clone()))?;
        registry.register(Box::new(last_scrape.clone()))?;

        Ok(Self {
            registry,
            collection_errors,
            upstream_queries,
            resources,
            cycle_duration,
            scrape_duration,
            last_scrape,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_error(&self, error: &NimbusError) {
        self.collection_errors
            .with_label_values(&[error.kind()])
            .inc();
    }

    pub fn record_queries(&self, region: &str, count: u64) {
        self.upstream_queries
            .with_label_values(&[region])
            .inc_by(count);
    }

    pub fn set_resources(&self, region: &str, namespace: &str, count: usize) {
        self.resources
            .with_label_values(&[region, namespace])
            .set(count as i64);
    }

    pub fn record_cycle(&self, region: &str, elapsed: Duration) {
        self.cycle_duration
            .with_label_values(&[region])
            .set(elapsed.as_secs_f64());
    }

    pub fn record_scrape(&self, elapsed: Duration, families: usize) {
        self.scrape_duration.observe(elapsed.as_secs_f64());
        self.last_scrape.set(families as f64);
    }

    pub fn errors_of_kind(&self, kind: &str) -> u64 {
        self.collection_errors.with_label_values(&[kind]).get()
    }

    pub fn queries_for(&self, region: &str) -> u64 {
        self.upstream_queries.with_label_values(&[region]).get()
    }

    pub fn resources_for(&self, region: &str, namespace: &str) -> i64 {
        self.resources.with_label_values(&[region, namespace]).get()
    }
}
