//! The metric collector

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::CollectionOutcome;
use crate::catalog::{MetricDescription, MetricSource};
use crate::error::{NimbusError, NimbusResult};
use crate::provider::{MetricDataRequest, MonitoringApi, QueryTarget, RawSeries, TimeWindow};
use crate::telemetry::{
    ExporterTelemetry, LabelCodec, LabelIdentity, Registration, SeriesDescriptor, SeriesEntry,
    SeriesStore, StatReducer,
};
use crate::types::{Resource, Statistic};

/// Turns resource lists into series values for one metric at a time.
///
/// Failures stay local to a (metric, statistic) pair: the series is left as
/// it was and the rest of the metric is still collected. Deadlines belong to
/// the provider calls themselves; a query spanning many pages is only cut
/// short by cancellation.
pub struct MetricCollector {
    monitoring: Arc<dyn MonitoringApi>,
    store: Arc<SeriesStore>,
    telemetry: Option<ExporterTelemetry>,
}

impl MetricCollector {
    pub fn new(monitoring: Arc<dyn MonitoringApi>, store: Arc<SeriesStore>) -> Self {
        Self {
            monitoring,
            store,
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, telemetry: ExporterTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn store(&self) -> &Arc<SeriesStore> {
        &self.store
    }

    /// Register the series of every parseable statistic up front
    pub fn register(&self, description: &MetricDescription) {
        for name in &description.statistics {
            if let Ok(statistic) = name.parse::<Statistic>() {
                self.store.register_if_absent(SeriesDescriptor::new(
                    description.series_name(statistic),
                    statistic.series_kind(),
                    description.help.clone(),
                ));
            }
        }
    }

    /// Collect every statistic of one metric for one region's resources
    pub async fn collect(
        &self,
        description: &MetricDescription,
        region: &str,
        resources: &[Resource],
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> CollectionOutcome {
        let mut outcome = CollectionOutcome::new(&description.namespace, &description.metric_name);

        for name in &description.statistics {
            if cancel.is_cancelled() {
                outcome.failures.push(NimbusError::Cancelled);
                break;
            }

            let statistic = match name.parse::<Statistic>() {
                Ok(statistic) => statistic,
                Err(e) => {
                    warn!(
                        namespace = %description.namespace,
                        metric = %description.metric_name,
                        statistic = %name,
                        "skipping unsupported statistic"
                    );
                    self.record_error(&e);
                    outcome.failures.push(e);
                    continue;
                }
            };

            match self
                .collect_statistic(description, statistic, region, resources, now, cancel)
                .await
            {
                Ok((written, skipped)) => {
                    outcome.statistics_updated += 1;
                    outcome.entries_written += written;
                    outcome.rows_skipped += skipped;
                }
                Err(e) => {
                    if !matches!(e, NimbusError::Cancelled) {
                        warn!(
                            region = %region,
                            namespace = %description.namespace,
                            metric = %description.metric_name,
                            statistic = %statistic,
                            error = %e,
                            "metric query failed, keeping previous values"
                        );
                        self.record_error(&e);
                    }
                    outcome.failures.push(e);
                }
            }
        }

        outcome
    }

    async fn collect_statistic(
        &self,
        description: &MetricDescription,
        statistic: Statistic,
        region: &str,
        resources: &[Resource],
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> NimbusResult<(usize, usize)> {
        let series_name = description.series_name(statistic);
        let registration = self.store.register_if_absent(SeriesDescriptor::new(
            series_name.clone(),
            statistic.series_kind(),
            description.help.clone(),
        ));
        // another metric owns this name with the other kind; leave its values alone
        if let Registration::KindConflict { existing } = registration {
            return Err(NimbusError::config(format!(
                "series {series_name} is already a {existing}, cannot write {} values",
                statistic.series_kind()
            )));
        }

        let window = TimeWindow::aligned(now, description.range_seconds);
        let targets = build_targets(description, statistic, resources);

        let rows = if targets.is_empty() {
            Vec::new()
        } else {
            self.fetch(description, statistic, region, window, targets, cancel)
                .await?
        };

        let mut entries = Vec::with_capacity(rows.len());
        let mut skipped = 0;
        for row in rows {
            match self.reduce_row(description, statistic, row) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        namespace = %description.namespace,
                        metric = %description.metric_name,
                        error = %e,
                        "skipping result row"
                    );
                    self.record_error(&e);
                    skipped += 1;
                }
            }
        }

        let written = entries.len();
        debug!(
            region = %region,
            series = %series_name,
            entries = written,
            "updating series"
        );
        self.store.update_scoped(&series_name, region, entries)?;
        Ok((written, skipped))
    }

    /// Decode, dedup and reduce one row. `Ok(None)` means nothing new to report.
    fn reduce_row(
        &self,
        description: &MetricDescription,
        statistic: Statistic,
        row: RawSeries,
    ) -> NimbusResult<Option<SeriesEntry>> {
        let identity = LabelCodec::decode(&row.label)?;
        if identity.statistic != statistic.as_str() {
            return Err(NimbusError::malformed_label(
                row.label,
                format!("statistic {} does not match query", identity.statistic),
            ));
        }
        if row.timestamps.len() != row.values.len() {
            return Err(NimbusError::upstream(
                "monitoring",
                format!(
                    "{} timestamps for {} values",
                    row.timestamps.len(),
                    row.values.len()
                ),
            ));
        }

        let values = if statistic.is_cumulative() {
            description
                .dedup()
                .filter(&identity, &row.values, &row.timestamps)
        } else {
            row.values
        };
        if values.is_empty() {
            return Ok(None);
        }

        let value = StatReducer::reduce(statistic, &values)?;
        Ok(Some(SeriesEntry::new(value, identity.label_values())))
    }

    async fn fetch(
        &self,
        description: &MetricDescription,
        statistic: Statistic,
        region: &str,
        window: TimeWindow,
        targets: Vec<QueryTarget>,
        cancel: &CancellationToken,
    ) -> NimbusResult<Vec<RawSeries>> {
        let call = async {
            match &description.source {
                MetricSource::Native(query) => {
                    let request = MetricDataRequest {
                        namespace: query.namespace.clone(),
                        metric_name: query.metric_name.clone(),
                        statistic,
                        period_seconds: description.period_seconds,
                        window,
                        targets,
                    };
                    if let Some(telemetry) = &self.telemetry {
                        telemetry.record_queries(region, 1);
                    }
                    self.monitoring.get_metric_data(&request).await
                }
                MetricSource::Computed(computer) => {
                    computer.compute(&targets, statistic, &window).await
                }
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(NimbusError::Cancelled),
            rows = call => rows,
        }
    }

    fn record_error(&self, error: &NimbusError) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.record_error(error);
        }
    }
}

fn build_targets(
    description: &MetricDescription,
    statistic: Statistic,
    resources: &[Resource],
) -> Vec<QueryTarget> {
    resources
        .iter()
        .map(|resource| {
            let identity = LabelIdentity::for_resource(statistic.as_str(), resource);
            let mut dimensions = resource.dimensions.clone();
            dimensions.extend(description.dimensions.iter().cloned());
            QueryTarget {
                label: LabelCodec::encode(&identity),
                dimensions,
                resource: resource.clone(),
            }
        })
        .collect()
}
