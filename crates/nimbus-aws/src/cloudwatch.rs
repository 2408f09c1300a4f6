//! CloudWatch `GetMetricData` client

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types::{Dimension, Metric, MetricDataQuery, MetricStat, ScanBy};
use chrono::{DateTime, Utc};
use nimbus_core::{MetricDataRequest, MonitoringApi, NimbusResult, QueryTarget, RawSeries, ResultExt};
use tracing::{debug, instrument, warn};

use crate::error_utils::{upstream, within};

/// Hard limit of queries in one `GetMetricData` call
pub const MAX_QUERIES_PER_REQUEST: usize = 500;

const SERVICE: &str = "cloudwatch";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// [`MonitoringApi`] backed by the CloudWatch SDK client
#[derive(Debug, Clone)]
pub struct CloudWatchClient {
    client: aws_sdk_cloudwatch::Client,
    request_timeout: Duration,
}

impl CloudWatchClient {
    pub fn new(client: aws_sdk_cloudwatch::Client) -> Self {
        Self {
            client,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Deadline for each `GetMetricData` page
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Run one batch of at most [`MAX_QUERIES_PER_REQUEST`] queries, following pages
    async fn fetch_batch(
        &self,
        request: &MetricDataRequest,
        queries: Vec<MetricDataQuery>,
        labels: &HashMap<String, String>,
        rows: &mut HashMap<String, RawSeries>,
    ) -> NimbusResult<()> {
        let mut next_token: Option<String> = None;
        loop {
            let call = self
                .client
                .get_metric_data()
                .set_metric_data_queries(Some(queries.clone()))
                .start_time(to_aws(request.window.start))
                .end_time(to_aws(request.window.end))
                .scan_by(ScanBy::TimestampDescending)
                .set_next_token(next_token.take())
                .send();
            let output = within(self.request_timeout, "GetMetricData", async {
                call.await.map_err(|e| upstream(SERVICE, e))
            })
            .await?;

            for result in output.metric_data_results() {
                let label = result
                    .id()
                    .and_then(|id| labels.get(id))
                    .map(String::as_str)
                    .or(result.label());
                let Some(label) = label else {
                    warn!(metric = %request.metric_name, "result row without id or label");
                    continue;
                };

                let row = rows
                    .entry(label.to_string())
                    .or_insert_with(|| RawSeries::new(label));
                for (ts, value) in result.timestamps().iter().zip(result.values()) {
                    if let Some(ts) = from_aws(ts) {
                        row.push(ts, *value);
                    }
                }
            }

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => return Ok(()),
            }
        }
    }
}

#[async_trait]
impl MonitoringApi for CloudWatchClient {
    #[instrument(skip_all, fields(namespace = %request.namespace, metric = %request.metric_name, statistic = %request.statistic))]
    async fn get_metric_data(&self, request: &MetricDataRequest) -> NimbusResult<Vec<RawSeries>> {
        let mut rows: HashMap<String, RawSeries> = HashMap::new();

        for (batch_index, batch) in request.targets.chunks(MAX_QUERIES_PER_REQUEST).enumerate() {
            let offset = batch_index * MAX_QUERIES_PER_REQUEST;
            let mut labels = HashMap::with_capacity(batch.len());
            let mut queries = Vec::with_capacity(batch.len());
            for (i, target) in batch.iter().enumerate() {
                let id = query_id(offset + i);
                queries.push(build_query(&id, request, target)?);
                labels.insert(id, target.label.clone());
            }

            debug!(queries = queries.len(), batch = batch_index, "get_metric_data");
            self.fetch_batch(request, queries, &labels, &mut rows).await?;
        }

        let mut rows: Vec<RawSeries> = rows.into_values().collect();
        // pages may interleave a label's samples; keep each row newest first
        for row in &mut rows {
            sort_newest_first(row);
        }
        Ok(rows)
    }
}

/// Query ids must start with a lower-case letter
fn query_id(index: usize) -> String {
    format!("q{index}")
}

fn build_query(id: &str, request: &MetricDataRequest, target: &QueryTarget) -> NimbusResult<MetricDataQuery> {
    let dimensions = target
        .dimensions
        .iter()
        .map(|d| {
            Dimension::builder()
                .name(&d.name)
                .value(&d.value)
                .build()
                .map_err(|e| upstream(SERVICE, e))
        })
        .collect::<NimbusResult<Vec<_>>>()?;

    let metric = Metric::builder()
        .namespace(&request.namespace)
        .metric_name(&request.metric_name)
        .set_dimensions(Some(dimensions))
        .build();

    let period = i32::try_from(request.period_seconds)
        .with_context(|| format!("period of {}", request.metric_name))?;

    let stat = MetricStat::builder()
        .metric(metric)
        .period(period)
        .stat(request.statistic.as_str())
        .build()
        .map_err(|e| upstream(SERVICE, e))?;

    MetricDataQuery::builder()
        .id(id)
        .label(&target.label)
        .metric_stat(stat)
        .return_data(true)
        .build()
        .map_err(|e| upstream(SERVICE, e))
}

fn sort_newest_first(row: &mut RawSeries) {
    let mut samples: Vec<(DateTime<Utc>, f64)> = row
        .timestamps
        .iter()
        .copied()
        .zip(row.values.iter().copied())
        .collect();
    samples.sort_by(|a, b| b.0.cmp(&a.0));
    row.timestamps = samples.iter().map(|(ts, _)| *ts).collect();
    row.values = samples.into_iter().map(|(_, v)| v).collect();
}

fn to_aws(ts: DateTime<Utc>) -> AwsDateTime {
    AwsDateTime::from_secs(ts.timestamp())
}

fn from_aws(ts: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts.secs(), ts.subsec_nanos())
}
