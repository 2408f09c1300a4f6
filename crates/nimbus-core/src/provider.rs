//! Seams to the cloud provider
//!
//! The core pipeline never talks to an SDK directly. Resource listing, the
//! monitoring API and locally computed metrics all come in through the traits
//! below, so provider crates (and tests) plug in their own implementations.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::error::NimbusResult;
use crate::types::{Dimension, Resource, Statistic, TagFilter};

/// Queries end on a multiple of this many seconds
pub const QUERY_GRID_SECONDS: i64 = 300;

/// Half-open query window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window ending at `now` floored to the query grid, spanning `range_seconds`.
    ///
    /// Two polls inside the same grid cell produce the same window.
    pub fn aligned(now: DateTime<Utc>, range_seconds: u32) -> Self {
        let secs = now.timestamp();
        let floored = secs - secs.rem_euclid(QUERY_GRID_SECONDS);
        let end = DateTime::<Utc>::from_timestamp(floored, 0).unwrap_or(now);
        Self {
            start: end - TimeDelta::seconds(i64::from(range_seconds)),
            end,
        }
    }
}

/// One resource to include in a batched query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTarget {
    /// Encoded label identity, echoed back on every result row
    pub label: String,
    /// Resource dimensions followed by the metric's own fixed dimensions
    pub dimensions: Vec<Dimension>,
    pub resource: Resource,
}

/// A batched request for one metric and statistic across many resources
#[derive(Debug, Clone)]
pub struct MetricDataRequest {
    pub namespace: String,
    pub metric_name: String,
    pub statistic: Statistic,
    pub period_seconds: u32,
    pub window: TimeWindow,
    pub targets: Vec<QueryTarget>,
}

/// One result row: samples for a single label, newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    pub label: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

impl RawSeries {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, timestamp: DateTime<Utc>, value: f64) {
        self.timestamps.push(timestamp);
        self.values.push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The provider's monitoring API
#[async_trait]
pub trait MonitoringApi: Send + Sync {
    async fn get_metric_data(&self, request: &MetricDataRequest) -> NimbusResult<Vec<RawSeries>>;
}

/// Source of samples the monitoring API does not publish
#[async_trait]
pub trait MetricComputer: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Produce rows shaped exactly like [`MonitoringApi::get_metric_data`] output
    async fn compute(
        &self,
        targets: &[QueryTarget],
        statistic: Statistic,
        window: &TimeWindow,
    ) -> NimbusResult<Vec<RawSeries>>;
}

impl fmt::Debug for dyn MetricComputer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetricComputer({})", self.name())
    }
}

/// Lists the resources of one namespace in one region
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceDiscoverer: Send + Sync {
    fn namespace(&self) -> &'static str;

    async fn discover(&self, filter: &TagFilter) -> NimbusResult<Vec<Resource>>;
}
