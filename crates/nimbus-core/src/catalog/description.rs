//! Resolved, immutable metric definitions

use std::fmt;
use std::sync::Arc;

use crate::provider::MetricComputer;
use crate::telemetry::DedupFilter;
use crate::types::{Dimension, Statistic};

use super::naming::{default_output_name, sanitize_metric_name};

pub const DEFAULT_PERIOD_SECONDS: u32 = 60;
pub const DEFAULT_RANGE_SECONDS: u32 = 300;

/// Parameters for a metric served by the monitoring API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeQuery {
    pub namespace: String,
    pub metric_name: String,
}

/// Where a metric's samples come from
#[derive(Clone)]
pub enum MetricSource {
    Native(NativeQuery),
    Computed(Arc<dyn MetricComputer>),
}

impl MetricSource {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Native(_) => "native",
            Self::Computed(_) => "computed",
        }
    }
}

impl fmt::Debug for MetricSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(query) => f.debug_tuple("Native").field(query).finish(),
            Self::Computed(computer) => f.debug_tuple("Computed").field(&computer.name()).finish(),
        }
    }
}

/// One metric to poll, fixed at startup.
///
/// The only state that changes afterwards is the dedup cursor map.
#[derive(Debug)]
pub struct MetricDescription {
    pub namespace: String,
    pub metric_name: String,
    /// Sanitized base name, before the statistic suffix
    pub output_name: String,
    pub help: String,
    /// Kept as configured; parsed when a cycle runs
    pub statistics: Vec<String>,
    pub dimensions: Vec<Dimension>,
    pub period_seconds: u32,
    pub range_seconds: u32,
    pub source: MetricSource,
    dedup: DedupFilter,
}

impl MetricDescription {
    pub fn native(namespace: impl Into<String>, metric_name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let metric_name = metric_name.into();
        let source = MetricSource::Native(NativeQuery {
            namespace: namespace.clone(),
            metric_name: metric_name.clone(),
        });
        Self::with_source(namespace, metric_name, source)
    }

    pub fn computed(
        namespace: impl Into<String>,
        metric_name: impl Into<String>,
        computer: Arc<dyn MetricComputer>,
    ) -> Self {
        Self::with_source(namespace.into(), metric_name.into(), MetricSource::Computed(computer))
    }

    fn with_source(namespace: String, metric_name: String, source: MetricSource) -> Self {
        Self {
            output_name: default_output_name(&namespace, &metric_name),
            help: metric_name.clone(),
            namespace,
            metric_name,
            statistics: vec![Statistic::Average.to_string()],
            dimensions: Vec::new(),
            period_seconds: DEFAULT_PERIOD_SECONDS,
            range_seconds: DEFAULT_RANGE_SECONDS,
            source,
            dedup: DedupFilter::new(),
        }
    }

    pub fn with_output_name(mut self, name: impl AsRef<str>) -> Self {
        let sanitized = sanitize_metric_name(name.as_ref());
        if !sanitized.is_empty() {
            self.output_name = sanitized;
        }
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        let help = help.into();
        if !help.is_empty() {
            self.help = help;
        }
        self
    }

    pub fn with_statistics<I, S>(mut self, statistics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statistics = statistics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dimensions(mut self, dimensions: Vec<Dimension>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_period(mut self, seconds: u32) -> Self {
        self.period_seconds = seconds;
        self
    }

    pub fn with_range(mut self, seconds: u32) -> Self {
        self.range_seconds = seconds;
        self
    }

    /// Exported name for one statistic
    pub fn series_name(&self, statistic: Statistic) -> String {
        format!("{}{}", self.output_name, statistic.suffix())
    }

    pub fn dedup(&self) -> &DedupFilter {
        &self.dedup
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.source, MetricSource::Computed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_defaults() {
        let desc = MetricDescription::native("AWS/EC2", "CPUUtilization");
        assert_eq!(desc.output_name, "ec2_cpu_utilization");
        assert_eq!(desc.help, "CPUUtilization");
        assert_eq!(desc.statistics, vec!["Average"]);
        assert_eq!(desc.period_seconds, 60);
        assert_eq!(desc.range_seconds, 300);
        assert_eq!(desc.source.kind(), "native");
        assert!(desc.dedup().is_empty());
    }

    #[test]
    fn test_series_names() {
        let desc = MetricDescription::native("AWS/SQS", "NumberOfMessagesSent")
            .with_output_name("SQS messages-sent");
        assert_eq!(desc.series_name(Statistic::Average), "sqs_messages_sent");
        assert_eq!(desc.series_name(Statistic::Sum), "sqs_messages_sent_sum");
        assert_eq!(desc.series_name(Statistic::SampleCount), "sqs_messages_sent_count");
    }

    #[test]
    fn test_empty_overrides_are_ignored() {
        let desc = MetricDescription::native("AWS/RDS", "FreeStorageSpace")
            .with_output_name("")
            .with_help("");
        assert_eq!(desc.output_name, "rds_free_storage_space");
        assert_eq!(desc.help, "FreeStorageSpace");
    }
}
