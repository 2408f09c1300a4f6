//! Static catalog rows

use std::sync::Arc;

use crate::provider::MetricComputer;

/// One built-in metric of a namespace.
///
/// Plain `'static` data so catalogs can live in `const` tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogMetric {
    pub name: &'static str,
    pub output_name: Option<&'static str>,
    pub help: &'static str,
    pub statistics: &'static [&'static str],
    /// Fixed dimensions appended to every resource's own
    pub dimensions: &'static [(&'static str, &'static str)],
    pub period_seconds: Option<u32>,
    pub range_seconds: Option<u32>,
}

impl CatalogMetric {
    pub const fn new(name: &'static str, output_name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            output_name: Some(output_name),
            help,
            statistics: &["Average"],
            dimensions: &[],
            period_seconds: None,
            range_seconds: None,
        }
    }

    pub const fn statistics(self, statistics: &'static [&'static str]) -> Self {
        Self { statistics, ..self }
    }

    pub const fn dimensions(self, dimensions: &'static [(&'static str, &'static str)]) -> Self {
        Self { dimensions, ..self }
    }

    pub const fn period(self, seconds: u32) -> Self {
        Self {
            period_seconds: Some(seconds),
            ..self
        }
    }

    pub const fn range(self, seconds: u32) -> Self {
        Self {
            range_seconds: Some(seconds),
            ..self
        }
    }
}

/// A catalog row whose samples are computed locally
#[derive(Clone)]
pub struct ComputedMetric {
    pub metric: CatalogMetric,
    pub computer: Arc<dyn MetricComputer>,
}

impl std::fmt::Debug for ComputedMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputedMetric")
            .field("metric", &self.metric.name)
            .field("computer", &self.computer.name())
            .finish()
    }
}

/// Built-in metrics of one namespace
#[derive(Debug, Clone)]
pub struct NamespaceCatalog {
    pub namespace: &'static str,
    /// Namespace-wide period, between user defaults and the global default
    pub period_seconds: Option<u32>,
    pub range_seconds: Option<u32>,
    pub metrics: &'static [CatalogMetric],
    pub computed: Vec<ComputedMetric>,
}

impl NamespaceCatalog {
    pub fn new(namespace: &'static str, metrics: &'static [CatalogMetric]) -> Self {
        Self {
            namespace,
            period_seconds: None,
            range_seconds: None,
            metrics,
            computed: Vec::new(),
        }
    }

    pub fn with_period(mut self, seconds: u32) -> Self {
        self.period_seconds = Some(seconds);
        self
    }

    pub fn with_range(mut self, seconds: u32) -> Self {
        self.range_seconds = Some(seconds);
        self
    }

    pub fn with_computed(mut self, metric: CatalogMetric, computer: Arc<dyn MetricComputer>) -> Self {
        self.computed.push(ComputedMetric { metric, computer });
        self
    }

    pub fn len(&self) -> usize {
        self.metrics.len() + self.computed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, name: &str) -> Option<&CatalogMetric> {
        self.metrics
            .iter()
            .chain(self.computed.iter().map(|c| &c.metric))
            .find(|m| m.name == name)
    }
}
