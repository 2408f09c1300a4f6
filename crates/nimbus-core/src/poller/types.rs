//! Poller configuration and reports

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::catalog::MetricDescription;
use crate::provider::ResourceDiscoverer;

/// Everything the poller needs to know about one namespace
#[derive(Clone)]
pub struct NamespacePlan {
    pub discoverer: Arc<dyn ResourceDiscoverer>,
    pub metrics: Vec<Arc<MetricDescription>>,
}

impl NamespacePlan {
    pub fn new(discoverer: Arc<dyn ResourceDiscoverer>, metrics: Vec<Arc<MetricDescription>>) -> Self {
        Self {
            discoverer,
            metrics,
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.discoverer.namespace()
    }
}

impl std::fmt::Debug for NamespacePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespacePlan")
            .field("namespace", &self.namespace())
            .field("metrics", &self.metrics.len())
            .finish()
    }
}

/// Timing and concurrency knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    pub poll_interval: Duration,
    pub max_concurrency: usize,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(300),
            max_concurrency: 16,
        }
    }
}

/// Summary of one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    pub region: String,
    /// Resources per namespace after discovery
    pub resources: BTreeMap<String, usize>,
    /// Namespaces whose discovery failed and were skipped
    pub discovery_failures: Vec<String>,
    pub metrics_attempted: usize,
    pub metrics_failed: usize,
    pub entries_written: usize,
    pub duration: Duration,
    pub cancelled: bool,
}

impl CycleReport {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }
}
