//! Configuration data model

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::poller::PollerSettings;
use crate::types::{Dimension, TagFilter, TagPair};

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
pub const DEFAULT_LOG_LEVEL: u8 = 3;
pub const DEFAULT_POLL_INTERVAL: u64 = 300;
pub const DEFAULT_PERIOD_SECONDS: u32 = 60;
pub const DEFAULT_RANGE_SECONDS: u32 = 300;
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 60;
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Top-level configuration file
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the scrape endpoint binds to
    pub listen: String,
    pub api_key: String,
    pub api_secret: String,
    /// Resources must carry every one of these tags
    pub tags: Vec<TagPair>,
    pub regions: Vec<String>,
    /// 0-5, higher is more verbose
    pub log_level: u8,
    /// Seconds between the end of one cycle and the start of the next
    pub poll_interval: u64,
    pub period_seconds: u32,
    pub range_seconds: u32,
    pub request_timeout_seconds: u64,
    pub max_concurrency: usize,
    /// Only poll these namespaces. `None` polls every known namespace.
    pub namespaces: Option<Vec<String>>,
    /// Per-namespace overrides
    pub metrics: BTreeMap<String, NamespaceOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            tags: Vec::new(),
            regions: Vec::new(),
            log_level: DEFAULT_LOG_LEVEL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            period_seconds: DEFAULT_PERIOD_SECONDS,
            range_seconds: DEFAULT_RANGE_SECONDS,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            namespaces: None,
            metrics: BTreeMap::new(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("listen", &self.listen)
            .field("api_key", &mask(&self.api_key))
            .field("api_secret", &mask(&self.api_secret))
            .field("tags", &self.tags)
            .field("regions", &self.regions)
            .field("log_level", &self.log_level)
            .field("poll_interval", &self.poll_interval)
            .field("period_seconds", &self.period_seconds)
            .field("range_seconds", &self.range_seconds)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("max_concurrency", &self.max_concurrency)
            .field("namespaces", &self.namespaces)
            .field("metrics", &self.metrics)
            .finish()
    }
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

impl Config {
    pub fn tag_filter(&self) -> TagFilter {
        TagFilter::new(self.tags.clone())
    }

    pub fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            poll_interval: Duration::from_secs(self.poll_interval),
            max_concurrency: self.max_concurrency.max(1),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }

    /// Whether the allow-list (if any) admits `namespace`
    pub fn polls(&self, namespace: &str) -> bool {
        self.namespaces
            .as_ref()
            .is_none_or(|allowed| allowed.iter().any(|n| n == namespace))
    }
}

/// Overrides for one namespace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceOverride {
    pub period_seconds: Option<u32>,
    pub range_seconds: Option<u32>,
    pub metrics: BTreeMap<String, MetricOverride>,
}

/// Overrides for one metric. Unset fields fall through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricOverride {
    pub output_name: Option<String>,
    pub help: Option<String>,
    pub statistics: Option<Vec<String>>,
    pub dimensions: Option<Vec<Dimension>>,
    pub period_seconds: Option<u32>,
    pub range_seconds: Option<u32>,
}
