//! Multi-cycle scenarios through discovery, collection and exposition
//!
//! Provider calls are answered by in-memory fakes scripted per cycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use nimbus::aws::builtin_catalogs;
use nimbus::aws::namespaces::vpc;
use nimbus::config::resolve_plan;
use nimbus::{
    Config, ExpositionAdapter, MetricCollector, MetricDataRequest, MetricDescription,
    MonitoringApi, NamespacePlan, NimbusResult, PollerSettings, RawSeries, RegionPoller, Resource,
    ResourceDiscoverer, SeriesStore, Statistic, TagFilter, TagPair,
};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

const REGION: &str = "eu-west-1";

/// Returns the scripted list for the current cycle, repeating the last one
struct ScriptedDiscoverer {
    namespace: &'static str,
    cycles: Vec<Vec<Resource>>,
    calls: AtomicUsize,
}

impl ScriptedDiscoverer {
    fn new(namespace: &'static str, cycles: Vec<Vec<Resource>>) -> Arc<Self> {
        Arc::new(Self {
            namespace,
            cycles,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ResourceDiscoverer for ScriptedDiscoverer {
    fn namespace(&self) -> &'static str {
        self.namespace
    }

    async fn discover(&self, filter: &TagFilter) -> NimbusResult<Vec<Resource>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let list = self
            .cycles
            .get(call)
            .or_else(|| self.cycles.last())
            .cloned()
            .unwrap_or_default();
        Ok(list
            .into_iter()
            .filter(|r| filter.matches(&tags_of(r)))
            .collect())
    }
}

fn tags_of(resource: &Resource) -> Vec<TagPair> {
    resource
        .tags
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| TagPair::new(k, v))
        .collect()
}

/// Samples per statistic, newest first, for every target of a request
#[derive(Default)]
struct ScriptedMonitoring {
    samples: Mutex<HashMap<Statistic, Vec<(DateTime<Utc>, f64)>>>,
    requests: AtomicUsize,
}

impl ScriptedMonitoring {
    fn answer(&self, statistic: Statistic, samples: Vec<(DateTime<Utc>, f64)>) {
        let mut samples = samples;
        samples.sort_by(|a, b| b.0.cmp(&a.0));
        self.samples.lock().insert(statistic, samples);
    }
}

#[async_trait]
impl MonitoringApi for ScriptedMonitoring {
    async fn get_metric_data(&self, request: &MetricDataRequest) -> NimbusResult<Vec<RawSeries>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let samples = self
            .samples
            .lock()
            .get(&request.statistic)
            .cloned()
            .unwrap_or_default();
        Ok(request
            .targets
            .iter()
            .map(|target| {
                let mut row = RawSeries::new(target.label.clone());
                for (ts, value) in &samples {
                    row.push(*ts, *value);
                }
                row
            })
            .collect())
    }
}

fn instance(id: &str) -> Resource {
    Resource::new(id, "ec2", REGION).with_dimension("InstanceId", id)
}

fn labels(id: &str) -> Vec<String> {
    vec![id.into(), id.into(), "ec2".into(), REGION.into(), String::new()]
}

fn minute(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + TimeDelta::minutes(n)
}

fn settings() -> PollerSettings {
    PollerSettings {
        poll_interval: Duration::from_millis(10),
        max_concurrency: 4,
    }
}

fn cpu_poller(
    discoverer: Arc<ScriptedDiscoverer>,
    monitoring: Arc<ScriptedMonitoring>,
    store: Arc<SeriesStore>,
) -> RegionPoller {
    let cpu = MetricDescription::native("AWS/EC2", "CPUUtilization")
        .with_statistics(["Average", "Sum"]);
    let plan = NamespacePlan::new(discoverer, vec![Arc::new(cpu)]);
    let collector = Arc::new(MetricCollector::new(monitoring, store));
    RegionPoller::new(REGION, vec![plan], TagFilter::default(), collector, settings())
}

fn value(store: &SeriesStore, series: &str, id: &str) -> Option<f64> {
    let snapshot = store.snapshot_of(series)?;
    let labels = labels(id);
    let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
    snapshot.value_of(&labels)
}

#[tokio::test]
async fn test_counter_accumulates_while_gauge_reflects_latest_cycle() {
    let store = Arc::new(SeriesStore::new());
    let monitoring = Arc::new(ScriptedMonitoring::default());
    let discoverer = ScriptedDiscoverer::new("AWS/EC2", vec![vec![instance("i-123")]]);
    let poller = cpu_poller(discoverer, monitoring.clone(), store.clone());
    let cancel = CancellationToken::new();

    monitoring.answer(Statistic::Sum, vec![(minute(1), 1.0), (minute(2), 2.0), (minute(3), 3.0)]);
    monitoring.answer(Statistic::Average, vec![(minute(1), 10.0), (minute(2), 20.0), (minute(3), 30.0)]);
    poller.run_cycle(&cancel).await;

    assert_eq!(value(&store, "ec2_cpu_utilization_sum", "i-123"), Some(6.0));
    assert_eq!(value(&store, "ec2_cpu_utilization", "i-123"), Some(20.0));

    monitoring.answer(Statistic::Sum, vec![(minute(4), 4.0), (minute(5), 5.0), (minute(6), 6.0)]);
    monitoring.answer(Statistic::Average, vec![(minute(4), 40.0), (minute(5), 50.0), (minute(6), 60.0)]);
    let report = poller.run_cycle(&cancel).await;

    assert_eq!(report.metrics_failed, 0);
    assert_eq!(value(&store, "ec2_cpu_utilization_sum", "i-123"), Some(21.0));
    assert_eq!(value(&store, "ec2_cpu_utilization", "i-123"), Some(50.0));
}

#[tokio::test]
async fn test_overlapping_windows_are_not_counted_twice() {
    let store = Arc::new(SeriesStore::new());
    let monitoring = Arc::new(ScriptedMonitoring::default());
    let discoverer = ScriptedDiscoverer::new("AWS/EC2", vec![vec![instance("i-123")]]);
    let poller = cpu_poller(discoverer, monitoring.clone(), store.clone());
    let cancel = CancellationToken::new();

    monitoring.answer(Statistic::Sum, vec![(minute(1), 1.0), (minute(2), 2.0), (minute(3), 3.0)]);
    poller.run_cycle(&cancel).await;

    // second window re-reports minutes 2 and 3
    monitoring.answer(
        Statistic::Sum,
        vec![(minute(2), 2.0), (minute(3), 3.0), (minute(4), 4.0)],
    );
    poller.run_cycle(&cancel).await;
    assert_eq!(value(&store, "ec2_cpu_utilization_sum", "i-123"), Some(10.0));

    // nothing new at all: counter unchanged
    poller.run_cycle(&cancel).await;
    assert_eq!(value(&store, "ec2_cpu_utilization_sum", "i-123"), Some(10.0));
}

#[tokio::test]
async fn test_vanished_resource_drops_gauge_but_keeps_counter() {
    let store = Arc::new(SeriesStore::new());
    let monitoring = Arc::new(ScriptedMonitoring::default());
    let discoverer = ScriptedDiscoverer::new(
        "AWS/EC2",
        vec![
            vec![instance("i-123"), instance("i-456")],
            vec![instance("i-456")],
        ],
    );
    let poller = cpu_poller(discoverer, monitoring.clone(), store.clone());
    let cancel = CancellationToken::new();

    monitoring.answer(Statistic::Sum, vec![(minute(1), 5.0)]);
    monitoring.answer(Statistic::Average, vec![(minute(1), 70.0)]);
    poller.run_cycle(&cancel).await;
    assert_eq!(value(&store, "ec2_cpu_utilization", "i-123"), Some(70.0));
    assert_eq!(value(&store, "ec2_cpu_utilization_sum", "i-123"), Some(5.0));

    monitoring.answer(Statistic::Sum, vec![(minute(2), 1.0)]);
    monitoring.answer(Statistic::Average, vec![(minute(2), 80.0)]);
    poller.run_cycle(&cancel).await;

    assert_eq!(value(&store, "ec2_cpu_utilization", "i-123"), None);
    assert_eq!(value(&store, "ec2_cpu_utilization", "i-456"), Some(80.0));
    assert_eq!(value(&store, "ec2_cpu_utilization_sum", "i-123"), Some(5.0));
    assert_eq!(value(&store, "ec2_cpu_utilization_sum", "i-456"), Some(6.0));

    let text = ExpositionAdapter::new(store).render().unwrap();
    assert!(text.contains("# TYPE ec2_cpu_utilization_sum counter"));
    assert!(text.contains("# TYPE ec2_cpu_utilization gauge"));
    assert!(text.contains(r#"ec2_cpu_utilization_sum{name="i-123",id="i-123""#));
    assert!(!text.contains(r#"ec2_cpu_utilization{name="i-123""#));
}

#[tokio::test]
async fn test_tag_filter_limits_discovered_resources() {
    let store = Arc::new(SeriesStore::new());
    let monitoring = Arc::new(ScriptedMonitoring::default());
    let prod = instance("i-prod").with_tags(&[TagPair::new("env", "prod")]);
    let dev = instance("i-dev").with_tags(&[TagPair::new("env", "dev")]);
    let discoverer = ScriptedDiscoverer::new("AWS/EC2", vec![vec![prod, dev]]);

    let cpu = MetricDescription::native("AWS/EC2", "CPUUtilization");
    let plan = NamespacePlan::new(discoverer, vec![Arc::new(cpu)]);
    let collector = Arc::new(MetricCollector::new(monitoring.clone(), store.clone()));
    let filter = TagFilter::new(vec![TagPair::new("env", "prod")]);
    let poller = RegionPoller::new(REGION, vec![plan], filter, collector, settings());

    monitoring.answer(Statistic::Average, vec![(minute(1), 12.0)]);
    let report = poller.run_cycle(&CancellationToken::new()).await;

    assert_eq!(report.resources.get("AWS/EC2"), Some(&1));
    let snapshot = store.snapshot_of("ec2_cpu_utilization").unwrap();
    assert_eq!(snapshot.entries.len(), 1);
    assert_eq!(snapshot.entries[0].labels[1], "i-prod");
    assert_eq!(snapshot.entries[0].labels[4], "env=prod");
}

#[tokio::test]
async fn test_computed_subnet_capacity_from_builtin_catalog() {
    let store = Arc::new(SeriesStore::new());
    let monitoring = Arc::new(ScriptedMonitoring::default());

    let config = Config {
        namespaces: Some(vec![vpc::NAMESPACE.to_string()]),
        ..Config::default()
    };
    let catalogs = builtin_catalogs();
    let plan = resolve_plan(&catalogs, &config);
    assert_eq!(plan.len(), 1);
    let (_, metrics) = plan.into_iter().next().unwrap();

    let subnet = Resource::new("subnet-1", vpc::RESOURCE_TYPE, REGION)
        .with_dimension("SubnetId", "subnet-1")
        .with_attribute(vpc::ATTR_AVAILABLE, 251.0)
        .with_attribute(vpc::ATTR_PREFIX, 24.0);
    let discoverer = ScriptedDiscoverer::new(vpc::NAMESPACE, vec![vec![subnet]]);
    let collector = Arc::new(MetricCollector::new(monitoring.clone(), store.clone()));
    let poller = RegionPoller::new(
        REGION,
        vec![NamespacePlan::new(discoverer, metrics)],
        TagFilter::default(),
        collector,
        settings(),
    );

    let report = poller.run_cycle(&CancellationToken::new()).await;
    assert_eq!(report.metrics_failed, 0);
    assert_eq!(monitoring.requests.load(Ordering::SeqCst), 0);

    let labels = ["subnet-1", "subnet-1", "vpc", REGION, ""];
    let total = store.snapshot_of("total_ip_address_count").unwrap();
    assert_eq!(total.value_of(&labels), Some(256.0));
    let available = store.snapshot_of("available_ip_address_count").unwrap();
    assert_eq!(available.value_of(&labels), Some(251.0));
}
