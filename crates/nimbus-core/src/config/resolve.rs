//! Resolve catalog rows and user overrides into metric descriptions
//!
//! Each field is taken from the first source that sets it: the user's
//! per-metric override, the user's namespace default (period and range
//! only), the catalog row, the catalog's namespace default, then the global
//! default from the config file.

use std::sync::Arc;

use super::model::{Config, MetricOverride, NamespaceOverride};
use crate::catalog::{CatalogMetric, MetricDescription, NamespaceCatalog};
use crate::types::Dimension;

/// Resolve every metric of one namespace, sorted by metric name.
///
/// Overrides naming a metric the catalog lacks add a native metric.
pub fn resolve_namespace(catalog: &NamespaceCatalog, config: &Config) -> Vec<Arc<MetricDescription>> {
    let empty = NamespaceOverride::default();
    let user = config.metrics.get(catalog.namespace).unwrap_or(&empty);

    let mut resolved: Vec<MetricDescription> = Vec::with_capacity(catalog.len());

    for row in catalog.metrics {
        let base = MetricDescription::native(catalog.namespace, row.name);
        resolved.push(apply(base, Some(row), catalog, user, config));
    }
    for computed in &catalog.computed {
        let base = MetricDescription::computed(
            catalog.namespace,
            computed.metric.name,
            Arc::clone(&computed.computer),
        );
        resolved.push(apply(base, Some(&computed.metric), catalog, user, config));
    }
    for name in user.metrics.keys() {
        if catalog.find(name).is_none() {
            let base = MetricDescription::native(catalog.namespace, name.as_str());
            resolved.push(apply(base, None, catalog, user, config));
        }
    }

    resolved.sort_by(|a, b| a.metric_name.cmp(&b.metric_name));
    resolved.into_iter().map(Arc::new).collect()
}

/// Resolve every catalog admitted by the namespace allow-list
pub fn resolve_plan<'a>(
    catalogs: &'a [NamespaceCatalog],
    config: &Config,
) -> Vec<(&'a NamespaceCatalog, Vec<Arc<MetricDescription>>)> {
    catalogs
        .iter()
        .filter(|c| config.polls(c.namespace))
        .map(|c| (c, resolve_namespace(c, config)))
        .collect()
}

fn apply(
    base: MetricDescription,
    row: Option<&CatalogMetric>,
    catalog: &NamespaceCatalog,
    user: &NamespaceOverride,
    config: &Config,
) -> MetricDescription {
    let default_override = MetricOverride::default();
    let over = user
        .metrics
        .get(&base.metric_name)
        .unwrap_or(&default_override);

    let period = over
        .period_seconds
        .or(user.period_seconds)
        .or(row.and_then(|r| r.period_seconds))
        .or(catalog.period_seconds)
        .unwrap_or(config.period_seconds);
    let range = over
        .range_seconds
        .or(user.range_seconds)
        .or(row.and_then(|r| r.range_seconds))
        .or(catalog.range_seconds)
        .unwrap_or(config.range_seconds);

    let mut desc = base.with_period(period).with_range(range);

    if let Some(name) = over.output_name.as_deref().or(row.and_then(|r| r.output_name)) {
        desc = desc.with_output_name(name);
    }
    if let Some(help) = over.help.as_deref().or(row.map(|r| r.help)) {
        desc = desc.with_help(help);
    }
    if let Some(statistics) = &over.statistics {
        desc = desc.with_statistics(statistics.iter().cloned());
    } else if let Some(row) = row {
        desc = desc.with_statistics(row.statistics.iter().copied());
    }
    if let Some(dimensions) = &over.dimensions {
        desc = desc.with_dimensions(dimensions.clone());
    } else if let Some(row) = row {
        desc = desc.with_dimensions(
            row.dimensions
                .iter()
                .map(|(name, value)| Dimension::new(*name, *value))
                .collect(),
        );
    }
    desc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricOverride;

    static ROWS: &[CatalogMetric] = &[
        CatalogMetric::new("CPUUtilization", "ec2_cpu_utilization", "CPU utilization"),
        CatalogMetric::new("NetworkIn", "ec2_network_in", "Bytes in")
            .statistics(&["Average", "Sum"])
            .period(300),
        CatalogMetric::new("BucketSizeBytes", "s3_bucket_size_bytes", "Bucket size")
            .dimensions(&[("StorageType", "StandardStorage")]),
    ];

    fn catalog() -> NamespaceCatalog {
        NamespaceCatalog::new("AWS/EC2", ROWS).with_range(600)
    }

    fn find<'a>(all: &'a [Arc<MetricDescription>], name: &str) -> &'a MetricDescription {
        all.iter().find(|m| m.metric_name == name).unwrap()
    }

    #[test]
    fn test_catalog_values_and_global_defaults() {
        let config = Config {
            period_seconds: 120,
            ..Config::default()
        };
        let all = resolve_namespace(&catalog(), &config);
        assert_eq!(all.len(), 3);

        let cpu = find(&all, "CPUUtilization");
        assert_eq!(cpu.output_name, "ec2_cpu_utilization");
        assert_eq!(cpu.help, "CPU utilization");
        assert_eq!(cpu.statistics, vec!["Average"]);
        assert_eq!(cpu.period_seconds, 120);
        // catalog namespace default beats the global one
        assert_eq!(cpu.range_seconds, 600);

        let net = find(&all, "NetworkIn");
        assert_eq!(net.period_seconds, 300);
        assert_eq!(net.statistics, vec!["Average", "Sum"]);

        let bucket = find(&all, "BucketSizeBytes");
        assert_eq!(bucket.dimensions, vec![Dimension::new("StorageType", "StandardStorage")]);
    }

    #[test]
    fn test_user_overrides_win() {
        let mut ns = NamespaceOverride {
            period_seconds: Some(900),
            ..NamespaceOverride::default()
        };
        ns.metrics.insert(
            "NetworkIn".into(),
            MetricOverride {
                output_name: Some("net_bytes_in".into()),
                statistics: Some(vec!["Maximum".into()]),
                range_seconds: Some(3600),
                ..MetricOverride::default()
            },
        );
        let mut config = Config::default();
        config.metrics.insert("AWS/EC2".into(), ns);

        let all = resolve_namespace(&catalog(), &config);
        let net = find(&all, "NetworkIn");
        assert_eq!(net.output_name, "net_bytes_in");
        assert_eq!(net.statistics, vec!["Maximum"]);
        assert_eq!(net.range_seconds, 3600);
        // user namespace period beats the catalog row's
        assert_eq!(net.period_seconds, 900);
        assert_eq!(find(&all, "CPUUtilization").period_seconds, 900);
    }

    #[test]
    fn test_override_for_unknown_metric_adds_native() {
        let mut ns = NamespaceOverride::default();
        ns.metrics.insert("MetadataNoToken".into(), MetricOverride::default());
        let mut config = Config::default();
        config.metrics.insert("AWS/EC2".into(), ns);

        let all = resolve_namespace(&catalog(), &config);
        let extra = find(&all, "MetadataNoToken");
        assert_eq!(extra.output_name, "ec2_metadata_no_token");
        assert_eq!(extra.statistics, vec!["Average"]);
        assert!(!extra.is_computed());
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_plan_honours_allow_list() {
        let catalogs = vec![catalog(), NamespaceCatalog::new("AWS/RDS", &[])];
        let config = Config {
            namespaces: Some(vec!["AWS/RDS".into()]),
            ..Config::default()
        };
        let plan = resolve_plan(&catalogs, &config);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].0.namespace, "AWS/RDS");
        assert!(plan[0].1.is_empty());
    }
}
