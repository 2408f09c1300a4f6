//! Built-in catalog listing

use std::fmt::Write;

use nimbus_aws::builtin_catalogs;
use nimbus_core::config::resolve_namespace;
use nimbus_core::{Config, MetricDescription, NamespaceCatalog, Statistic};

pub fn show() -> anyhow::Result<()> {
    print!("{}", render(&builtin_catalogs(), &Config::default()));
    Ok(())
}

pub fn render(catalogs: &[NamespaceCatalog], config: &Config) -> String {
    let mut out = String::new();
    for catalog in catalogs {
        let metrics = resolve_namespace(catalog, config);
        let _ = writeln!(out, "{} ({} metrics)", catalog.namespace, metrics.len());
        for metric in &metrics {
            write_metric(&mut out, metric);
        }
        out.push('\n');
    }
    out
}

/// One metric header line, then one line per output series
pub(crate) fn write_metric(out: &mut String, metric: &MetricDescription) {
    let _ = writeln!(
        out,
        "  {:<40} period={}s range={}s [{}]",
        metric.metric_name,
        metric.period_seconds,
        metric.range_seconds,
        metric.source.kind()
    );
    for stat in &metric.statistics {
        match stat.parse::<Statistic>() {
            Ok(stat) => {
                let _ = writeln!(out, "    {:<60} {}", metric.series_name(stat), stat.series_kind());
            }
            Err(_) => {
                let _ = writeln!(out, "    {:<60} unsupported statistic", stat);
            }
        }
    }
}
