//! Render the store as a scrape response

use std::sync::Arc;
use std::time::Instant;

use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::{Encoder, TextEncoder};

use super::self_metrics::ExporterTelemetry;
use super::store::{SeriesSnapshot, SeriesStore};
use crate::error::NimbusResult;
use crate::types::SeriesKind;

/// Builds scrape output from the current store contents.
///
/// Only current values are held; nothing here grows with history.
#[derive(Debug, Clone)]
pub struct ExpositionAdapter {
    store: Arc<SeriesStore>,
    telemetry: Option<ExporterTelemetry>,
}

impl ExpositionAdapter {
    pub fn new(store: Arc<SeriesStore>) -> Self {
        Self {
            store,
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, telemetry: ExporterTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Families for every non-empty series, then the exporter's own.
    pub fn gather(&self) -> Vec<MetricFamily> {
        let mut families: Vec<MetricFamily> = self
            .store
            .snapshot()
            .iter()
            .filter(|s| !s.entries.is_empty())
            .map(to_family)
            .collect();

        if let Some(telemetry) = &self.telemetry {
            families.extend(telemetry.registry().gather());
        }
        families
    }

    /// Text exposition format
    pub fn render(&self) -> NimbusResult<String> {
        let started = Instant::now();
        let families = self.gather();

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        let text = String::from_utf8(buffer)?;

        if let Some(telemetry) = &self.telemetry {
            telemetry.record_scrape(started.elapsed(), families.len());
        }
        Ok(text)
    }

    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

fn to_family(snapshot: &SeriesSnapshot) -> MetricFamily {
    let descriptor = &snapshot.descriptor;
    let metrics = snapshot
        .entries
        .iter()
        .map(|entry| {
            let labels = descriptor
                .label_names
                .iter()
                .zip(&entry.labels)
                .map(|(name, value)| {
                    let mut lp = LabelPair::default();
                    lp.set_name(name.clone());
                    lp.set_value(value.clone());
                    lp
                })
                .collect::<Vec<_>>();

            let mut m = Metric::default();
            m.set_label(labels);
            match descriptor.kind {
                SeriesKind::Counter => {
                    let mut c = Counter::default();
                    c.set_value(entry.value);
                    m.set_counter(c);
                }
                SeriesKind::Gauge => {
                    let mut g = Gauge::default();
                    g.set_value(entry.value);
                    m.set_gauge(g);
                }
            }
            m
        })
        .collect::<Vec<_>>();

    let mut mf = MetricFamily::default();
    mf.set_name(descriptor.name.clone());
    mf.set_help(if descriptor.help.is_empty() {
        descriptor.name.clone()
    } else {
        descriptor.help.clone()
    });
    mf.set_field_type(match descriptor.kind {
        SeriesKind::Counter => MetricType::COUNTER,
        SeriesKind::Gauge => MetricType::GAUGE,
    });
    mf.set_metric(metrics);
    mf
}

#[cfg(test)]
#[allow(deprecated)]
mod tests {
    use super::*;
    use crate::telemetry::store::{SeriesDescriptor, SeriesEntry};

    fn labels(id: &str) -> Vec<String> {
        vec![
            "web".into(),
            id.into(),
            "ec2".into(),
            "us-east-1".into(),
            "env=prod".into(),
        ]
    }

    fn populated_store() -> Arc<SeriesStore> {
        let store = Arc::new(SeriesStore::new());
        store.register_if_absent(SeriesDescriptor::new(
            "ec2_cpu_utilization",
            SeriesKind::Gauge,
            "CPU utilization",
        ));
        store.register_if_absent(SeriesDescriptor::new(
            "ec2_network_in_sum",
            SeriesKind::Counter,
            "Bytes in",
        ));
        store.register_if_absent(SeriesDescriptor::new(
            "ec2_idle",
            SeriesKind::Gauge,
            "never written",
        ));
        store
            .update("ec2_cpu_utilization", vec![SeriesEntry::new(42.5, labels("i-1"))])
            .unwrap();
        store
            .update("ec2_network_in_sum", vec![SeriesEntry::new(10.0, labels("i-1"))])
            .unwrap();
        store
    }

    #[test]
    fn test_gather_builds_typed_families() {
        let adapter = ExpositionAdapter::new(populated_store());
        let families = adapter.gather();

        // Empty series are not emitted
        assert_eq!(families.len(), 2);

        let gauge = families
            .iter()
            .find(|f| f.get_name() == "ec2_cpu_utilization")
            .unwrap();
        assert_eq!(gauge.get_field_type(), MetricType::GAUGE);
        let m = &gauge.get_metric()[0];
        assert_eq!(m.get_gauge().value(), 42.5);
        assert_eq!(m.get_label()[0].get_name(), "name");
        assert_eq!(m.get_label()[1].get_value(), "i-1");
        assert_eq!(m.get_label()[4].get_name(), "tags");

        let counter = families
            .iter()
            .find(|f| f.get_name() == "ec2_network_in_sum")
            .unwrap();
        assert_eq!(counter.get_field_type(), MetricType::COUNTER);
        assert_eq!(counter.get_metric()[0].get_counter().value(), 10.0);
    }

    #[test]
    fn test_render_text_format() {
        let telemetry = ExporterTelemetry::new().unwrap();
        let adapter = ExpositionAdapter::new(populated_store()).with_telemetry(telemetry);
        let text = adapter.render().unwrap();

        assert!(text.contains("# TYPE ec2_cpu_utilization gauge"));
        assert!(text.contains("# TYPE ec2_network_in_sum counter"));
        assert!(text.contains(
            "ec2_cpu_utilization{name=\"web\",id=\"i-1\",type=\"ec2\",region=\"us-east-1\",tags=\"env=prod\"} 42.5"
        ));
        assert!(text.contains("nimbus_scrape_duration_seconds"));
        assert!(!text.contains("ec2_idle"));
    }

    #[test]
    fn test_render_empty_store() {
        let adapter = ExpositionAdapter::new(Arc::new(SeriesStore::new()));
        assert_eq!(adapter.render().unwrap(), "");
    }
}
