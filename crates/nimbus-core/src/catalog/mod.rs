//! Metric catalogs and resolved metric descriptions

mod description;
mod metric;
mod naming;

pub use description::{MetricDescription, MetricSource, NativeQuery};
pub use metric::{CatalogMetric, ComputedMetric, NamespaceCatalog};
pub use naming::{default_output_name, namespace_prefix, sanitize_metric_name, snake_case};
