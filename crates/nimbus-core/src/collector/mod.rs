//! Per-metric collection: query, decode, dedup, reduce, store

mod metric_collector;
mod types;


pub use metric_collector::MetricCollector;
pub use types::CollectionOutcome;
