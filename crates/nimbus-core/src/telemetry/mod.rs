//! Aggregation and exposition pipeline
//!
//! Samples flow label decode -> dedup (cumulative statistics only) -> reduce ->
//! [`SeriesStore`], which [`ExpositionAdapter`] reads on every scrape.

mod dedup;
mod exposition;
mod label;
mod reducer;
mod self_metrics;
mod store;

pub use dedup::DedupFilter;
pub use exposition::ExpositionAdapter;
pub use label::{LabelCodec, LabelIdentity};
pub use reducer::StatReducer;
pub use self_metrics::ExporterTelemetry;
pub use store::{
    Registration, SeriesDescriptor, SeriesEntry, SeriesSnapshot, SeriesStore, default_label_names,
};
