//! Core pipeline of the nimbus exporter
//!
//! Resource lists come in from a [`provider::ResourceDiscoverer`], batched
//! queries go out through a [`provider::MonitoringApi`], and the results end
//! up in a [`telemetry::SeriesStore`] that the scrape endpoint reads.

pub mod catalog;
pub mod collector;
pub mod config;
pub mod error;
pub mod poller;
pub mod provider;
pub mod telemetry;
pub mod types;

pub use catalog::{CatalogMetric, MetricDescription, MetricSource, NamespaceCatalog};
pub use collector::{CollectionOutcome, MetricCollector};
pub use config::Config;
pub use error::{NimbusError, NimbusResult, ResultExt};
pub use poller::{CycleReport, NamespacePlan, PollerSettings, RegionPoller};
pub use provider::{
    MetricComputer, MetricDataRequest, MonitoringApi, QueryTarget, RawSeries, ResourceDiscoverer,
    TimeWindow,
};
pub use telemetry::{
    DedupFilter, ExporterTelemetry, ExpositionAdapter, LabelCodec, LabelIdentity, Registration,
    SeriesEntry, SeriesStore, StatReducer,
};
pub use types::{Dimension, HasTags, Resource, SeriesKind, Statistic, TagFilter, TagPair};
