//! Long-lived store of exported series
//!
//! Registration takes a store-wide write lock; value updates only lock the
//! series being written, so unrelated metrics never serialize on each other.

mod series;


pub use series::{SeriesDescriptor, SeriesEntry, SeriesSnapshot, default_label_names};

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{NimbusError, NimbusResult};
use crate::types::SeriesKind;
use series::Series;

/// Scope used by [`SeriesStore::update`], which owns the whole gauge
const UNSCOPED: &str = "";

/// Outcome of [`SeriesStore::register_if_absent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    Existing,
    /// The name belongs to a series of another kind, which is kept
    KindConflict { existing: SeriesKind },
}

impl Registration {
    pub fn created(self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Current values of every registered series
#[derive(Debug, Default)]
pub struct SeriesStore {
    series: RwLock<BTreeMap<String, Arc<Series>>>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series unless one with the same name exists.
    ///
    /// The first registration wins; later help text is ignored and a later
    /// kind is reported as a conflict.
    pub fn register_if_absent(&self, descriptor: SeriesDescriptor) -> Registration {
        if let Some(existing) = self.get(&descriptor.name) {
            return compare_kind(&existing, &descriptor);
        }
        let mut series = self.series.write();
        if let Some(existing) = series.get(&descriptor.name) {
            return compare_kind(existing, &descriptor);
        }
        tracing::debug!(
            series = %descriptor.name,
            kind = %descriptor.kind,
            "registered series"
        );
        series.insert(descriptor.name.clone(), Arc::new(Series::new(descriptor)));
        Registration::Created
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.series.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.read().is_empty()
    }

    /// Apply a batch to a series.
    ///
    /// Gauges: the entry set is replaced. Counters: each value is added to its
    /// label tuple, which is never removed.
    pub fn update(&self, name: &str, entries: Vec<SeriesEntry>) -> NimbusResult<()> {
        self.update_scoped(name, UNSCOPED, entries)
    }

    /// Like [`update`](Self::update), but a gauge only replaces the entries
    /// previously written under the same `scope`.
    ///
    /// One region's poller uses its region as scope so it cannot wipe the
    /// series another region wrote. An [`update`](Self::update) clears every
    /// scope.
    pub fn update_scoped(
        &self,
        name: &str,
        scope: &str,
        entries: Vec<SeriesEntry>,
    ) -> NimbusResult<()> {
        let series = self
            .get(name)
            .ok_or_else(|| NimbusError::other(format!("series {name} is not registered")))?;
        series.check_arity(&entries)?;

        match series.descriptor.kind {
            SeriesKind::Gauge => series.replace(scope, scope == UNSCOPED, entries),
            SeriesKind::Counter => series.accumulate(entries),
        }
        Ok(())
    }

    /// Consistent copy of every series, ordered by name
    pub fn snapshot(&self) -> Vec<SeriesSnapshot> {
        let all: Vec<Arc<Series>> = self.series.read().values().cloned().collect();
        all.iter().map(|s| s.snapshot()).collect()
    }

    pub fn snapshot_of(&self, name: &str) -> Option<SeriesSnapshot> {
        self.get(name).map(|s| s.snapshot())
    }

    fn get(&self, name: &str) -> Option<Arc<Series>> {
        self.series.read().get(name).cloned()
    }
}

fn compare_kind(existing: &Series, requested: &SeriesDescriptor) -> Registration {
    let kind = existing.descriptor.kind;
    if kind == requested.kind {
        return Registration::Existing;
    }
    tracing::warn!(
        series = %requested.name,
        existing = %kind,
        requested = %requested.kind,
        "series name already registered with another kind, keeping the first"
    );
    Registration::KindConflict { existing: kind }
}
