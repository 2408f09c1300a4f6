//! A single named series and its current values

use std::collections::HashMap;

use parking_lot::RwLock;
use prometheus::core::{Atomic, AtomicF64};
use serde::Serialize;

use crate::error::{NimbusError, NimbusResult};
use crate::types::SeriesKind;

/// Label names carried by every exported series
pub fn default_label_names() -> Vec<String> {
    ["name", "id", "type", "region", "tags"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Static description of a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesDescriptor {
    pub name: String,
    pub kind: SeriesKind,
    pub help: String,
    pub label_names: Vec<String>,
}

impl SeriesDescriptor {
    pub fn new(name: impl Into<String>, kind: SeriesKind, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            help: help.into(),
            label_names: default_label_names(),
        }
    }
}

/// One value plus its label values, in descriptor order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesEntry {
    pub value: f64,
    pub labels: Vec<String>,
}

impl SeriesEntry {
    pub fn new(value: f64, labels: Vec<String>) -> Self {
        Self { value, labels }
    }
}

/// Point-in-time copy of one series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSnapshot {
    pub descriptor: SeriesDescriptor,
    pub entries: Vec<SeriesEntry>,
}

impl SeriesSnapshot {
    pub fn value_of(&self, labels: &[&str]) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.labels.iter().map(String::as_str).eq(labels.iter().copied()))
            .map(|e| e.value)
    }
}

#[derive(Debug)]
enum Values {
    /// scope -> label tuple -> value
    Gauge(HashMap<String, HashMap<Vec<String>, f64>>),
    Counter(HashMap<Vec<String>, AtomicF64>),
}

#[derive(Debug)]
pub(super) struct Series {
    pub(super) descriptor: SeriesDescriptor,
    values: RwLock<Values>,
}

impl Series {
    pub(super) fn new(descriptor: SeriesDescriptor) -> Self {
        let values = match descriptor.kind {
            SeriesKind::Gauge => Values::Gauge(HashMap::new()),
            SeriesKind::Counter => Values::Counter(HashMap::new()),
        };
        Self {
            descriptor,
            values: RwLock::new(values),
        }
    }

    pub(super) fn check_arity(&self, entries: &[SeriesEntry]) -> NimbusResult<()> {
        let want = self.descriptor.label_names.len();
        match entries.iter().find(|e| e.labels.len() != want) {
            Some(bad) => Err(NimbusError::other(format!(
                "series {} expects {} label values, got {}",
                self.descriptor.name,
                want,
                bad.labels.len()
            ))),
            None => Ok(()),
        }
    }

    pub(super) fn replace(&self, scope: &str, clear_all: bool, entries: Vec<SeriesEntry>) {
        let fresh: HashMap<Vec<String>, f64> =
            entries.into_iter().map(|e| (e.labels, e.value)).collect();

        let mut values = self.values.write();
        if let Values::Gauge(scopes) = &mut *values {
            if clear_all {
                scopes.clear();
            }
            scopes.insert(scope.to_string(), fresh);
        }
    }

    pub(super) fn accumulate(&self, entries: Vec<SeriesEntry>) {
        let mut values = self.values.write();
        let Values::Counter(counters) = &mut *values else {
            return;
        };
        for entry in entries {
            if entry.value.is_nan() || entry.value < 0.0 {
                tracing::warn!(
                    series = %self.descriptor.name,
                    value = entry.value,
                    "dropping negative or NaN counter increment"
                );
                continue;
            }
            counters
                .entry(entry.labels)
                .or_insert_with(|| AtomicF64::new(0.0))
                .inc_by(entry.value);
        }
    }

    pub(super) fn snapshot(&self) -> SeriesSnapshot {
        let values = self.values.read();
        let mut entries: Vec<SeriesEntry> = match &*values {
            Values::Gauge(scopes) => scopes
                .values()
                .flat_map(|set| set.iter())
                .map(|(labels, value)| SeriesEntry::new(*value, labels.clone()))
                .collect(),
            Values::Counter(counters) => counters
                .iter()
                .map(|(labels, value)| SeriesEntry::new(value.get(), labels.clone()))
                .collect(),
        };
        entries.sort_by(|a, b| a.labels.cmp(&b.labels));
        SeriesSnapshot {
            descriptor: self.descriptor.clone(),
            entries,
        }
    }
}
