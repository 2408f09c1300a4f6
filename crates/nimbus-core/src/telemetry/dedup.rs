//! Cross-cycle deduplication for cumulative statistics

use std::collections::HashMap;

use chrono::{DateTime, Utc};
// Use parking_lot::RwLock for synchronous, non-blocking access
use parking_lot::{RwLock, RwLockUpgradableReadGuard};

use super::label::LabelIdentity;

/// Per-metric dedup cursors keyed by series identity.
///
/// A sample is counted at most once: anything at or before the cursor is
/// dropped, and the cursor only ever moves forward.
#[derive(Debug, Default)]
pub struct DedupFilter {
    cursors: RwLock<HashMap<LabelIdentity, DateTime<Utc>>>,
}

impl DedupFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cursor for a series
    pub fn cursor(&self, key: &LabelIdentity) -> Option<DateTime<Utc>> {
        self.cursors.read().get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.cursors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.read().is_empty()
    }

    /// Keep the samples strictly newer than `cursor`. No cursor keeps all.
    pub fn retain_after(
        values: &[f64],
        timestamps: &[DateTime<Utc>],
        cursor: Option<DateTime<Utc>>,
    ) -> Vec<f64> {
        match cursor {
            None => values.to_vec(),
            Some(cursor) => values
                .iter()
                .zip(timestamps)
                .filter(|(_, ts)| **ts > cursor)
                .map(|(v, _)| *v)
                .collect(),
        }
    }

    /// Filter one batch and advance the cursor.
    ///
    /// When anything survives, the cursor moves to the newest timestamp of the
    /// whole input batch. Concurrent calls for the same metric are ordered by
    /// the upgradable lock, so two tasks cannot both count the same sample.
    pub fn filter(
        &self,
        key: &LabelIdentity,
        values: &[f64],
        timestamps: &[DateTime<Utc>],
    ) -> Vec<f64> {
        let cursors = self.cursors.upgradable_read();
        let current = cursors.get(key).copied();
        let retained = Self::retain_after(values, timestamps, current);

        if retained.is_empty() {
            return retained;
        }
        let Some(newest) = timestamps.iter().max().copied() else {
            return retained;
        };

        let mut cursors = RwLockUpgradableReadGuard::upgrade(cursors);
        let cursor = cursors.entry(key.clone()).or_insert(newest);
        if newest > *cursor {
            *cursor = newest;
        }
        retained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
    }

    fn key() -> LabelIdentity {
        LabelIdentity {
            statistic: "Sum".into(),
            name: "q".into(),
            id: "q".into(),
            resource_type: "sqs".into(),
            region: "us-east-1".into(),
            tags: String::new(),
        }
    }

    #[test]
    fn test_no_cursor_is_identity() {
        let values = [1.0, 2.0, 3.0];
        let times = [ts(10), ts(5), ts(0)];
        assert_eq!(DedupFilter::retain_after(&values, &times, None), values);

        let filter = DedupFilter::new();
        assert_eq!(filter.filter(&key(), &values, &times), values);
        assert_eq!(filter.cursor(&key()), Some(ts(10)));
    }

    #[test]
    fn test_retains_strictly_after_cursor() {
        let values = [1.0, 2.0, 3.0];
        let times = [ts(10), ts(5), ts(0)];
        assert_eq!(
            DedupFilter::retain_after(&values, &times, Some(ts(5))),
            vec![1.0]
        );
        assert!(DedupFilter::retain_after(&values, &times, Some(ts(10))).is_empty());
    }

    #[test]
    fn test_overlapping_cycles_never_recount() {
        let filter = DedupFilter::new();
        // Cycle 1 window covers 0..10, cycle 2 covers 5..15 (newest-first)
        let first = filter.filter(&key(), &[1.0, 2.0, 3.0], &[ts(10), ts(5), ts(0)]);
        let second = filter.filter(&key(), &[4.0, 5.0, 6.0], &[ts(15), ts(10), ts(5)]);

        assert_eq!(first, vec![1.0, 2.0, 3.0]);
        assert_eq!(second, vec![4.0]);
        assert_eq!(filter.cursor(&key()), Some(ts(15)));
    }

    #[test]
    fn test_unordered_batch_uses_max_timestamp() {
        let filter = DedupFilter::new();
        filter.filter(&key(), &[1.0, 2.0, 3.0], &[ts(5), ts(20), ts(0)]);
        assert_eq!(filter.cursor(&key()), Some(ts(20)));

        let next = filter.filter(&key(), &[9.0, 8.0], &[ts(15), ts(25)]);
        assert_eq!(next, vec![8.0]);
        assert_eq!(filter.cursor(&key()), Some(ts(25)));
    }

    #[test]
    fn test_stale_batch_does_not_move_cursor() {
        let filter = DedupFilter::new();
        filter.filter(&key(), &[1.0], &[ts(30)]);
        let stale = filter.filter(&key(), &[5.0, 6.0], &[ts(20), ts(10)]);
        assert!(stale.is_empty());
        assert_eq!(filter.cursor(&key()), Some(ts(30)));
    }

    #[test]
    fn test_keys_are_independent() {
        let filter = DedupFilter::new();
        let mut other = key();
        other.id = "other".into();

        filter.filter(&key(), &[1.0], &[ts(30)]);
        assert_eq!(filter.filter(&other, &[2.0], &[ts(10)]), vec![2.0]);
        assert_eq!(filter.len(), 2);
    }
}
