//! Collection results

use crate::error::NimbusError;

/// What one `collect` call did for one metric
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionOutcome {
    pub namespace: String,
    pub metric: String,
    /// Statistics whose series was written this cycle
    pub statistics_updated: usize,
    /// Entries written across all statistics
    pub entries_written: usize,
    /// Rows dropped by decode or reduce errors
    pub rows_skipped: usize,
    /// Query-level failures; the affected series kept their old values
    pub failures: Vec<NimbusError>,
}

impl CollectionOutcome {
    pub fn new(namespace: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            metric: metric.into(),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn was_cancelled(&self) -> bool {
        self.failures
            .iter()
            .any(|e| matches!(e, NimbusError::Cancelled))
    }
}
