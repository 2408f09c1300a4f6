//! Provider statistics and the output series kind they map to

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NimbusError;

/// How a series behaves across collection cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// Replaced wholesale each cycle
    Gauge,
    /// Accumulated across cycles, never removed
    Counter,
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gauge => write!(f, "gauge"),
            Self::Counter => write!(f, "counter"),
        }
    }
}

/// An aggregation applied by the monitoring API over a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    Average,
    Sum,
    Minimum,
    Maximum,
    SampleCount,
}

impl Statistic {
    pub const ALL: [Statistic; 5] = [
        Self::Average,
        Self::Sum,
        Self::Minimum,
        Self::Maximum,
        Self::SampleCount,
    ];

    /// Provider wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Average => "Average",
            Self::Sum => "Sum",
            Self::Minimum => "Minimum",
            Self::Maximum => "Maximum",
            Self::SampleCount => "SampleCount",
        }
    }

    /// Cumulative statistics are deduplicated and exported as counters
    pub fn is_cumulative(&self) -> bool {
        matches!(self, Self::Sum | Self::SampleCount)
    }

    pub fn series_kind(&self) -> SeriesKind {
        if self.is_cumulative() {
            SeriesKind::Counter
        } else {
            SeriesKind::Gauge
        }
    }

    /// Output name suffix. Average stays bare.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Average => "",
            Self::Sum => "_sum",
            Self::Minimum => "_min",
            Self::Maximum => "_max",
            Self::SampleCount => "_count",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Statistic {
    type Err = NimbusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|stat| stat.as_str() == s)
            .ok_or_else(|| NimbusError::unsupported_statistic(s))
    }
}
