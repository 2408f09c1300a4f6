//! Per-region polling loop
//!
//! Each cycle discovers every namespace concurrently, waits for all of them,
//! then fans out one collection task per (namespace, metric).

mod region_poller;
mod types;


pub use region_poller::RegionPoller;
pub use types::{CycleReport, NamespacePlan, PollerSettings};
