//! Error types for the nimbus exporter
//!
//! Every fallible operation in the pipeline returns [`NimbusResult`]. Errors carry a
//! stable error code for log filtering and a retryability flag. Nothing is retried
//! in-cycle; a retryable error simply means the next poll cycle is expected to
//! succeed where this one failed.

mod constructors;
mod conversions;
mod types;

pub use types::{NimbusError, NimbusResult, ResultExt};
