//! SDK error mapping

use std::future::Future;
use std::time::Duration;

use aws_sdk_cloudwatch::error::DisplayErrorContext;
use nimbus_core::{NimbusError, NimbusResult};

/// Turn any SDK failure into an upstream error carrying the full cause chain
pub(crate) fn upstream<E: std::error::Error>(service: &str, err: E) -> NimbusError {
    NimbusError::upstream(service, DisplayErrorContext(err).to_string())
}

/// Bound a single outbound call.
///
/// Paged operations wrap each page on its own, so a long listing made of
/// quick calls never trips the deadline.
pub(crate) async fn within<T, F>(limit: Duration, operation: &str, call: F) -> NimbusResult<T>
where
    F: Future<Output = NimbusResult<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(NimbusError::timeout(limit.as_secs(), operation)))
}
