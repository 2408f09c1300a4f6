//! Namespace-specific catalogs and discoverers
//!
//! One module per CloudWatch namespace. Each exposes its `NAMESPACE`, the
//! built-in `METRICS` table, a `catalog()` constructor, and a
//! [`ResourceDiscoverer`](nimbus_core::ResourceDiscoverer) implementation.

pub mod backup;
pub mod ec2;
pub mod elasticache;
pub mod elb;
pub mod elbv2;
pub mod nat;
pub mod rds;
pub mod s3;
pub mod sqs;
pub mod vpc;

pub use backup::BackupDiscoverer;
pub use ec2::Ec2Discoverer;
pub use elasticache::ElastiCacheDiscoverer;
pub use elb::ElbDiscoverer;
pub use elbv2::{Elbv2Discoverer, LoadBalancerKind};
pub use nat::NatGatewayDiscoverer;
pub use rds::RdsDiscoverer;
pub use s3::S3Discoverer;
pub use sqs::SqsDiscoverer;
pub use vpc::{SubnetCapacity, VpcDiscoverer};

use std::future::Future;

use futures::stream::{self, StreamExt};
use nimbus_core::{CatalogMetric, NimbusResult};
use tracing::warn;

/// Parallel per-resource tag lookups for services without bulk tag calls
pub(crate) const TAG_FETCH_CONCURRENCY: usize = 8;

/// Run `lookup` for every listed item, [`TAG_FETCH_CONCURRENCY`] at a time.
///
/// Results keep listing order. A failed lookup only drops its own item: a
/// bucket we may not read or a queue deleted since listing must not hide the
/// rest of the namespace.
pub(crate) async fn lookup_each<T, R, K, F, Fut>(
    namespace: &'static str,
    items: Vec<T>,
    key: K,
    lookup: F,
) -> Vec<R>
where
    K: Fn(&T) -> String,
    F: Fn(T) -> Fut,
    Fut: Future<Output = NimbusResult<Option<R>>>,
{
    stream::iter(items)
        .map(|item| {
            let id = key(&item);
            let call = lookup(item);
            async move { (id, call.await) }
        })
        .buffered(TAG_FETCH_CONCURRENCY)
        .filter_map(move |(id, result)| async move {
            match result {
                Ok(found) => found,
                Err(e) => {
                    warn!(
                        namespace = namespace,
                        resource = %id,
                        error = %e,
                        "resource lookup failed, leaving it out"
                    );
                    None
                }
            }
        })
        .collect()
        .await
}

/// Shorthand for the catalog tables
pub(crate) const fn m(name: &'static str, output: &'static str, help: &'static str) -> CatalogMetric {
    CatalogMetric::new(name, output, help)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_core::NimbusError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_failed_lookup_keeps_other_resources() {
        let names: Vec<String> = ["orders", "locked", "jobs", "skipped"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let found = lookup_each("AWS/SQS", names, String::clone, |name| async move {
            match name.as_str() {
                "locked" => Err(NimbusError::upstream("sqs", "AccessDenied")),
                "skipped" => Ok(None),
                _ => Ok(Some(name)),
            }
        })
        .await;

        assert_eq!(found, vec!["orders".to_string(), "jobs".to_string()]);
    }

    #[tokio::test]
    async fn test_every_lookup_failing_yields_empty_list() {
        let found: Vec<u32> = lookup_each(
            "AWS/Backup",
            vec![1u32, 2, 3],
            |n| n.to_string(),
            |n| async move { Err(NimbusError::upstream("backup", format!("vault {n} gone"))) },
        )
        .await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_lookups_are_bounded() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let items: Vec<usize> = (0..3 * TAG_FETCH_CONCURRENCY).collect();

        let found = lookup_each("AWS/S3", items, |i| i.to_string(), |i| {
            let in_flight = &in_flight;
            let peak = &peak;
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(Some(i))
            }
        })
        .await;

        assert_eq!(found.len(), 3 * TAG_FETCH_CONCURRENCY);
        assert_eq!(found[5], 5);
        assert!(peak.load(Ordering::SeqCst) <= TAG_FETCH_CONCURRENCY);
    }
}
