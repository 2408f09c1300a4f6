//! RDS database instances

use async_trait::async_trait;
use nimbus_core::{CatalogMetric, HasTags, NamespaceCatalog, NimbusResult, Resource, ResourceDiscoverer, TagFilter};
use tracing::{debug, instrument};

use super::m;
use crate::error_utils::upstream;
use crate::tags::RdsTags;

pub const NAMESPACE: &str = "AWS/RDS";
pub const RESOURCE_TYPE: &str = "rds";

const AVG_MAX: &[&str] = &["Average", "Maximum"];
const AVG_MIN: &[&str] = &["Average", "Minimum"];

pub const METRICS: &[CatalogMetric] = &[
    m("BinLogDiskUsage", "rds_bin_log_disk_usage", "The amount of disk space occupied by binary logs on the master. Applies to MySQL read replicas").statistics(AVG_MAX),
    m("BurstBalance", "rds_burst_balance", "The percent of General Purpose SSD (gp2) burst-bucket I/O credits available").statistics(AVG_MIN),
    m("CPUCreditBalance", "rds_cpu_credit_balance", "The number of earned CPU credits that an instance has accrued").statistics(AVG_MIN),
    m("CPUCreditUsage", "rds_cpu_credit_usage", "The number of CPU credits spent by the instance for CPU utilization").statistics(&["Average", "Sum"]),
    m("CPUSurplusCreditBalance", "rds_cpu_surplus_credit_balance", "The number of surplus credits that have been spent by an unlimited instance when its CPUCreditBalance value is zero"),
    m("CPUSurplusCreditsCharged", "rds_cpu_surplus_credits_charged", "The number of spent surplus credits that are not paid down by earned CPU credits, and which thus incur an additional charge"),
    m("CPUUtilization", "rds_cpu_utilization", "The percentage of CPU utilization").statistics(AVG_MAX),
    m("DatabaseConnections", "rds_database_connections", "The number of database connections in use").statistics(AVG_MAX),
    m("DBLoad", "rds_db_load", "The number of active sessions for the DB engine"),
    m("DBLoadCPU", "rds_db_load_cpu", "The number of active sessions where the wait event type is CPU"),
    m("DBLoadNonCPU", "rds_db_load_non_cpu", "The number of active sessions where the wait event type is not CPU"),
    m("DiskQueueDepth", "rds_disk_queue_depth", "The number of outstanding IOs (read/write requests) waiting to access the disk").statistics(AVG_MAX),
    m("FreeableMemory", "rds_freeable_memory", "The amount of available random access memory"),
    m("FreeStorageSpace", "rds_free_storage_space", "The amount of available storage space"),
    m("MaximumUsedTransactionIDs", "rds_maximum_used_transaction_ids", "The maximum transaction ID that has been used. Applies to PostgreSQL").statistics(AVG_MAX),
    m("NetworkReceiveThroughput", "rds_network_receive_throughput", "The incoming (Receive) network traffic on the DB instance, including both customer database traffic and Amazon RDS traffic used for monitoring and replication"),
    m("NetworkTransmitThroughput", "rds_network_transmit_throughput", "The outgoing (Transmit) network traffic on the DB instance, including both customer database traffic and Amazon RDS traffic used for monitoring and replication"),
    m("OldestReplicationSlotLag", "rds_oldest_replication_slot_lag", "The lagging size of the replica lagging the most in terms of WAL data received. Applies to PostgreSQL"),
    m("ReadIOPS", "rds_read_iops", "The average number of disk read I/O operations per second"),
    m("ReadLatency", "rds_read_latency", "The amount of time taken per disk I/O operation").statistics(AVG_MAX),
    m("ReadThroughput", "rds_read_throughput", "The number of bytes read from disk per second").statistics(AVG_MAX),
    m("ReplicaLag", "rds_replica_lag", "The amount of time a Read Replica DB instance lags behind the source DB instance").statistics(AVG_MAX),
    m("ReplicationSlotDiskUsage", "rds_replication_slot_disk_usage", "The disk space used by replication slot files. Applies to PostgreSQL"),
    m("SwapUsage", "rds_swap_usage", "The amount of swap space used on the DB instance"),
    m("TransactionLogsDiskUsage", "rds_transaction_logs_disk_usage", "The disk space used by transaction logs. Applies to PostgreSQL"),
    m("TransactionLogsGeneration", "rds_transaction_logs_generation", "The size of transaction logs generated per second. Applies to PostgreSQL"),
    m("WriteIOPS", "rds_write_iops", "The average number of disk write I/O operations per second"),
    m("WriteLatency", "rds_write_latency", "The amount of time taken per disk I/O operation").statistics(AVG_MAX),
    m("WriteThroughput", "rds_write_throughput", "The number of bytes written to disk per second").statistics(AVG_MAX),
];

pub fn catalog() -> NamespaceCatalog {
    NamespaceCatalog::new(NAMESPACE, METRICS)
}

#[derive(Debug, Clone)]
pub struct RdsDiscoverer {
    client: aws_sdk_rds::Client,
    region: String,
}

impl RdsDiscoverer {
    pub fn new(client: aws_sdk_rds::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }
}

fn instance_resource(
    instance: &aws_sdk_rds::types::DbInstance,
    region: &str,
    filter: &TagFilter,
) -> Option<Resource> {
    let id = instance.db_instance_identifier()?;
    let tags = RdsTags(instance.tag_list());
    if !filter.matches_tagged(&tags) {
        return None;
    }
    Some(
        Resource::new(id, RESOURCE_TYPE, region)
            .with_dimension("DBInstanceIdentifier", id)
            .with_tags(&tags.tag_pairs()),
    )
}

#[async_trait]
impl ResourceDiscoverer for RdsDiscoverer {
    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn discover(&self, filter: &TagFilter) -> NimbusResult<Vec<Resource>> {
        let mut pages = self.client.describe_db_instances().into_paginator().send();

        let mut resources = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| upstream("rds", e))?;
            resources.extend(
                page.db_instances()
                    .iter()
                    .filter_map(|i| instance_resource(i, &self.region, filter)),
            );
        }

        debug!(count = resources.len(), "discovered db instances");
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_rds::types::{DbInstance, Tag};
    use nimbus_core::TagPair;

    #[test]
    fn test_filter_applied_to_tag_list() {
        let tagged = DbInstance::builder()
            .db_instance_identifier("orders")
            .tag_list(Tag::builder().key("env").value("prod").build())
            .build();
        let untagged = DbInstance::builder().db_instance_identifier("scratch").build();
        let filter = TagFilter::new(vec![TagPair::new("env", "prod")]);

        let resource = instance_resource(&tagged, "us-east-1", &filter).unwrap();
        assert_eq!(resource.dimensions[0].value, "orders");
        assert_eq!(resource.tags, "env=prod");
        assert!(instance_resource(&untagged, "us-east-1", &filter).is_none());
        assert!(instance_resource(&untagged, "us-east-1", &TagFilter::default()).is_some());
    }
}
