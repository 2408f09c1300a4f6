//! ElastiCache clusters

use async_trait::async_trait;
use nimbus_core::{CatalogMetric, HasTags, NamespaceCatalog, NimbusResult, Resource, ResourceDiscoverer, TagFilter, TagPair};
use tracing::{debug, instrument};

use super::{lookup_each, m};
use crate::error_utils::upstream;
use crate::tags::ElastiCacheTags;

pub const NAMESPACE: &str = "AWS/ElastiCache";
pub const RESOURCE_TYPE: &str = "elasticache";

pub const METRICS: &[CatalogMetric] = &[
    m("ActiveDefragHits", "elasticache_active_defrag_hits", "The number of value reallocations per minute performed by the active defragmentation process"),
    m("BytesUsedForCache", "elasticache_bytes_used_for_cache", "The total number of bytes allocated by Redis for all purposes, including the dataset, buffers, etc"),
    m("CacheHits", "elasticache_cache_hits", "The number of successful read-only key lookups in the main dictionary"),
    m("CacheMisses", "elasticache_cache_misses", "The number of unsuccessful read-only key lookups in the main dictionary"),
    m("CPUUtilization", "elasticache_cpu_utilization", "The percentage of CPU utilization"),
    m("CurrConnections", "elasticache_curr_connections", "The number of client connections, excluding connections from read replicas"),
    m("CurrItems", "elasticache_curr_items", "The number of items in the cache"),
    m("DatabaseMemoryUsagePercentage", "elasticache_database_memory_usage_percentage", "The percentage of available memory used by the database"),
    m("EngineCPUUtilization", "elasticache_engine_cpu_utilization", "Provides CPU utilization of the Redis engine thread"),
    m("Evictions", "elasticache_evictions", "The number of keys that have been evicted due to the maxmemory limit"),
    m("FreeableMemory", "elasticache_freeable_memory", "The amount of free memory available on the host"),
    m("GetTypeCmds", "elasticache_get_type_cmds", "The total number of read-only type commands"),
    m("IsMaster", "elasticache_is_master", "Returns 1 in case if node is master"),
    m("KeyBasedCmds", "elasticache_key_based_cmds", "The total number of commands that are key-based"),
    m("ListBasedCmds", "elasticache_list_based_cmds", "The total number of commands that are list-based"),
    m("MasterLinkHealthStatus", "elasticache_master_link_health_status", "0 when data in the primary node is out of sync with the replica, 1 when it is in sync"),
    m("NetworkBytesIn", "elasticache_network_bytes_in", "The number of bytes the host has read from the network"),
    m("NetworkBytesOut", "elasticache_network_bytes_out", "The number of bytes the host has written to the network"),
    m("NetworkPacketsIn", "elasticache_network_packets_in", "The number of packets received on all network interfaces by the instance"),
    m("NetworkPacketsOut", "elasticache_network_packets_out", "The number of packets sent out on all network interfaces by the instance"),
    m("NewConnections", "elasticache_new_connections", "The total number of connections that have been accepted by the server during this period"),
    m("Reclaimed", "elasticache_reclaimed", "The total number of key expiration events"),
    m("ReplicationBytes", "elasticache_replication_bytes", "For nodes in a replicated configuration, the number of bytes that the primary is sending to all of its replicas"),
    m("ReplicationLag", "elasticache_replication_lag", "How far behind, in seconds, a read replica is in applying changes from the primary node"),
    m("SaveInProgress", "elasticache_save_in_progress", "1 whenever a background save is in progress, 0 otherwise"),
    m("SetBasedCmds", "elasticache_set_based_cmds", "The total number of commands that are set-based"),
    m("SetTypeCmds", "elasticache_set_type_cmds", "The total number of write types of commands"),
    m("SortedSetBasedCmds", "elasticache_sorted_set_based_cmds", "The total number of commands that are sorted set-based"),
    m("StringBasedCmds", "elasticache_string_based_cmds", "The total number of commands that are string-based"),
    m("SwapUsage", "elasticache_swap_usage", "The amount of swap used on the host"),
];

pub fn catalog() -> NamespaceCatalog {
    NamespaceCatalog::new(NAMESPACE, METRICS)
}

#[derive(Debug, Clone)]
pub struct ElastiCacheDiscoverer {
    client: aws_sdk_elasticache::Client,
    region: String,
}

impl ElastiCacheDiscoverer {
    pub fn new(client: aws_sdk_elasticache::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    async fn tags_for(&self, arn: Option<String>) -> NimbusResult<Vec<TagPair>> {
        let Some(arn) = arn else {
            return Ok(Vec::new());
        };
        let output = self
            .client
            .list_tags_for_resource()
            .resource_name(arn)
            .send()
            .await
            .map_err(|e| upstream("elasticache", e))?;
        Ok(ElastiCacheTags(output.tag_list()).tag_pairs())
    }
}

#[async_trait]
impl ResourceDiscoverer for ElastiCacheDiscoverer {
    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn discover(&self, filter: &TagFilter) -> NimbusResult<Vec<Resource>> {
        let mut pages = self.client.describe_cache_clusters().into_paginator().send();

        let mut clusters: Vec<(String, Option<String>)> = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| upstream("elasticache", e))?;
            clusters.extend(page.cache_clusters().iter().filter_map(|c| {
                c.cache_cluster_id()
                    .map(|id| (id.to_string(), c.arn().map(str::to_string)))
            }));
        }

        let resources = lookup_each(
            NAMESPACE,
            clusters,
            |(id, _)| id.clone(),
            |(id, arn)| async move {
                let tags = self.tags_for(arn).await?;
                if !filter.matches(&tags) {
                    return NimbusResult::Ok(None);
                }
                Ok(Some(
                    Resource::new(&id, RESOURCE_TYPE, &self.region)
                        .with_dimension("CacheClusterId", &id)
                        .with_tags(&tags),
                ))
            },
        )
        .await;

        debug!(count = resources.len(), "discovered cache clusters");
        Ok(resources)
    }
}
