//! VPC subnets and their address capacity
//!
//! CloudWatch publishes nothing per subnet, so both metrics are computed
//! from the numbers discovery already read off the subnet description.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use nimbus_core::{
    CatalogMetric, HasTags, MetricComputer, NamespaceCatalog, NimbusResult, QueryTarget, RawSeries,
    Resource, ResourceDiscoverer, Statistic, TagFilter, TimeWindow,
};
use tracing::{debug, instrument, warn};

use super::m;
use crate::error_utils::upstream;
use crate::tags::{Ec2Tags, ec2_tag_filters};

pub const NAMESPACE: &str = "AWS/VPC";
pub const RESOURCE_TYPE: &str = "vpc";

pub const ATTR_AVAILABLE: &str = "available_ip_address_count";
pub const ATTR_PREFIX: &str = "prefix_length";

pub const AVAILABLE: CatalogMetric = m(
    "AvailableIpAddressCount",
    "available_ip_address_count",
    "The number of ip addresses available for allocation",
);
pub const TOTAL: CatalogMetric = m(
    "TotalIpAddressCount",
    "total_ip_address_count",
    "The total number of ip addresses",
);

pub fn catalog() -> NamespaceCatalog {
    NamespaceCatalog::new(NAMESPACE, &[])
        .with_computed(AVAILABLE, Arc::new(SubnetCapacity::Available))
        .with_computed(TOTAL, Arc::new(SubnetCapacity::Total))
}

/// Prefix length of an IPv4 CIDR block
pub fn prefix_length(cidr: &str) -> Option<u8> {
    let (_, prefix) = cidr.split_once('/')?;
    prefix.parse::<u8>().ok().filter(|p| *p <= 32)
}

/// Addresses in a block of the given prefix length
pub fn block_size(prefix: u8) -> f64 {
    2f64.powi(32 - i32::from(prefix))
}

/// Locally computed subnet capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetCapacity {
    Available,
    Total,
}

impl SubnetCapacity {
    fn value_of(self, resource: &Resource) -> Option<f64> {
        match self {
            Self::Available => resource.attribute(ATTR_AVAILABLE),
            Self::Total => resource
                .attribute(ATTR_PREFIX)
                .and_then(|p| u8::try_from(p as i64).ok())
                .map(block_size),
        }
    }
}

#[async_trait]
impl MetricComputer for SubnetCapacity {
    fn name(&self) -> &str {
        match self {
            Self::Available => "subnet_available_addresses",
            Self::Total => "subnet_total_addresses",
        }
    }

    /// One sample per subnet read at the time of the query, so every
    /// statistic of a single value is that value.
    async fn compute(
        &self,
        targets: &[QueryTarget],
        _statistic: Statistic,
        _window: &TimeWindow,
    ) -> NimbusResult<Vec<RawSeries>> {
        let now = Utc::now();
        let mut rows = Vec::with_capacity(targets.len());
        for target in targets {
            let Some(value) = self.value_of(&target.resource) else {
                warn!(subnet = %target.resource.id, computer = self.name(), "subnet has no capacity data");
                continue;
            };
            let mut row = RawSeries::new(&target.label);
            row.push(now, value);
            rows.push(row);
        }
        Ok(rows)
    }
}

#[derive(Debug, Clone)]
pub struct VpcDiscoverer {
    client: aws_sdk_ec2::Client,
    region: String,
}

impl VpcDiscoverer {
    pub fn new(client: aws_sdk_ec2::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }
}

pub(crate) fn subnet_resource(subnet: &aws_sdk_ec2::types::Subnet, region: &str) -> Option<Resource> {
    let id = subnet.subnet_id()?;
    let tags = Ec2Tags(subnet.tags());
    let mut resource = Resource::new(id, RESOURCE_TYPE, region)
        .with_name(tags.name_tag().unwrap_or_default())
        .with_dimension("SubnetId", id)
        .with_tags(&tags.tag_pairs());

    if let Some(available) = subnet.available_ip_address_count() {
        resource = resource.with_attribute(ATTR_AVAILABLE, f64::from(available));
    }
    if let Some(prefix) = subnet.cidr_block().and_then(prefix_length) {
        resource = resource.with_attribute(ATTR_PREFIX, f64::from(prefix));
    }
    Some(resource)
}

#[async_trait]
impl ResourceDiscoverer for VpcDiscoverer {
    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn discover(&self, filter: &TagFilter) -> NimbusResult<Vec<Resource>> {
        let mut pages = self
            .client
            .describe_subnets()
            .set_filters(ec2_tag_filters(filter))
            .into_paginator()
            .send();

        let mut resources = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| upstream("ec2", e))?;
            resources.extend(
                page.subnets()
                    .iter()
                    .filter_map(|s| subnet_resource(s, &self.region)),
            );
        }

        debug!(count = resources.len(), "discovered subnets");
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::Subnet;
    use chrono::{TimeZone, Utc};

    fn subnet() -> Subnet {
        Subnet::builder()
            .subnet_id("subnet-1")
            .cidr_block("10.0.1.0/24")
            .available_ip_address_count(200)
            .build()
    }

    #[test]
    fn test_prefix_and_block_size() {
        assert_eq!(prefix_length("10.0.0.0/16"), Some(16));
        assert_eq!(prefix_length("10.0.0.0/33"), None);
        assert_eq!(prefix_length("10.0.0.0"), None);
        assert_eq!(block_size(24), 256.0);
        assert_eq!(block_size(32), 1.0);
    }

    #[test]
    fn test_subnet_attributes() {
        let resource = subnet_resource(&subnet(), "eu-west-1").unwrap();
        assert_eq!(resource.attribute(ATTR_AVAILABLE), Some(200.0));
        assert_eq!(resource.attribute(ATTR_PREFIX), Some(24.0));
        assert_eq!(resource.dimensions[0].name, "SubnetId");
    }

    #[tokio::test]
    async fn test_capacity_rows() {
        let resource = subnet_resource(&subnet(), "eu-west-1").unwrap();
        let bare = Resource::new("subnet-2", RESOURCE_TYPE, "eu-west-1");
        let targets = vec![
            QueryTarget {
                label: "a".into(),
                dimensions: resource.dimensions.clone(),
                resource,
            },
            QueryTarget {
                label: "b".into(),
                dimensions: bare.dimensions.clone(),
                resource: bare,
            },
        ];
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 3, 0).unwrap();
        let window = TimeWindow::aligned(now, 300);

        let before = Utc::now();
        let total = SubnetCapacity::Total
            .compute(&targets, Statistic::Average, &window)
            .await
            .unwrap();
        let after = Utc::now();
        assert_eq!(total.len(), 1);
        assert_eq!(total[0].label, "a");
        assert_eq!(total[0].values, vec![256.0]);
        // stamped when read, not at the window edge
        assert_eq!(total[0].timestamps.len(), 1);
        assert!(total[0].timestamps[0] >= before && total[0].timestamps[0] <= after);

        let available = SubnetCapacity::Available
            .compute(&targets, Statistic::Average, &window)
            .await
            .unwrap();
        assert_eq!(available[0].values, vec![200.0]);
    }

    #[test]
    fn test_catalog_is_computed_only() {
        let catalog = catalog();
        assert!(catalog.metrics.is_empty());
        assert_eq!(catalog.len(), 2);
        assert!(catalog.find("TotalIpAddressCount").is_some());
    }
}
