//! EC2 instances

use async_trait::async_trait;
use nimbus_core::{CatalogMetric, HasTags, NamespaceCatalog, NimbusResult, Resource, ResourceDiscoverer, TagFilter};
use tracing::{debug, instrument};

use super::m;
use crate::error_utils::upstream;
use crate::tags::{Ec2Tags, ec2_tag_filters};

pub const NAMESPACE: &str = "AWS/EC2";
pub const RESOURCE_TYPE: &str = "ec2";

pub const METRICS: &[CatalogMetric] = &[
    m("CPUCreditBalance", "ec2_cpu_credit_balance", "The number of earned CPU credits that an instance has accrued since it was launched or started"),
    m("CPUCreditUsage", "ec2_cpu_credit_usage", "The number of CPU credits spent by the instance for CPU utilization"),
    m("CPUSurplusCreditBalance", "ec2_cpu_surplus_credit_balance", "The number of surplus credits that have been spent by an unlimited instance when its CPUCreditBalance value is zero"),
    m("CPUSurplusCreditsCharged", "ec2_cpu_surplus_credits_charged", "The number of spent surplus credits that are not paid down by earned CPU credits, and which thus incur an additional charge"),
    m("CPUUtilization", "ec2_cpu_utilization", "The percentage of allocated EC2 compute units that are currently in use on the instance"),
    m("DiskReadBytes", "ec2_disk_read_bytes", "Bytes read from all instance store volumes available to the instance"),
    m("DiskReadOps", "ec2_disk_read_ops", "Completed read operations from all instance store volumes available to the instance in a specified period of time"),
    m("DiskWriteBytes", "ec2_disk_write_bytes", "Bytes written to all instance store volumes available to the instance"),
    m("DiskWriteOps", "ec2_disk_write_ops", "Completed write operations to all instance store volumes available to the instance in a specified period of time"),
    m("EBSByteBalance", "ec2_ebs_byte_balance", "Available only for the smaller instance sizes. Provides information about the percentage of throughput credits remaining in the burst bucket"),
    m("EBSIOBalance", "ec2_ebs_io_balance", "Available only for the smaller instance sizes. Provides information about the percentage of I/O credits remaining in the burst bucket"),
    m("EBSReadBytes", "ec2_ebs_read_bytes", "Bytes read from all EBS volumes attached to the instance in a specified period of time"),
    m("EBSReadOps", "ec2_ebs_read_ops", "Completed read operations from all Amazon EBS volumes attached to the instance in a specified period of time"),
    m("EBSWriteBytes", "ec2_ebs_write_bytes", "Bytes written to all EBS volumes attached to the instance in a specified period of time"),
    m("EBSWriteOps", "ec2_ebs_write_ops", "Completed write operations to all EBS volumes attached to the instance in a specified period of time"),
    m("NetworkIn", "ec2_network_in", "The number of bytes received on all network interfaces by the instance"),
    m("NetworkOut", "ec2_network_out", "The number of bytes sent out on all network interfaces by the instance"),
    m("NetworkPacketsIn", "ec2_network_packets_in", "The number of packets received on all network interfaces by the instance"),
    m("NetworkPacketsOut", "ec2_network_packets_out", "The number of packets sent out on all network interfaces by the instance"),
    m("StatusCheckFailed", "ec2_status_check_failed", "Reports whether the instance has passed both the instance status check and the system status check in the last minute"),
    m("StatusCheckFailed_Instance", "ec2_status_check_failed_instance", "Reports whether the instance has passed the instance status check in the last minute"),
    m("StatusCheckFailed_System", "ec2_status_check_failed_system", "Reports whether the instance has passed the system status check in the last minute"),
];

/// Basic monitoring publishes EC2 data every five minutes
pub fn catalog() -> NamespaceCatalog {
    NamespaceCatalog::new(NAMESPACE, METRICS).with_period(300)
}

#[derive(Debug, Clone)]
pub struct Ec2Discoverer {
    client: aws_sdk_ec2::Client,
    region: String,
}

impl Ec2Discoverer {
    pub fn new(client: aws_sdk_ec2::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }
}

pub(crate) fn instance_resource(instance: &aws_sdk_ec2::types::Instance, region: &str) -> Option<Resource> {
    let id = instance.instance_id()?;
    let tags = Ec2Tags(instance.tags());
    Some(
        Resource::new(id, RESOURCE_TYPE, region)
            .with_name(tags.name_tag().unwrap_or_default())
            .with_dimension("InstanceId", id)
            .with_tags(&tags.tag_pairs()),
    )
}

#[async_trait]
impl ResourceDiscoverer for Ec2Discoverer {
    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn discover(&self, filter: &TagFilter) -> NimbusResult<Vec<Resource>> {
        // tag filtering happens server side
        let mut pages = self
            .client
            .describe_instances()
            .set_filters(ec2_tag_filters(filter))
            .into_paginator()
            .send();

        let mut resources = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| upstream("ec2", e))?;
            for reservation in page.reservations() {
                resources.extend(
                    reservation
                        .instances()
                        .iter()
                        .filter_map(|i| instance_resource(i, &self.region)),
                );
            }
        }

        debug!(count = resources.len(), "discovered instances");
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{Instance, Tag};

    #[test]
    fn test_instance_named_by_tag() {
        let instance = Instance::builder()
            .instance_id("i-123")
            .tags(Tag::builder().key("Name").value("web 1").build())
            .tags(Tag::builder().key("env").value("prod").build())
            .build();

        let resource = instance_resource(&instance, "eu-west-1").unwrap();
        assert_eq!(resource.id, "i-123");
        assert_eq!(resource.name, "web 1");
        assert_eq!(resource.resource_type, "ec2");
        assert_eq!(resource.tags, "Name=web_1,env=prod");
        assert_eq!(resource.dimensions[0].name, "InstanceId");
    }

    #[test]
    fn test_instance_without_name_uses_id() {
        let instance = Instance::builder().instance_id("i-9").build();
        let resource = instance_resource(&instance, "eu-west-1").unwrap();
        assert_eq!(resource.name, "i-9");
        assert_eq!(resource.tags, "");

        assert!(instance_resource(&Instance::builder().build(), "eu-west-1").is_none());
    }
}
