//! NAT gateways

use async_trait::async_trait;
use nimbus_core::{CatalogMetric, HasTags, NamespaceCatalog, NimbusResult, Resource, ResourceDiscoverer, TagFilter};
use tracing::{debug, instrument};

use super::m;
use crate::error_utils::upstream;
use crate::tags::{Ec2Tags, ec2_tag_filters};

pub const NAMESPACE: &str = "AWS/NATGateway";
pub const RESOURCE_TYPE: &str = "nat-gateway";

pub const METRICS: &[CatalogMetric] = &[
    m("ActiveConnectionCount", "nat_gateway_active_connection_count", "The total number of concurrent active TCP connections through the NAT gateway"),
    m("BytesInFromDestination", "nat_gateway_bytes_in_from_destination", "The number of bytes received by the NAT gateway from the destination"),
    m("BytesInFromSource", "nat_gateway_bytes_in_from_source", "The number of bytes received by the NAT gateway from clients in your VPC"),
    m("BytesOutToDestination", "nat_gateway_bytes_out_to_destination", "The number of bytes sent out through the NAT gateway to the destination"),
    m("BytesOutToSource", "nat_gateway_bytes_out_to_source", "The number of bytes sent through the NAT gateway to the clients in your VPC"),
    m("ConnectionAttemptCount", "nat_gateway_connection_attempt_count", "The number of connection attempts made through the NAT gateway"),
    m("ConnectionEstablishedCount", "nat_gateway_connection_established_count", "The number of connections established through the NAT gateway"),
    m("ErrorPortAllocation", "nat_gateway_error_port_allocation", "The number of times the NAT gateway could not allocate a source port"),
    m("IdleTimeoutCount", "nat_gateway_idle_timeout_count", "The number of connections that transitioned from the active state to the idle state"),
    m("PacketsDropCount", "nat_gateway_packets_drop_count", "The number of packets dropped by the NAT gateway"),
    m("PacketsInFromDestination", "nat_gateway_packets_in_from_destination", "The number of packets received by the NAT gateway from the destination"),
    m("PacketsInFromSource", "nat_gateway_packets_in_from_source", "The number of packets received by the NAT gateway from clients in your VPC"),
    m("PacketsOutToDestination", "nat_gateway_packets_out_to_destination", "The number of packets sent out through the NAT gateway to the destination"),
    m("PacketsOutToSource", "nat_gateway_packets_out_to_source", "The number of packets sent through the NAT gateway to the clients in your VPC"),
];

pub fn catalog() -> NamespaceCatalog {
    NamespaceCatalog::new(NAMESPACE, METRICS)
}

#[derive(Debug, Clone)]
pub struct NatGatewayDiscoverer {
    client: aws_sdk_ec2::Client,
    region: String,
}

impl NatGatewayDiscoverer {
    pub fn new(client: aws_sdk_ec2::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }
}

#[async_trait]
impl ResourceDiscoverer for NatGatewayDiscoverer {
    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn discover(&self, filter: &TagFilter) -> NimbusResult<Vec<Resource>> {
        let mut pages = self
            .client
            .describe_nat_gateways()
            .set_filter(ec2_tag_filters(filter))
            .into_paginator()
            .send();

        let mut resources = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| upstream("ec2", e))?;
            for gateway in page.nat_gateways() {
                let Some(id) = gateway.nat_gateway_id() else {
                    continue;
                };
                let tags = Ec2Tags(gateway.tags());
                resources.push(
                    Resource::new(id, RESOURCE_TYPE, &self.region)
                        .with_dimension("NatGatewayId", id)
                        .with_tags(&tags.tag_pairs()),
                );
            }
        }

        debug!(count = resources.len(), "discovered nat gateways");
        Ok(resources)
    }
}
