//! Application and network load balancers
//!
//! Both namespaces share one elbv2 listing; each discoverer keeps only the
//! load balancers whose ARN type segment matches its own namespace.

use async_trait::async_trait;
use nimbus_core::{CatalogMetric, HasTags, NamespaceCatalog, NimbusResult, Resource, ResourceDiscoverer, TagFilter, TagPair};
use tracing::{debug, instrument};

use super::m;
use crate::error_utils::upstream;
use crate::tags::Elbv2Tags;

pub const ALB_NAMESPACE: &str = "AWS/ApplicationELB";
pub const NLB_NAMESPACE: &str = "AWS/NetworkELB";

/// `DescribeTags` accepts at most this many ARNs per call
pub const TAG_CHUNK: usize = 20;

const SUM: &[&str] = &["Sum"];

pub const ALB_METRICS: &[CatalogMetric] = &[
    m("ActiveConnectionCount", "alb_active_connection_count", "The total number of concurrent TCP connections active from clients to the load balancer and from the load balancer to targets").statistics(SUM),
    m("ClientTLSNegotiationErrorCount", "alb_client_tls_negotiation_error_count", "The number of TLS connections initiated by the client that did not establish a session with the load balancer").statistics(SUM),
    m("ConsumedLCUs", "alb_consumed_lcus", "The number of load balancer capacity units (LCU) used by your load balancer"),
    m("HTTPCode_ELB_4XX_Count", "alb_httpcode_elb_4xx_count", "The number of HTTP 4XX client error codes that originate from the load balancer").statistics(SUM),
    m("HTTPCode_ELB_5XX_Count", "alb_httpcode_elb_5xx_count", "The number of HTTP 5XX server error codes that originate from the load balancer").statistics(SUM),
    m("HTTPCode_Target_2XX_Count", "alb_httpcode_target_2xx_count", "The number of HTTP 2XX response codes generated by the targets").statistics(SUM),
    m("HTTPCode_Target_3XX_Count", "alb_httpcode_target_3xx_count", "The number of HTTP 3XX response codes generated by the targets").statistics(SUM),
    m("HTTPCode_Target_4XX_Count", "alb_httpcode_target_4xx_count", "The number of HTTP 4XX response codes generated by the targets").statistics(SUM),
    m("HTTPCode_Target_5XX_Count", "alb_httpcode_target_5xx_count", "The number of HTTP 5XX response codes generated by the targets").statistics(SUM),
    m("NewConnectionCount", "alb_new_connection_count", "The total number of new TCP connections established from clients to the load balancer and from the load balancer to targets").statistics(SUM),
    m("ProcessedBytes", "alb_processed_bytes", "The total number of bytes processed by the load balancer over IPv4 and IPv6").statistics(SUM),
    m("RejectedConnectionCount", "alb_rejected_connection_count", "The number of connections that were rejected because the load balancer had reached its maximum number of connections").statistics(SUM),
    m("RequestCount", "alb_request_count", "The number of requests processed over IPv4 and IPv6").statistics(SUM),
    m("TargetConnectionErrorCount", "alb_target_connection_error_count", "The number of connections that were not successfully established between the load balancer and target").statistics(SUM),
    m("TargetResponseTime", "alb_target_response_time", "The time elapsed, in seconds, after the request leaves the load balancer until a response from the target is received").statistics(&["Average", "Maximum"]),
];

pub const NLB_METRICS: &[CatalogMetric] = &[
    m("ActiveFlowCount", "nlb_active_flow_count", "The total number of concurrent flows (or connections) from clients to targets"),
    m("ConsumedLCUs", "nlb_consumed_lcus", "The number of load balancer capacity units (LCU) used by your load balancer"),
    m("NewFlowCount", "nlb_new_flow_count", "The total number of new flows (or connections) established from clients to targets in the time period").statistics(SUM),
    m("PortAllocationErrorCount", "nlb_port_allocation_error_count", "The total number of ephemeral port allocation errors during a client IP translation operation").statistics(SUM),
    m("ProcessedBytes", "nlb_processed_bytes", "The total number of bytes processed by the load balancer, including TCP/IP headers").statistics(SUM),
    m("ProcessedPackets", "nlb_processed_packets", "The total number of packets processed by the load balancer").statistics(SUM),
    m("TCP_Client_Reset_Count", "nlb_tcp_client_reset_count", "The total number of reset (RST) packets sent from a client to a target").statistics(SUM),
    m("TCP_ELB_Reset_Count", "nlb_tcp_elb_reset_count", "The total number of reset (RST) packets generated by the load balancer").statistics(SUM),
    m("TCP_Target_Reset_Count", "nlb_tcp_target_reset_count", "The total number of reset (RST) packets sent from a target to a client").statistics(SUM),
];

pub fn alb_catalog() -> NamespaceCatalog {
    NamespaceCatalog::new(ALB_NAMESPACE, ALB_METRICS)
}

pub fn nlb_catalog() -> NamespaceCatalog {
    NamespaceCatalog::new(NLB_NAMESPACE, NLB_METRICS)
}

/// Which elbv2 flavour a discoverer serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBalancerKind {
    Application,
    Network,
}

impl LoadBalancerKind {
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Application => ALB_NAMESPACE,
            Self::Network => NLB_NAMESPACE,
        }
    }

    pub fn resource_type(self) -> &'static str {
        match self {
            Self::Application => "lb-application",
            Self::Network => "lb-network",
        }
    }

    /// Type segment used in the ARN
    fn arn_segment(self) -> &'static str {
        match self {
            Self::Application => "app",
            Self::Network => "net",
        }
    }
}

/// Parsed `...:loadbalancer/{type}/{name}/{id}` ARN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerArn<'a> {
    /// `{type}/{name}/{id}`, the value of the `LoadBalancer` dimension
    pub dimension: &'a str,
    pub kind: &'a str,
    pub name: &'a str,
}

impl<'a> LoadBalancerArn<'a> {
    pub fn parse(arn: &'a str) -> Option<Self> {
        let (_, dimension) = arn.split_once("loadbalancer/")?;
        let mut parts = dimension.split('/');
        let kind = parts.next().filter(|s| !s.is_empty())?;
        let name = parts.next().filter(|s| !s.is_empty())?;
        Some(Self {
            dimension,
            kind,
            name,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Elbv2Discoverer {
    client: aws_sdk_elasticloadbalancingv2::Client,
    region: String,
    kind: LoadBalancerKind,
}

impl Elbv2Discoverer {
    pub fn new(
        client: aws_sdk_elasticloadbalancingv2::Client,
        region: impl Into<String>,
        kind: LoadBalancerKind,
    ) -> Self {
        Self {
            client,
            region: region.into(),
            kind,
        }
    }

    /// ARNs of this discoverer's flavour
    async fn load_balancer_arns(&self) -> NimbusResult<Vec<String>> {
        let mut arns = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let output = self
                .client
                .describe_load_balancers()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| upstream("elbv2", e))?;

            arns.extend(
                output
                    .load_balancers()
                    .iter()
                    .filter_map(|lb| lb.load_balancer_arn())
                    .filter(|arn| accepts(self.kind, arn))
                    .map(str::to_string),
            );

            match output.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => return Ok(arns),
            }
        }
    }
}

fn accepts(kind: LoadBalancerKind, arn: &str) -> bool {
    LoadBalancerArn::parse(arn).is_some_and(|parsed| parsed.kind == kind.arn_segment())
}

fn load_balancer_resource(
    kind: LoadBalancerKind,
    region: &str,
    arn: &str,
    tags: &[TagPair],
) -> Option<Resource> {
    let parsed = LoadBalancerArn::parse(arn)?;
    if parsed.kind != kind.arn_segment() {
        return None;
    }
    Some(
        Resource::new(arn, kind.resource_type(), region)
            .with_name(parsed.name)
            .with_dimension("LoadBalancer", parsed.dimension)
            .with_tags(tags),
    )
}

#[async_trait]
impl ResourceDiscoverer for Elbv2Discoverer {
    fn namespace(&self) -> &'static str {
        self.kind.namespace()
    }

    #[instrument(skip_all, fields(region = %self.region, kind = ?self.kind))]
    async fn discover(&self, filter: &TagFilter) -> NimbusResult<Vec<Resource>> {
        let arns = self.load_balancer_arns().await?;

        let mut resources = Vec::with_capacity(arns.len());
        for chunk in arns.chunks(TAG_CHUNK) {
            let output = self
                .client
                .describe_tags()
                .set_resource_arns(Some(chunk.to_vec()))
                .send()
                .await
                .map_err(|e| upstream("elbv2", e))?;

            for description in output.tag_descriptions() {
                let Some(arn) = description.resource_arn() else {
                    continue;
                };
                let tags = Elbv2Tags(description.tags()).tag_pairs();
                if !filter.matches(&tags) {
                    continue;
                }
                resources.extend(load_balancer_resource(self.kind, &self.region, arn, &tags));
            }
        }

        debug!(count = resources.len(), "discovered load balancers");
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALB_ARN: &str =
        "arn:aws:elasticloadbalancing:us-east-1:123456789012:loadbalancer/app/web/50dc6c495c0c9188";
    const NLB_ARN: &str =
        "arn:aws:elasticloadbalancing:us-east-1:123456789012:loadbalancer/net/edge/73e2d6bc24d8a067";

    #[test]
    fn test_parse_arn() {
        let parsed = LoadBalancerArn::parse(ALB_ARN).unwrap();
        assert_eq!(parsed.dimension, "app/web/50dc6c495c0c9188");
        assert_eq!(parsed.kind, "app");
        assert_eq!(parsed.name, "web");

        assert!(LoadBalancerArn::parse("arn:aws:elasticloadbalancing:targetgroup/x").is_none());
        assert!(LoadBalancerArn::parse("loadbalancer/app").is_none());
    }

    #[test]
    fn test_kind_must_match_namespace() {
        let alb = LoadBalancerKind::Application;
        let nlb = LoadBalancerKind::Network;

        assert!(accepts(alb, ALB_ARN));
        assert!(!accepts(alb, NLB_ARN));
        assert!(accepts(nlb, NLB_ARN));
        assert!(load_balancer_resource(nlb, "us-east-1", ALB_ARN, &[]).is_none());

        let resource = load_balancer_resource(nlb, "us-east-1", NLB_ARN, &[]).unwrap();
        assert_eq!(resource.id, NLB_ARN);
        assert_eq!(resource.name, "edge");
        assert_eq!(resource.resource_type, "lb-network");
        assert_eq!(resource.dimensions[0].value, "net/edge/73e2d6bc24d8a067");
        assert_eq!(nlb.namespace(), NLB_NAMESPACE);
        assert_eq!(alb.resource_type(), "lb-application");
    }
}
