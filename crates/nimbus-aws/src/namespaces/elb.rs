//! Classic load balancers

use async_trait::async_trait;
use nimbus_core::{CatalogMetric, HasTags, NamespaceCatalog, NimbusResult, Resource, ResourceDiscoverer, TagFilter};
use tracing::{debug, instrument};

use super::m;
use crate::error_utils::upstream;
use crate::tags::ElbTags;

pub const NAMESPACE: &str = "AWS/ELB";
pub const RESOURCE_TYPE: &str = "lb-classic";

/// `DescribeTags` accepts at most this many names per call
pub const TAG_CHUNK: usize = 20;

const SUM: &[&str] = &["Sum"];

pub const METRICS: &[CatalogMetric] = &[
    m("BackendConnectionErrors", "elb_backend_connection_errors", "The number of connections that were not successfully established between the load balancer and the registered instances").statistics(SUM),
    m("EstimatedProcessedBytes", "elb_estimated_processed_bytes", "The estimated number of bytes processed by the load balancer").statistics(SUM),
    m("HealthyHostCount", "elb_healthy_host_count", "The number of healthy instances registered with the load balancer"),
    m("UnHealthyHostCount", "elb_unhealthy_host_count", "The number of unhealthy instances registered with the load balancer"),
    m("HTTPCode_Backend_2XX", "elb_httpcode_backend_2xx", "The number of HTTP 2XX response codes generated by registered instances").statistics(SUM),
    m("HTTPCode_Backend_3XX", "elb_httpcode_backend_3xx", "The number of HTTP 3XX response codes generated by registered instances").statistics(SUM),
    m("HTTPCode_Backend_4XX", "elb_httpcode_backend_4xx", "The number of HTTP 4XX response codes generated by registered instances").statistics(SUM),
    m("HTTPCode_Backend_5XX", "elb_httpcode_backend_5xx", "The number of HTTP 5XX response codes generated by registered instances").statistics(SUM),
    m("HTTPCode_ELB_4XX", "elb_httpcode_elb_4xx", "The number of HTTP 4XX client error codes generated by the load balancer").statistics(SUM),
    m("HTTPCode_ELB_5XX", "elb_httpcode_elb_5xx", "The number of HTTP 5XX server error codes generated by the load balancer").statistics(SUM),
    m("Latency", "elb_latency", "The total time elapsed, in seconds, from the time the load balancer sent the request to a registered instance until the instance started to send the response headers").statistics(&["Average", "Maximum"]),
    m("RequestCount", "elb_request_count", "The number of requests completed or connections made during the specified interval").statistics(SUM),
    m("SpilloverCount", "elb_spillover_count", "The total number of requests that were rejected because the surge queue is full").statistics(SUM),
    m("SurgeQueueLength", "elb_surge_queue_length", "The total number of requests that are pending routing to a healthy instance").statistics(&["Maximum"]),
];

pub fn catalog() -> NamespaceCatalog {
    NamespaceCatalog::new(NAMESPACE, METRICS)
}

#[derive(Debug, Clone)]
pub struct ElbDiscoverer {
    client: aws_sdk_elasticloadbalancing::Client,
    region: String,
}

impl ElbDiscoverer {
    pub fn new(client: aws_sdk_elasticloadbalancing::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    async fn load_balancer_names(&self) -> NimbusResult<Vec<String>> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let output = self
                .client
                .describe_load_balancers()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| upstream("elb", e))?;

            names.extend(
                output
                    .load_balancer_descriptions()
                    .iter()
                    .filter_map(|lb| lb.load_balancer_name().map(str::to_string)),
            );

            match output.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => return Ok(names),
            }
        }
    }
}

#[async_trait]
impl ResourceDiscoverer for ElbDiscoverer {
    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn discover(&self, filter: &TagFilter) -> NimbusResult<Vec<Resource>> {
        let names = self.load_balancer_names().await?;

        let mut resources = Vec::with_capacity(names.len());
        for chunk in names.chunks(TAG_CHUNK) {
            let output = self
                .client
                .describe_tags()
                .set_load_balancer_names(Some(chunk.to_vec()))
                .send()
                .await
                .map_err(|e| upstream("elb", e))?;

            for description in output.tag_descriptions() {
                let Some(name) = description.load_balancer_name() else {
                    continue;
                };
                let tags = ElbTags(description.tags()).tag_pairs();
                if !filter.matches(&tags) {
                    continue;
                }
                resources.push(
                    Resource::new(name, RESOURCE_TYPE, &self.region)
                        .with_dimension("LoadBalancerName", name)
                        .with_tags(&tags),
                );
            }
        }

        debug!(count = resources.len(), "discovered classic load balancers");
        Ok(resources)
    }
}
