//! SQS queues

use async_trait::async_trait;
use nimbus_core::{CatalogMetric, HasTags, NamespaceCatalog, NimbusResult, Resource, ResourceDiscoverer, TagFilter};
use tracing::{debug, instrument};

use super::{lookup_each, m};
use crate::error_utils::upstream;
use crate::tags::MapTags;

pub const NAMESPACE: &str = "AWS/SQS";
pub const RESOURCE_TYPE: &str = "sqs";

const LIST_PAGE_SIZE: i32 = 1000;

const AVG_MAX: &[&str] = &["Average", "Maximum"];
const AVG_SUM: &[&str] = &["Average", "Sum"];

pub const METRICS: &[CatalogMetric] = &[
    m("ApproximateAgeOfOldestMessage", "sqs_approximate_age_of_oldest_message", "The approximate age of the oldest non-deleted message in the queue").statistics(AVG_MAX),
    m("ApproximateNumberOfMessagesDelayed", "sqs_approximate_number_of_messages_delayed", "The number of messages in the queue that are delayed and not available for reading immediately").statistics(AVG_SUM),
    m("ApproximateNumberOfMessagesNotVisible", "sqs_approximate_number_of_messages_not_visible", "The number of messages that are in flight").statistics(AVG_SUM),
    m("ApproximateNumberOfMessagesVisible", "sqs_approximate_number_of_messages_visible", "The number of messages available for retrieval from the queue").statistics(AVG_SUM),
    m("NumberOfEmptyReceives", "sqs_number_of_empty_receives", "The number of ReceiveMessage API calls that did not return a message").statistics(AVG_SUM),
    m("NumberOfMessagesDeleted", "sqs_number_of_messages_deleted", "The number of messages deleted from the queue").statistics(AVG_SUM),
    m("NumberOfMessagesReceived", "sqs_number_of_messages_received", "The number of messages returned by calls to the ReceiveMessage action").statistics(AVG_SUM),
    m("NumberOfMessagesSent", "sqs_number_of_messages_sent", "The number of messages added to a queue").statistics(AVG_SUM),
    m("SentMessageSize", "sqs_sent_message_size", "The size of messages added to a queue").statistics(AVG_MAX),
];

pub fn catalog() -> NamespaceCatalog {
    NamespaceCatalog::new(NAMESPACE, METRICS)
}

/// Queue name is the last path segment of its URL
pub fn queue_name(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let (_, path) = rest.split_once('/')?;
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
}

#[derive(Debug, Clone)]
pub struct SqsDiscoverer {
    client: aws_sdk_sqs::Client,
    region: String,
}

impl SqsDiscoverer {
    pub fn new(client: aws_sdk_sqs::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    async fn queue_urls(&self) -> NimbusResult<Vec<String>> {
        let mut urls = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .list_queues()
                .max_results(LIST_PAGE_SIZE)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| upstream("sqs", e))?;

            urls.extend(output.queue_urls().iter().cloned());

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => return Ok(urls),
            }
        }
    }

    async fn queue(&self, url: String, filter: &TagFilter) -> NimbusResult<Option<Resource>> {
        let Some(name) = queue_name(&url) else {
            return Ok(None);
        };
        let output = self
            .client
            .list_queue_tags()
            .queue_url(&url)
            .send()
            .await
            .map_err(|e| upstream("sqs", e))?;

        let tags = MapTags(output.tags()).tag_pairs();
        if !filter.matches(&tags) {
            return Ok(None);
        }
        Ok(Some(
            Resource::new(name, RESOURCE_TYPE, &self.region)
                .with_dimension("QueueName", name)
                .with_tags(&tags),
        ))
    }
}

#[async_trait]
impl ResourceDiscoverer for SqsDiscoverer {
    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn discover(&self, filter: &TagFilter) -> NimbusResult<Vec<Resource>> {
        let urls = self.queue_urls().await?;

        let resources = lookup_each(NAMESPACE, urls, String::clone, |url| self.queue(url, filter)).await;

        debug!(count = resources.len(), "discovered queues");
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_name_from_url() {
        assert_eq!(
            queue_name("https://sqs.us-east-1.amazonaws.com/123456789012/orders"),
            Some("orders")
        );
        assert_eq!(
            queue_name("https://sqs.us-east-1.amazonaws.com/123456789012/jobs.fifo/"),
            Some("jobs.fifo")
        );
        assert_eq!(queue_name("https://sqs.us-east-1.amazonaws.com"), None);
        assert_eq!(queue_name(""), None);
    }
}
