//! S3 buckets
//!
//! Bucket listing is global, so each regional discoverer keeps only the
//! buckets located in its own region. Storage metrics are published once a
//! day.

use async_trait::async_trait;
use aws_sdk_s3::error::ProvideErrorMetadata;
use nimbus_core::{CatalogMetric, HasTags, NamespaceCatalog, NimbusResult, Resource, ResourceDiscoverer, TagFilter, TagPair};
use tracing::{debug, instrument};

use super::{lookup_each, m};
use crate::error_utils::upstream;
use crate::tags::S3Tags;

pub const NAMESPACE: &str = "AWS/S3";
pub const RESOURCE_TYPE: &str = "s3";

const DAY_SECONDS: u32 = 86_400;

pub const METRICS: &[CatalogMetric] = &[
    m("BucketSizeBytes", "s3_bucket_size_bytes", "The amount of data in bytes stored in a bucket in the STANDARD storage class")
        .dimensions(&[("StorageType", "StandardStorage")]),
    m("NumberOfObjects", "s3_number_of_objects", "The total number of objects stored in a bucket for all storage classes except for the GLACIER storage class")
        .dimensions(&[("StorageType", "AllStorageTypes")]),
];

/// One sample per day, looked up over two days so the latest one is always in range
pub fn catalog() -> NamespaceCatalog {
    NamespaceCatalog::new(NAMESPACE, METRICS)
        .with_period(DAY_SECONDS)
        .with_range(2 * DAY_SECONDS)
}

/// Region a `LocationConstraint` stands for
///
/// Buckets in us-east-1 report no constraint at all, and the oldest
/// eu-west-1 buckets still report the legacy `EU` value.
pub fn location_region(constraint: Option<&str>) -> &str {
    match constraint {
        None | Some("") => "us-east-1",
        Some("EU") => "eu-west-1",
        Some(other) => other,
    }
}

#[derive(Debug, Clone)]
pub struct S3Discoverer {
    client: aws_sdk_s3::Client,
    region: String,
}

impl S3Discoverer {
    pub fn new(client: aws_sdk_s3::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    async fn bucket_region(&self, bucket: &str, listed: Option<String>) -> NimbusResult<String> {
        if let Some(region) = listed {
            return Ok(region);
        }
        let output = self
            .client
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| upstream("s3", e))?;
        let constraint = output.location_constraint().map(|c| c.as_str());
        Ok(location_region(constraint).to_string())
    }

    /// Tags of one bucket; a bucket without a tag set has no tags
    async fn bucket_tags(&self, bucket: &str) -> NimbusResult<Vec<TagPair>> {
        match self.client.get_bucket_tagging().bucket(bucket).send().await {
            Ok(output) => Ok(S3Tags(output.tag_set()).tag_pairs()),
            Err(err) if err.as_service_error().and_then(|e| e.code()) == Some("NoSuchTagSet") => {
                Ok(Vec::new())
            }
            Err(err) => Err(upstream("s3", err)),
        }
    }

    /// The bucket as a resource when it lives in this region and passes the filter
    async fn local_bucket(
        &self,
        name: String,
        listed_region: Option<String>,
        filter: &TagFilter,
    ) -> NimbusResult<Option<Resource>> {
        if self.bucket_region(&name, listed_region).await? != self.region {
            return Ok(None);
        }
        let tags = self.bucket_tags(&name).await?;
        if !filter.matches(&tags) {
            return Ok(None);
        }
        Ok(Some(
            Resource::new(&name, RESOURCE_TYPE, &self.region)
                .with_dimension("BucketName", &name)
                .with_tags(&tags),
        ))
    }
}

#[async_trait]
impl ResourceDiscoverer for S3Discoverer {
    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn discover(&self, filter: &TagFilter) -> NimbusResult<Vec<Resource>> {
        let mut pages = self.client.list_buckets().into_paginator().send();

        let mut buckets: Vec<(String, Option<String>)> = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| upstream("s3", e))?;
            buckets.extend(page.buckets().iter().filter_map(|b| {
                b.name()
                    .map(|name| (name.to_string(), b.bucket_region().map(str::to_string)))
            }));
        }

        let resources = lookup_each(
            NAMESPACE,
            buckets,
            |(name, _)| name.clone(),
            |(name, region)| self.local_bucket(name, region, filter),
        )
        .await;

        debug!(count = resources.len(), "discovered buckets");
        Ok(resources)
    }
}
