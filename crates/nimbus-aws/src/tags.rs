//! Tag adapters for the SDK response shapes
//!
//! Every service has its own `Tag` type, and they disagree on which fields
//! are optional. The newtypes below give each of them a [`HasTags`] view so
//! discovery code can filter and label them the same way.

use std::collections::HashMap;

use nimbus_core::{HasTags, TagFilter, TagPair};

/// Build a pair from SDK accessors; a missing key drops the tag.
pub fn tag_pair<'a>(
    key: impl Into<Option<&'a str>>,
    value: impl Into<Option<&'a str>>,
) -> Option<TagPair> {
    let key = key.into()?;
    Some(TagPair::new(key, value.into().unwrap_or_default()))
}

macro_rules! sdk_tags {
    ($(#[$meta:meta])* $name:ident, $tag:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'a>(pub &'a [$tag]);

        impl HasTags for $name<'_> {
            fn tag_pairs(&self) -> Vec<TagPair> {
                self.0
                    .iter()
                    .filter_map(|t| tag_pair(t.key(), t.value()))
                    .collect()
            }
        }
    };
}

sdk_tags!(
    /// Tags on instances, NAT gateways and subnets
    Ec2Tags,
    aws_sdk_ec2::types::Tag
);
sdk_tags!(RdsTags, aws_sdk_rds::types::Tag);
sdk_tags!(ElastiCacheTags, aws_sdk_elasticache::types::Tag);
sdk_tags!(ElbTags, aws_sdk_elasticloadbalancing::types::Tag);
sdk_tags!(Elbv2Tags, aws_sdk_elasticloadbalancingv2::types::Tag);
sdk_tags!(S3Tags, aws_sdk_s3::types::Tag);

/// Services that return tags as a plain map (SQS, Backup)
#[derive(Debug, Clone, Copy)]
pub struct MapTags<'a>(pub Option<&'a HashMap<String, String>>);

impl HasTags for MapTags<'_> {
    fn tag_pairs(&self) -> Vec<TagPair> {
        let mut pairs: Vec<TagPair> = self
            .0
            .into_iter()
            .flatten()
            .map(|(k, v)| TagPair::new(k.as_str(), v.as_str()))
            .collect();
        pairs.sort();
        pairs
    }
}

/// Server-side `tag:Key` filters for the EC2 describe calls.
///
/// `None` when the filter is empty so the request carries no filter at all.
pub fn ec2_tag_filters(filter: &TagFilter) -> Option<Vec<aws_sdk_ec2::types::Filter>> {
    if filter.is_empty() {
        return None;
    }
    Some(
        filter
            .required()
            .iter()
            .map(|t| {
                aws_sdk_ec2::types::Filter::builder()
                    .name(format!("tag:{}", t.key))
                    .values(t.value.clone())
                    .build()
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_pair_optional_parts() {
        assert_eq!(tag_pair("env", Some("prod")), Some(TagPair::new("env", "prod")));
        assert_eq!(tag_pair(Some("env"), None), Some(TagPair::new("env", "")));
        assert_eq!(tag_pair(None, Some("prod")), None);
    }

    #[test]
    fn test_ec2_tags_adapter() {
        let tags = vec![
            aws_sdk_ec2::types::Tag::builder().key("Name").value("web-1").build(),
            aws_sdk_ec2::types::Tag::builder().value("orphan").build(),
        ];
        let view = Ec2Tags(&tags);
        assert_eq!(view.tag_pairs(), vec![TagPair::new("Name", "web-1")]);
        assert_eq!(view.name_tag().as_deref(), Some("web-1"));
    }

    #[test]
    fn test_map_tags_sorted() {
        let map = HashMap::from([
            ("team".to_string(), "core".to_string()),
            ("env".to_string(), "prod".to_string()),
        ]);
        let pairs = MapTags(Some(&map)).tag_pairs();
        assert_eq!(pairs[0], TagPair::new("env", "prod"));
        assert_eq!(pairs[1], TagPair::new("team", "core"));
        assert!(MapTags(None).tag_pairs().is_empty());
    }

    #[test]
    fn test_ec2_filters() {
        assert!(ec2_tag_filters(&TagFilter::default()).is_none());

        let filter = TagFilter::new(vec![TagPair::new("env", "prod")]);
        let filters = ec2_tag_filters(&filter).unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].name(), Some("tag:env"));
        assert_eq!(filters[0].values(), &["prod".to_string()]);
    }
}
