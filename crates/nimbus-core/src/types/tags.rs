//! Resource tags and tag-based filtering

use serde::{Deserialize, Serialize};

/// A single key/value tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TagPair {
    #[serde(alias = "name")]
    pub key: String,
    pub value: String,
}

impl TagPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Anything that carries provider tags
///
/// Each namespace adapter implements this for its own response shape so the
/// discovery code never has to switch over provider types.
pub trait HasTags {
    fn tag_pairs(&self) -> Vec<TagPair>;

    /// Value of the `Name` tag, if any
    fn name_tag(&self) -> Option<String> {
        self.tag_pairs()
            .into_iter()
            .find(|t| t.key == "Name")
            .map(|t| t.value)
    }
}

impl HasTags for Vec<TagPair> {
    fn tag_pairs(&self) -> Vec<TagPair> {
        self.clone()
    }
}

/// Flatten tags into the sorted `key=value,key=value` label value.
///
/// Spaces become `_` so the string stays stable regardless of how the
/// provider returned them.
pub fn tags_to_label(tags: &[TagPair]) -> String {
    let mut parts: Vec<String> = tags
        .iter()
        .map(|t| format!("{}={}", t.key.replace(' ', "_"), t.value.replace(' ', "_")))
        .collect();
    parts.sort();
    parts.join(",")
}

/// Conjunction of required tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    required: Vec<TagPair>,
}

impl TagFilter {
    pub fn new(required: Vec<TagPair>) -> Self {
        Self { required }
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    pub fn required(&self) -> &[TagPair] {
        &self.required
    }

    /// True when every required pair is present. An empty filter matches all.
    pub fn matches(&self, tags: &[TagPair]) -> bool {
        self.required.iter().all(|want| tags.contains(want))
    }

    pub fn matches_tagged<T: HasTags + ?Sized>(&self, item: &T) -> bool {
        self.is_empty() || self.matches(&item.tag_pairs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_to_label_sorted_and_escaped() {
        let tags = vec![
            TagPair::new("team", "data platform"),
            TagPair::new("env", "prod"),
        ];
        assert_eq!(tags_to_label(&tags), "env=prod,team=data_platform");
        assert_eq!(tags_to_label(&[]), "");
    }

    #[test]
    fn test_filter_requires_all_pairs() {
        let filter = TagFilter::new(vec![
            TagPair::new("env", "prod"),
            TagPair::new("team", "core"),
        ]);
        let both = vec![
            TagPair::new("team", "core"),
            TagPair::new("env", "prod"),
            TagPair::new("extra", "x"),
        ];
        let one = vec![TagPair::new("env", "prod")];

        assert!(filter.matches(&both));
        assert!(!filter.matches(&one));
        assert!(!filter.matches(&[]));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = TagFilter::default();
        assert!(filter.matches(&[]));
        assert!(filter.matches_tagged(&vec![TagPair::new("a", "b")]));
    }

    #[test]
    fn test_name_tag() {
        let tags = vec![TagPair::new("Name", "web-1"), TagPair::new("env", "prod")];
        assert_eq!(tags.name_tag().as_deref(), Some("web-1"));
        assert_eq!(Vec::<TagPair>::new().name_tag(), None);
    }
}
