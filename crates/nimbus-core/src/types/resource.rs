//! Discovered resources

use serde::{Deserialize, Serialize};

use super::tags::{TagPair, tags_to_label};

/// One query dimension
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One monitored entity within a namespace
///
/// Rebuilt on every discovery cycle; never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Stable provider identifier
    pub id: String,
    /// Display name, falls back to the id
    pub name: String,
    pub dimensions: Vec<Dimension>,
    /// Short type label such as `ec2` or `lb-application`
    pub resource_type: String,
    pub region: String,
    /// Flattened `key=value,...` tag string, only used as a label value
    pub tags: String,
    /// Provider-specific numbers carried for locally-computed metrics
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, f64)>,
}

impl Resource {
    pub fn new(
        id: impl Into<String>,
        resource_type: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            dimensions: Vec::new(),
            resource_type: resource_type.into(),
            region: region.into(),
            tags: String::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.name = name;
        }
        self
    }

    pub fn with_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.push(Dimension::new(name, value));
        self
    }

    pub fn with_tags(mut self, tags: &[TagPair]) -> Self {
        self.tags = tags_to_label(tags);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: f64) -> Self {
        self.attributes.push((key.into(), value));
        self
    }

    pub fn attribute(&self, key: &str) -> Option<f64> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }
}
