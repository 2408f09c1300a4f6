//! Encoding of a series identity into the opaque query label
//!
//! The monitoring API hands back result rows tagged only with the label string
//! that was sent with the query, so everything needed to route a row back to
//! its resource has to fit into that string. Fields are length-prefixed
//! (`{byte_len}:{bytes}`) so no character is reserved; tag values may contain
//! spaces, colons or commas without corrupting the decode.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::{NimbusError, NimbusResult};
use crate::types::Resource;

const FIELD_COUNT: usize = 6;

/// The decoded identity of one (statistic, resource) series
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelIdentity {
    pub statistic: String,
    pub name: String,
    pub id: String,
    pub resource_type: String,
    pub region: String,
    pub tags: String,
}

impl LabelIdentity {
    pub fn for_resource(statistic: impl Into<String>, resource: &Resource) -> Self {
        Self {
            statistic: statistic.into(),
            name: resource.name.clone(),
            id: resource.id.clone(),
            resource_type: resource.resource_type.clone(),
            region: resource.region.clone(),
            tags: resource.tags.clone(),
        }
    }

    /// Exported label values in `[name, id, type, region, tags]` order
    pub fn label_values(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.id.clone(),
            self.resource_type.clone(),
            self.region.clone(),
            self.tags.clone(),
        ]
    }

    fn fields(&self) -> [&str; FIELD_COUNT] {
        [
            &self.statistic,
            &self.name,
            &self.id,
            &self.resource_type,
            &self.region,
            &self.tags,
        ]
    }
}

/// Stateless encoder/decoder for [`LabelIdentity`]
pub struct LabelCodec;

impl LabelCodec {
    pub fn encode(identity: &LabelIdentity) -> String {
        let fields = identity.fields();
        let capacity = fields.iter().map(|f| f.len() + 4).sum();
        let mut out = String::with_capacity(capacity);
        for field in fields {
            // Writing to a String cannot fail.
            let _ = write!(out, "{}:{}", field.len(), field);
        }
        out
    }

    pub fn decode(label: &str) -> NimbusResult<LabelIdentity> {
        let mut rest = label;
        let mut fields: Vec<String> = Vec::with_capacity(FIELD_COUNT);

        while fields.len() < FIELD_COUNT {
            if rest.is_empty() {
                return Err(NimbusError::malformed_label(
                    label,
                    format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
                ));
            }
            let (len, tail) = rest
                .split_once(':')
                .ok_or_else(|| NimbusError::malformed_label(label, "missing length prefix"))?;
            let len: usize = len
                .parse()
                .map_err(|_| NimbusError::malformed_label(label, format!("bad length {len:?}")))?;
            if len > tail.len() || !tail.is_char_boundary(len) {
                return Err(NimbusError::malformed_label(
                    label,
                    format!("field length {len} overruns input"),
                ));
            }
            fields.push(tail[..len].to_string());
            rest = &tail[len..];
        }

        if !rest.is_empty() {
            return Err(NimbusError::malformed_label(label, "trailing data"));
        }

        let mut it = fields.into_iter();
        let mut next = || it.next().unwrap_or_default();
        Ok(LabelIdentity {
            statistic: next(),
            name: next(),
            id: next(),
            resource_type: next(),
            region: next(),
            tags: next(),
        })
    }
}
