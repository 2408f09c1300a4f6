//! Domain types shared by every stage of the pipeline

mod resource;
mod statistic;
mod tags;

pub use resource::{Dimension, Resource};
pub use statistic::{SeriesKind, Statistic};
pub use tags::{HasTags, TagFilter, TagPair, tags_to_label};
