//! AWS adapters for the nimbus exporter
//!
//! Everything that talks to the AWS SDK lives here: the CloudWatch client
//! behind [`nimbus_core::MonitoringApi`], one resource discoverer per
//! supported namespace, and the built-in metric catalogs.

pub mod cloudwatch;
mod error_utils;
pub mod namespaces;
pub mod registry;
pub mod session;
pub mod tags;

pub use cloudwatch::CloudWatchClient;
pub use registry::{build_plans, builtin_catalogs, discoverer_for, known_namespaces};
pub use session::AwsSession;
