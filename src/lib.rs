//! nimbus: CloudWatch metrics on a Prometheus scrape endpoint
//!
//! The pipeline lives in [`nimbus_core`]; the AWS adapters in [`aws`].
//! The `nimbus` binary is built from `crates/nimbus-cli`.

pub use nimbus_aws as aws;
pub use nimbus_core::*;
