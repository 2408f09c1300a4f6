//! Per-region SDK configuration

use std::time::Duration;

use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_cloudwatch::config::Credentials;
use tracing::debug;

/// Provider name attached to the static credentials from the config file
const CREDENTIALS_SOURCE: &str = "nimbus-config";

/// Shared SDK configuration for one region
///
/// Service clients are cheap to build from it, so each discoverer owns its
/// own client.
#[derive(Debug, Clone)]
pub struct AwsSession {
    region: String,
    sdk: SdkConfig,
}

impl AwsSession {
    /// Load the SDK configuration for `region` with static credentials.
    ///
    /// `request_timeout` bounds every operation, retries included.
    pub async fn connect(
        region: impl Into<String>,
        api_key: &str,
        api_secret: &str,
        request_timeout: Duration,
    ) -> Self {
        let region = region.into();
        let credentials = Credentials::new(api_key, api_secret, None, None, CREDENTIALS_SOURCE);
        let timeouts = TimeoutConfig::builder()
            .operation_timeout(request_timeout)
            .build();

        let sdk = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .credentials_provider(credentials)
            .timeout_config(timeouts)
            .load()
            .await;

        debug!(region = %region, "aws session ready");
        Self { region, sdk }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn cloudwatch(&self) -> aws_sdk_cloudwatch::Client {
        aws_sdk_cloudwatch::Client::new(&self.sdk)
    }

    pub fn ec2(&self) -> aws_sdk_ec2::Client {
        aws_sdk_ec2::Client::new(&self.sdk)
    }

    pub fn rds(&self) -> aws_sdk_rds::Client {
        aws_sdk_rds::Client::new(&self.sdk)
    }

    pub fn elasticache(&self) -> aws_sdk_elasticache::Client {
        aws_sdk_elasticache::Client::new(&self.sdk)
    }

    pub fn elb(&self) -> aws_sdk_elasticloadbalancing::Client {
        aws_sdk_elasticloadbalancing::Client::new(&self.sdk)
    }

    pub fn elbv2(&self) -> aws_sdk_elasticloadbalancingv2::Client {
        aws_sdk_elasticloadbalancingv2::Client::new(&self.sdk)
    }

    pub fn s3(&self) -> aws_sdk_s3::Client {
        aws_sdk_s3::Client::new(&self.sdk)
    }

    pub fn sqs(&self) -> aws_sdk_sqs::Client {
        aws_sdk_sqs::Client::new(&self.sdk)
    }

    pub fn backup(&self) -> aws_sdk_backup::Client {
        aws_sdk_backup::Client::new(&self.sdk)
    }
}
