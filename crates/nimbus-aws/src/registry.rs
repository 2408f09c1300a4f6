//! Registry of supported namespaces

use std::sync::Arc;

use nimbus_core::config::resolve_plan;
use nimbus_core::{Config, NamespaceCatalog, NamespacePlan, ResourceDiscoverer};
use tracing::warn;

use crate::namespaces::{
    BackupDiscoverer, Ec2Discoverer, ElastiCacheDiscoverer, ElbDiscoverer, Elbv2Discoverer,
    LoadBalancerKind, NatGatewayDiscoverer, RdsDiscoverer, S3Discoverer, SqsDiscoverer,
    VpcDiscoverer, backup, ec2, elasticache, elb, elbv2, nat, rds, s3, sqs, vpc,
};
use crate::session::AwsSession;

/// Built-in catalogs of every supported namespace
pub fn builtin_catalogs() -> Vec<NamespaceCatalog> {
    vec![
        ec2::catalog(),
        rds::catalog(),
        elasticache::catalog(),
        elb::catalog(),
        elbv2::alb_catalog(),
        elbv2::nlb_catalog(),
        nat::catalog(),
        s3::catalog(),
        sqs::catalog(),
        backup::catalog(),
        vpc::catalog(),
    ]
}

/// Namespace names accepted in the configuration
pub fn known_namespaces() -> Vec<&'static str> {
    builtin_catalogs().iter().map(|c| c.namespace).collect()
}

/// Discoverer for one namespace in the session's region
pub fn discoverer_for(namespace: &str, session: &AwsSession) -> Option<Arc<dyn ResourceDiscoverer>> {
    let region = session.region();
    let discoverer: Arc<dyn ResourceDiscoverer> = match namespace {
        ec2::NAMESPACE => Arc::new(Ec2Discoverer::new(session.ec2(), region)),
        rds::NAMESPACE => Arc::new(RdsDiscoverer::new(session.rds(), region)),
        elasticache::NAMESPACE => Arc::new(ElastiCacheDiscoverer::new(session.elasticache(), region)),
        elb::NAMESPACE => Arc::new(ElbDiscoverer::new(session.elb(), region)),
        elbv2::ALB_NAMESPACE => Arc::new(Elbv2Discoverer::new(
            session.elbv2(),
            region,
            LoadBalancerKind::Application,
        )),
        elbv2::NLB_NAMESPACE => Arc::new(Elbv2Discoverer::new(
            session.elbv2(),
            region,
            LoadBalancerKind::Network,
        )),
        nat::NAMESPACE => Arc::new(NatGatewayDiscoverer::new(session.ec2(), region)),
        s3::NAMESPACE => Arc::new(S3Discoverer::new(session.s3(), region)),
        sqs::NAMESPACE => Arc::new(SqsDiscoverer::new(session.sqs(), region)),
        backup::NAMESPACE => Arc::new(BackupDiscoverer::new(session.backup(), region)),
        vpc::NAMESPACE => Arc::new(VpcDiscoverer::new(session.ec2(), region)),
        _ => return None,
    };
    Some(discoverer)
}

/// One plan per namespace the configuration polls
pub fn build_plans(session: &AwsSession, catalogs: &[NamespaceCatalog], config: &Config) -> Vec<NamespacePlan> {
    resolve_plan(catalogs, config)
        .into_iter()
        .filter_map(|(catalog, metrics)| {
            let Some(discoverer) = discoverer_for(catalog.namespace, session) else {
                warn!(namespace = catalog.namespace, "no discoverer for namespace");
                return None;
            };
            Some(NamespacePlan::new(discoverer, metrics))
        })
        .collect()
}
