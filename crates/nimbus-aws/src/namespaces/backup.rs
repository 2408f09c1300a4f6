//! Backup vaults

use async_trait::async_trait;
use nimbus_core::{CatalogMetric, HasTags, NamespaceCatalog, NimbusResult, Resource, ResourceDiscoverer, TagFilter, TagPair};
use tracing::{debug, instrument};

use super::{lookup_each, m};
use crate::error_utils::upstream;
use crate::tags::MapTags;

pub const NAMESPACE: &str = "AWS/Backup";
pub const RESOURCE_TYPE: &str = "backup";

pub const METRICS: &[CatalogMetric] = &[
    m("NumberOfBackupJobsCreated", "backup_number_of_backup_jobs_created", "The number of backup jobs that AWS Backup created"),
    m("NumberOfBackupJobsPending", "backup_number_of_backup_jobs_pending", "The number of backup jobs about to run in AWS Backup"),
    m("NumberOfBackupJobsRunning", "backup_number_of_backup_jobs_running", "The number of backup jobs currently running in AWS Backup"),
    m("NumberOfBackupJobsAborted", "backup_number_of_backup_jobs_aborted", "The number of user cancelled backup jobs"),
    m("NumberOfBackupJobsCompleted", "backup_number_of_backup_jobs_completed", "The number of backup jobs that AWS Backup finished"),
    m("NumberOfBackupJobsFailed", "backup_number_of_backup_jobs_failed", "The number of backup jobs that AWS Backup scheduled but did not start"),
    m("NumberOfBackupJobsExpired", "backup_number_of_backup_jobs_expired", "The number of backup jobs that AWS Backup attempted to delete based on your backup retention lifecycle, but could not delete"),
    m("NumberOfCopyJobsCreated", "backup_number_of_copy_jobs_created", "The number of cross-account and cross-Region copy jobs that AWS Backup created"),
    m("NumberOfCopyJobsRunning", "backup_number_of_copy_jobs_running", "The number of cross-account and cross-Region copy jobs currently running in AWS Backup"),
    m("NumberOfCopyJobsCompleted", "backup_number_of_copy_jobs_completed", "The number of cross-account and cross-Region copy jobs that AWS Backup finished"),
    m("NumberOfCopyJobsFailed", "backup_number_of_copy_jobs_failed", "The number of cross-account and cross-Region copy jobs that AWS Backup attempted but could not complete"),
    m("NumberOfRestoreJobsPending", "backup_number_of_restore_jobs_pending", "The number of restore jobs about to run in AWS Backup"),
    m("NumberOfRestoreJobsRunning", "backup_number_of_restore_jobs_running", "The number of restore jobs currently running in AWS Backup"),
    m("NumberOfRestoreJobsCompleted", "backup_number_of_restore_jobs_completed", "The number of restore jobs that AWS Backup finished"),
    m("NumberOfRestoreJobsFailed", "backup_number_of_restore_jobs_failed", "The number of restore jobs that AWS Backup attempted but could not complete"),
    m("NumberOfRecoveryPointsCompleted", "backup_number_of_recovery_points_completed", "The number of recovery points that AWS Backup created"),
    m("NumberOfRecoveryPointsPartial", "backup_number_of_recovery_points_partial", "The number of recovery points that AWS Backup started to create but could not finish"),
    m("NumberOfRecoveryPointsExpired", "backup_number_of_recovery_points_expired", "The number of recovery points that AWS Backup attempted to delete based on your backup retention lifecycle, but could not delete"),
    m("NumberOfRecoveryPointsDeleting", "backup_number_of_recovery_points_deleting", "The number of recovery points that AWS Backup is deleting"),
    m("NumberOfRecoveryPointsCold", "backup_number_of_recovery_points_cold", "The number of recovery points that AWS Backup tiered to cold storage"),
];

/// Job counters are sparse; look back a full day at five-minute resolution
pub fn catalog() -> NamespaceCatalog {
    NamespaceCatalog::new(NAMESPACE, METRICS)
        .with_period(300)
        .with_range(86_400)
}

#[derive(Debug, Clone)]
pub struct BackupDiscoverer {
    client: aws_sdk_backup::Client,
    region: String,
}

impl BackupDiscoverer {
    pub fn new(client: aws_sdk_backup::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    async fn vault_tags(&self, arn: Option<String>) -> NimbusResult<Vec<TagPair>> {
        let Some(arn) = arn else {
            return Ok(Vec::new());
        };
        let output = self
            .client
            .list_tags()
            .resource_arn(arn)
            .send()
            .await
            .map_err(|e| upstream("backup", e))?;
        Ok(MapTags(output.tags()).tag_pairs())
    }
}

#[async_trait]
impl ResourceDiscoverer for BackupDiscoverer {
    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    #[instrument(skip_all, fields(region = %self.region))]
    async fn discover(&self, filter: &TagFilter) -> NimbusResult<Vec<Resource>> {
        let mut pages = self.client.list_backup_vaults().into_paginator().send();

        let mut vaults: Vec<(String, Option<String>)> = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| upstream("backup", e))?;
            vaults.extend(page.backup_vault_list().iter().filter_map(|v| {
                v.backup_vault_name()
                    .map(|name| (name.to_string(), v.backup_vault_arn().map(str::to_string)))
            }));
        }

        let resources = lookup_each(
            NAMESPACE,
            vaults,
            |(name, _)| name.clone(),
            |(name, arn)| async move {
                let tags = self.vault_tags(arn).await?;
                if !filter.matches(&tags) {
                    return NimbusResult::Ok(None);
                }
                Ok(Some(
                    Resource::new(&name, RESOURCE_TYPE, &self.region)
                        .with_dimension("BackupVaultName", &name)
                        .with_tags(&tags),
                ))
            },
        )
        .await;

        debug!(count = resources.len(), "discovered backup vaults");
        Ok(resources)
    }
}
