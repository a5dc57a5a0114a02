//! Full-refresh orchestration
//!
//! One run: fetch the organization record once, resolve the metadata
//! bucket, fetch the project list once, then classify/fetch/normalize/
//! upsert each project. A metadata failure for one project is logged and
//! skipped; the run continues. Anything else aborts the run.
//!
//! Runs are idempotent: upserts replace whole documents by natural key,
//! so re-running against unchanged upstream data leaves the store
//! identical.

use crate::bucket::{MetadataBucket, MetadataSource};
use crate::errors::IngestError;
use crate::github::GitHubClient;
use crate::ltd::{LtdClient, LtdProject};
use crate::normalize::{
    normalize_dp, normalize_if, normalize_ms, normalize_op, normalize_pm, normalize_tn,
    normalize_tr, ProjectContext,
};
use docportal_common::config::AppConfig;
use docportal_common::{AppError, Category, ProjectRepository, DEFAULT_METADATA_BUCKET};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome counters for one refresh run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RefreshOutcome {
    /// Projects fetched, normalized, and upserted.
    pub ingested: usize,

    /// Projects skipped because their metadata object failed.
    pub skipped_metadata: usize,

    /// Projects whose slug matched no known category.
    pub unclassified: usize,
}

/// Drives full-refresh passes over the project list.
pub struct RefreshService {
    repo: Arc<ProjectRepository>,
    ltd: LtdClient,
    github: GitHubClient,
    http: reqwest::Client,
    config: AppConfig,
}

impl RefreshService {
    pub fn new(repo: Arc<ProjectRepository>, config: AppConfig, http: reqwest::Client) -> Self {
        Self {
            ltd: LtdClient::new(http.clone(), config.ltd.clone()),
            github: GitHubClient::new(http.clone(), config.github.clone()),
            repo,
            http,
            config,
        }
    }

    /// Run one full refresh pass against the live sources.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RefreshOutcome, IngestError> {
        // Live ingestion cannot start without the object-store key pair
        let (access_key_id, secret_access_key) =
            self.config.s3.credentials().ok_or_else(|| {
                AppError::Configuration {
                    message: "Object-store access key id and secret are required to \
                              refresh metadata from live sources"
                        .to_string(),
                }
            })?;

        let org = self.ltd.get_organization().await?;
        let bucket = MetadataBucket::new(
            org.s3_bucket
                .clone()
                .unwrap_or_else(|| DEFAULT_METADATA_BUCKET.to_string()),
            org.aws_region
                .clone()
                .unwrap_or_else(|| self.config.s3.region.clone()),
            access_key_id,
            secret_access_key,
            self.http.clone(),
        );

        let projects = self.ltd.get_projects().await?;
        info!(
            organization = %org.slug,
            project_count = projects.len(),
            "Starting refresh run"
        );

        let outcome = self
            .ingest_projects(&bucket, &projects, &org.slug, cancel)
            .await?;
        info!(
            ingested = outcome.ingested,
            skipped_metadata = outcome.skipped_metadata,
            unclassified = outcome.unclassified,
            "Refresh run complete"
        );
        Ok(outcome)
    }

    /// Ingest each project against the given metadata source.
    ///
    /// Per-project metadata failures are isolated: logged with the slug
    /// and reason, counted, and the loop continues. The cancellation token
    /// is honored between projects, so an aborted run never leaves a
    /// half-written document behind.
    pub async fn ingest_projects<M: MetadataSource>(
        &self,
        metadata: &M,
        projects: &[LtdProject],
        organization_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RefreshOutcome, IngestError> {
        let mut outcome = RefreshOutcome::default();

        for project in projects {
            if cancel.is_cancelled() {
                info!(
                    ingested = outcome.ingested,
                    "Refresh run cancelled; stopping at project boundary"
                );
                break;
            }

            let Some(category) = Category::from_slug(&project.slug) else {
                debug!(slug = %project.slug, "Skipping project with unclassified slug");
                outcome.unclassified += 1;
                continue;
            };

            match self
                .ingest_project(metadata, project, category, organization_id)
                .await
            {
                Ok(()) => outcome.ingested += 1,
                Err(IngestError::Metadata { slug, reason, .. }) => {
                    warn!(
                        slug = %slug,
                        reason = %reason,
                        "Could not ingest metadata for project"
                    );
                    outcome.skipped_metadata += 1;
                }
                Err(other) => return Err(other),
            }
        }

        Ok(outcome)
    }

    async fn ingest_project<M: MetadataSource>(
        &self,
        metadata: &M,
        project: &LtdProject,
        category: Category,
        organization_id: &str,
    ) -> Result<(), IngestError> {
        let raw = metadata.fetch(&project.slug).await?;
        let ctx = ProjectContext {
            project_id: project.slug.clone(),
            organization_id: organization_id.to_string(),
        };
        let fallback_commit = project.default_edition.date_rebuilt;

        match category {
            Category::SsdcMs => {
                let meta: crate::metadata::MsMeta = parse_meta(raw, &project.slug)?;
                let github = self
                    .github
                    .summary(&meta.common.repository_url, fallback_commit)
                    .await?;
                let doc = normalize_ms(&meta, &github, &ctx)?;
                self.repo.ssdc_ms.upsert(&doc).await?;
            }
            Category::SsdcPm => {
                let meta: crate::metadata::CommonMeta = parse_meta(raw, &project.slug)?;
                let github = self
                    .github
                    .summary(&meta.repository_url, fallback_commit)
                    .await?;
                let doc = normalize_pm(&meta, &github, &ctx);
                self.repo.ssdc_pm.upsert(&doc).await?;
            }
            Category::SsdcIf => {
                let meta: crate::metadata::IfMeta = parse_meta(raw, &project.slug)?;
                let github = self
                    .github
                    .summary(&meta.common.repository_url, fallback_commit)
                    .await?;
                let doc = normalize_if(&meta, &github, &ctx);
                self.repo.ssdc_if.upsert(&doc).await?;
            }
            Category::SsdcDp => {
                let meta: crate::metadata::CommonMeta = parse_meta(raw, &project.slug)?;
                let github = self
                    .github
                    .summary(&meta.repository_url, fallback_commit)
                    .await?;
                let doc = normalize_dp(&meta, &github, &ctx);
                self.repo.ssdc_dp.upsert(&doc).await?;
            }
            Category::SsdcTr => {
                let meta: crate::metadata::TrMeta = parse_meta(raw, &project.slug)?;
                let github = self
                    .github
                    .summary(&meta.common.repository_url, fallback_commit)
                    .await?;
                let doc = normalize_tr(&meta, &github, &ctx);
                self.repo.ssdc_tr.upsert(&doc).await?;
            }
            Category::SsdcTn => {
                let meta: crate::metadata::CommonMeta = parse_meta(raw, &project.slug)?;
                let github = self
                    .github
                    .summary(&meta.repository_url, fallback_commit)
                    .await?;
                let doc = normalize_tn(&meta, &github, &ctx);
                self.repo.ssdc_tn.upsert(&doc).await?;
            }
            Category::SsdcOp => {
                let meta: crate::metadata::CommonMeta = parse_meta(raw, &project.slug)?;
                let github = self
                    .github
                    .summary(&meta.repository_url, fallback_commit)
                    .await?;
                let doc = normalize_op(&meta, &github, &ctx);
                self.repo.ssdc_op.upsert(&doc).await?;
            }
        }

        Ok(())
    }
}

fn parse_meta<T: DeserializeOwned>(raw: Value, slug: &str) -> Result<T, IngestError> {
    serde_json::from_value(raw).map_err(|e| {
        IngestError::metadata_with_source(slug, "metadata object has unexpected shape", e)
    })
}
