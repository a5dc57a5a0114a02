//! Seed dataset loader
//!
//! Populates the category store from a static YAML dataset (one list per
//! category code), bypassing all three source clients. Used when live
//! aggregation is not configured, and for local development. A parse
//! failure is fatal at load time; there is no partial load.

use crate::errors::IngestError;
use chrono::{DateTime, Utc};
use docportal_common::domain::time;
use docportal_common::domain::{
    Category, DocumentCommon, DpDocument, GitHubIssueCount, GitHubRelease, IfDocument,
    MsDocument, OpDocument, PmDocument, TnDocument, TrDocument,
};
use docportal_common::{ProjectRepository, DEFAULT_ORGANIZATION};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Fields shared by every category list entry in the dataset file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedCommon {
    /// Document handle, e.g. `SSDC-MS-001`. The lowercased handle is the
    /// project id.
    pub handle: String,

    pub title: String,

    /// Root HTML URL of the published document.
    pub url: String,

    pub github_url: String,

    /// Open issue count.
    pub issues: u32,

    /// Open PR count.
    pub prs: u32,

    /// Latest release tag, when one exists.
    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default, with = "time::datetime_utc_opt")]
    pub tag_date: Option<DateTime<Utc>>,

    #[serde(with = "time::datetime_utc")]
    pub commit_date: DateTime<Utc>,

    pub ssdc_author: String,
}

impl SeedCommon {
    fn document_common(&self, category: Category) -> DocumentCommon {
        // A release needs both halves; entries with only a tag (or only a
        // date) count as unreleased
        let github_release = match (&self.tag, self.tag_date) {
            (Some(tag), Some(date)) => Some(GitHubRelease {
                tag: tag.clone(),
                date_created: date,
            }),
            _ => None,
        };

        DocumentCommon {
            url: self.url.clone(),
            title: self.title.clone(),
            project_id: self.handle.to_lowercase(),
            organization_id: DEFAULT_ORGANIZATION.to_string(),
            github_issues: GitHubIssueCount::counted(&self.github_url, self.issues, self.prs),
            github_url: self.github_url.clone(),
            latest_commit_datetime: self.commit_date,
            github_release,
            series: category.series().to_string(),
            handle: self.handle.clone(),
            ssdc_author_name: self.ssdc_author.clone(),
        }
    }
}

/// The `ssdc-ms` list entries.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedMs {
    #[serde(flatten)]
    pub common: SeedCommon,
    pub project_author: String,
    #[serde(default)]
    pub approval: Option<String>,
    pub difficulty: String,
    pub pipeline_level: u32,
    pub diagram_index: u32,
}

impl SeedMs {
    fn to_document(&self) -> MsDocument {
        MsDocument {
            common: self.common.document_common(Category::SsdcMs),
            project_contact_name: self.project_author.clone(),
            diagram_index: self.diagram_index,
            pipeline_level: self.pipeline_level,
            approval_str: self.approval.clone(),
            difficulty: self.difficulty.clone(),
        }
    }
}

/// The `ssdc-pm` list entries.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedPm {
    #[serde(flatten)]
    pub common: SeedCommon,
    #[serde(default)]
    pub approval: Option<String>,
}

impl SeedPm {
    fn to_document(&self) -> PmDocument {
        PmDocument {
            common: self.common.document_common(Category::SsdcPm),
            approval_str: self.approval.clone(),
        }
    }
}

/// The `ssdc-if` list entries.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedIf {
    #[serde(flatten)]
    pub common: SeedCommon,
    #[serde(default)]
    pub approval: Option<String>,
    pub interface_partner: String,
}

impl SeedIf {
    fn to_document(&self) -> IfDocument {
        IfDocument {
            common: self.common.document_common(Category::SsdcIf),
            approval_str: self.approval.clone(),
            interface_partner_name: self.interface_partner.clone(),
        }
    }
}

/// The `ssdc-dp` list entries.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedDp {
    #[serde(flatten)]
    pub common: SeedCommon,
    #[serde(default)]
    pub approval: Option<String>,
}

impl SeedDp {
    fn to_document(&self) -> DpDocument {
        DpDocument {
            common: self.common.document_common(Category::SsdcDp),
            approval_str: self.approval.clone(),
        }
    }
}

/// The `ssdc-tr` list entries.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedTr {
    #[serde(flatten)]
    pub common: SeedCommon,
    #[serde(default)]
    pub approval: Option<String>,
    #[serde(default)]
    pub va_doors_id: Option<String>,
    #[serde(default)]
    pub req_doors_id: Option<String>,
    #[serde(default)]
    pub ipac_jira_id: Option<String>,
}

impl SeedTr {
    fn to_document(&self) -> TrDocument {
        TrDocument {
            common: self.common.document_common(Category::SsdcTr),
            approval_str: self.approval.clone(),
            va_doors_id: self.va_doors_id.clone(),
            req_doors_id: self.req_doors_id.clone(),
            ipac_jira_id: self.ipac_jira_id.clone(),
        }
    }
}

/// The `ssdc-tn` list entries.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedTn {
    #[serde(flatten)]
    pub common: SeedCommon,
}

impl SeedTn {
    fn to_document(&self) -> TnDocument {
        TnDocument {
            common: self.common.document_common(Category::SsdcTn),
        }
    }
}

/// The `ssdc-op` list entries.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedOp {
    #[serde(flatten)]
    pub common: SeedCommon,
}

impl SeedOp {
    fn to_document(&self) -> OpDocument {
        OpDocument {
            common: self.common.document_common(Category::SsdcOp),
        }
    }
}

/// The parsed dataset file: one list per category code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(rename = "ssdc-ms", default)]
    pub ssdc_ms: Vec<SeedMs>,

    #[serde(rename = "ssdc-pm", default)]
    pub ssdc_pm: Vec<SeedPm>,

    #[serde(rename = "ssdc-if", default)]
    pub ssdc_if: Vec<SeedIf>,

    #[serde(rename = "ssdc-dp", default)]
    pub ssdc_dp: Vec<SeedDp>,

    #[serde(rename = "ssdc-tr", default)]
    pub ssdc_tr: Vec<SeedTr>,

    #[serde(rename = "ssdc-tn", default)]
    pub ssdc_tn: Vec<SeedTn>,

    #[serde(rename = "ssdc-op", default)]
    pub ssdc_op: Vec<SeedOp>,
}

impl SeedData {
    /// Parse the dataset file.
    pub fn from_yaml_file(path: &Path) -> Result<SeedData, IngestError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            IngestError::Seed(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
            .map_err(|e| IngestError::Seed(format!("cannot parse '{}': {}", path.display(), e)))
    }

    fn from_yaml(text: &str) -> Result<SeedData, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    fn len(&self) -> usize {
        self.ssdc_ms.len()
            + self.ssdc_pm.len()
            + self.ssdc_if.len()
            + self.ssdc_dp.len()
            + self.ssdc_tr.len()
            + self.ssdc_tn.len()
            + self.ssdc_op.len()
    }

    /// Upsert every entry into the repository.
    pub async fn bootstrap(&self, repo: &ProjectRepository) -> Result<(), IngestError> {
        for entry in &self.ssdc_ms {
            repo.ssdc_ms.upsert(&entry.to_document()).await?;
        }
        for entry in &self.ssdc_pm {
            repo.ssdc_pm.upsert(&entry.to_document()).await?;
        }
        for entry in &self.ssdc_if {
            repo.ssdc_if.upsert(&entry.to_document()).await?;
        }
        for entry in &self.ssdc_dp {
            repo.ssdc_dp.upsert(&entry.to_document()).await?;
        }
        for entry in &self.ssdc_tr {
            repo.ssdc_tr.upsert(&entry.to_document()).await?;
        }
        for entry in &self.ssdc_tn {
            repo.ssdc_tn.upsert(&entry.to_document()).await?;
        }
        for entry in &self.ssdc_op {
            repo.ssdc_op.upsert(&entry.to_document()).await?;
        }

        info!(document_count = self.len(), "Seed dataset loaded into store");
        Ok(())
    }
}
