//! Metadata normalization
//!
//! Pure mapping functions, one per category. Each takes the raw category
//! metadata, the aggregated source-host summary, and the ambient project/
//! organization context, and produces exactly one category document.

use crate::errors::IngestError;
use crate::github::GitHubSummary;
use crate::metadata::{CommonMeta, IfMeta, MetaApproval, MetaAuthor, MsMeta, TrMeta};
use docportal_common::domain::{
    DocumentCommon, DpDocument, IfDocument, MsDocument, OpDocument, PmDocument, TnDocument,
    TrDocument,
};

/// Role tag of the lead SSDC author.
pub const SSDC_LEAD_ROLE: &str = "IPAC Lead";

/// Role tag of the project-side contact.
pub const PROJECT_LEAD_ROLE: &str = "SPHEREx Lead";

/// Ambient descriptors for the project being normalized.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// The docs-host project slug; the store key within the category.
    pub project_id: String,

    /// The docs-host organization slug.
    pub organization_id: String,
}

/// Name of the first author carrying the given role tag, or empty string
/// when none matches.
pub fn author_with_role(authors: &[MetaAuthor], role: &str) -> String {
    authors
        .iter()
        .find(|a| a.role.as_deref() == Some(role))
        .map(|a| a.name.clone())
        .unwrap_or_default()
}

/// Render an approval record as `"{date}, {name}"` for display.
pub fn format_approval(approval: Option<&MetaApproval>) -> Option<String> {
    approval.map(|a| format!("{}, {}", a.date, a.name))
}

fn common_fields(
    meta: &CommonMeta,
    github: &GitHubSummary,
    ctx: &ProjectContext,
) -> DocumentCommon {
    DocumentCommon {
        url: meta.canonical_url.clone(),
        title: meta.title.clone(),
        project_id: ctx.project_id.clone(),
        organization_id: ctx.organization_id.clone(),
        github_url: meta.repository_url.clone(),
        github_issues: github.issues.clone(),
        latest_commit_datetime: github.latest_commit,
        github_release: github.release.clone(),
        series: meta.document_handle_prefix.clone(),
        handle: meta.identifier.clone(),
        ssdc_author_name: author_with_role(&meta.authors, SSDC_LEAD_ROLE),
    }
}

pub fn normalize_ms(
    meta: &MsMeta,
    github: &GitHubSummary,
    ctx: &ProjectContext,
) -> Result<MsDocument, IngestError> {
    let pipeline_level = meta
        .pipeline_level
        .as_level()
        .map_err(|reason| IngestError::metadata(&ctx.project_id, reason))?;

    Ok(MsDocument {
        common: common_fields(&meta.common, github, ctx),
        project_contact_name: author_with_role(&meta.common.authors, PROJECT_LEAD_ROLE),
        diagram_index: meta.diagram_index,
        pipeline_level,
        approval_str: format_approval(meta.common.approval.as_ref()),
        difficulty: meta.difficulty.clone(),
    })
}

pub fn normalize_pm(meta: &CommonMeta, github: &GitHubSummary, ctx: &ProjectContext) -> PmDocument {
    PmDocument {
        approval_str: format_approval(meta.approval.as_ref()),
        common: common_fields(meta, github, ctx),
    }
}

pub fn normalize_if(meta: &IfMeta, github: &GitHubSummary, ctx: &ProjectContext) -> IfDocument {
    IfDocument {
        approval_str: format_approval(meta.common.approval.as_ref()),
        interface_partner_name: meta.interface_partner.clone(),
        common: common_fields(&meta.common, github, ctx),
    }
}

pub fn normalize_dp(meta: &CommonMeta, github: &GitHubSummary, ctx: &ProjectContext) -> DpDocument {
    DpDocument {
        approval_str: format_approval(meta.approval.as_ref()),
        common: common_fields(meta, github, ctx),
    }
}

pub fn normalize_tr(meta: &TrMeta, github: &GitHubSummary, ctx: &ProjectContext) -> TrDocument {
    TrDocument {
        approval_str: format_approval(meta.common.approval.as_ref()),
        va_doors_id: meta.va_doors_id.clone(),
        req_doors_id: meta.req_doors_id.clone(),
        ipac_jira_id: meta.ipac_jira_id.clone(),
        common: common_fields(&meta.common, github, ctx),
    }
}

pub fn normalize_tn(meta: &CommonMeta, github: &GitHubSummary, ctx: &ProjectContext) -> TnDocument {
    TnDocument {
        common: common_fields(meta, github, ctx),
    }
}

pub fn normalize_op(meta: &CommonMeta, github: &GitHubSummary, ctx: &ProjectContext) -> OpDocument {
    OpDocument {
        common: common_fields(meta, github, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docportal_common::domain::{Document, GitHubIssueCount};
    use chrono::{TimeZone, Utc};

    fn authors() -> Vec<MetaAuthor> {
        vec![
            MetaAuthor {
                name: "First Author".to_string(),
                role: None,
            },
            MetaAuthor {
                name: "A. Lead".to_string(),
                role: Some(SSDC_LEAD_ROLE.to_string()),
            },
            MetaAuthor {
                name: "B. Contact".to_string(),
                role: Some(PROJECT_LEAD_ROLE.to_string()),
            },
        ]
    }

    fn common_meta() -> CommonMeta {
        CommonMeta {
            title: "Spectral Extraction Module".to_string(),
            identifier: "SSDC-MS-003".to_string(),
            document_handle_prefix: "SSDC-MS".to_string(),
            canonical_url: "https://spherex-docs.ipac.caltech.edu/ssdc-ms-003".to_string(),
            repository_url: "https://github.com/SPHEREx/ssdc-ms-003".to_string(),
            authors: authors(),
            approval: Some(MetaApproval {
                date: "2024-01-15".to_string(),
                name: "C. Approver".to_string(),
            }),
        }
    }

    fn summary() -> GitHubSummary {
        GitHubSummary {
            issues: GitHubIssueCount::unavailable("https://github.com/SPHEREx/ssdc-ms-003"),
            release: None,
            latest_commit: Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap(),
        }
    }

    fn ctx() -> ProjectContext {
        ProjectContext {
            project_id: "ssdc-ms-003".to_string(),
            organization_id: "spherex".to_string(),
        }
    }

    #[test]
    fn test_author_with_role() {
        assert_eq!(author_with_role(&authors(), SSDC_LEAD_ROLE), "A. Lead");
        assert_eq!(author_with_role(&authors(), PROJECT_LEAD_ROLE), "B. Contact");
        assert_eq!(author_with_role(&authors(), "Editor"), "");
        assert_eq!(author_with_role(&[], SSDC_LEAD_ROLE), "");
    }

    #[test]
    fn test_format_approval() {
        let approval = MetaApproval {
            date: "2024-01-15".to_string(),
            name: "C. Approver".to_string(),
        };
        assert_eq!(
            format_approval(Some(&approval)),
            Some("2024-01-15, C. Approver".to_string())
        );
        assert_eq!(format_approval(None), None);
    }

    #[test]
    fn test_normalize_ms_maps_all_fields() {
        let meta = MsMeta {
            common: common_meta(),
            pipeline_level: crate::metadata::PipelineLevel::Tagged("L2".to_string()),
            diagram_index: 7,
            difficulty: "High".to_string(),
        };
        let doc = normalize_ms(&meta, &summary(), &ctx()).unwrap();

        assert_eq!(doc.project_id(), "ssdc-ms-003");
        assert_eq!(doc.handle(), "SSDC-MS-003");
        assert_eq!(doc.common.series, "SSDC-MS");
        assert_eq!(doc.common.ssdc_author_name, "A. Lead");
        assert_eq!(doc.project_contact_name, "B. Contact");
        assert_eq!(doc.pipeline_level, 2);
        assert_eq!(doc.diagram_ref(), "L2.7");
        assert_eq!(
            doc.approval_str.as_deref(),
            Some("2024-01-15, C. Approver")
        );
    }

    #[test]
    fn test_normalize_ms_rejects_bad_pipeline_level() {
        let meta = MsMeta {
            common: common_meta(),
            pipeline_level: crate::metadata::PipelineLevel::Tagged("level two".to_string()),
            diagram_index: 7,
            difficulty: "High".to_string(),
        };
        let err = normalize_ms(&meta, &summary(), &ctx()).unwrap_err();
        match err {
            IngestError::Metadata { slug, .. } => assert_eq!(slug, "ssdc-ms-003"),
            other => panic!("expected metadata error, got {other:?}"),
        }
    }

    #[test]
    fn test_normalize_tn_has_no_extras() {
        let doc = normalize_tn(&common_meta(), &summary(), &ctx());
        assert_eq!(doc.common.handle, "SSDC-MS-003");
        assert_eq!(
            doc.common.latest_commit_datetime,
            Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap()
        );
    }
}
