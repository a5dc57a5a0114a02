//! Domain models for documentation project metadata
//!
//! Every document category shares one [`DocumentCommon`] block (embedded and
//! serde-flattened in each variant) instead of an inheritance chain. The
//! [`Document`] trait exposes the shared read surface the store and the
//! gateway need.

mod documents;
pub mod time;

pub use documents::{
    DpDocument, IfDocument, MsDocument, OpDocument, PmDocument, TnDocument, TrDocument,
};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

/// The seven fixed document categories.
///
/// Classification, store namespacing, and display series are all resolved
/// through this enum so that adding a category is a one-place change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Module Specification
    SsdcMs,
    /// Project Management
    SsdcPm,
    /// Interface
    SsdcIf,
    /// Data Product
    SsdcDp,
    /// Test Report
    SsdcTr,
    /// Technical Note
    SsdcTn,
    /// Operations Note
    SsdcOp,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::SsdcMs,
        Category::SsdcPm,
        Category::SsdcIf,
        Category::SsdcDp,
        Category::SsdcTr,
        Category::SsdcTn,
        Category::SsdcOp,
    ];

    /// The category code used in slugs and the seed dataset, e.g. `ssdc-ms`.
    pub fn code(&self) -> &'static str {
        match self {
            Category::SsdcMs => "ssdc-ms",
            Category::SsdcPm => "ssdc-pm",
            Category::SsdcIf => "ssdc-if",
            Category::SsdcDp => "ssdc-dp",
            Category::SsdcTr => "ssdc-tr",
            Category::SsdcTn => "ssdc-tn",
            Category::SsdcOp => "ssdc-op",
        }
    }

    /// The store key namespace for this category, e.g. `ssdc_ms`.
    pub fn namespace(&self) -> &'static str {
        match self {
            Category::SsdcMs => "ssdc_ms",
            Category::SsdcPm => "ssdc_pm",
            Category::SsdcIf => "ssdc_if",
            Category::SsdcDp => "ssdc_dp",
            Category::SsdcTr => "ssdc_tr",
            Category::SsdcTn => "ssdc_tn",
            Category::SsdcOp => "ssdc_op",
        }
    }

    /// The display series for documents in this category, e.g. `SSDC-MS`.
    pub fn series(&self) -> &'static str {
        match self {
            Category::SsdcMs => "SSDC-MS",
            Category::SsdcPm => "SSDC-PM",
            Category::SsdcIf => "SSDC-IF",
            Category::SsdcDp => "SSDC-DP",
            Category::SsdcTr => "SSDC-TR",
            Category::SsdcTn => "SSDC-TN",
            Category::SsdcOp => "SSDC-OP",
        }
    }

    /// Classify a docs-host project slug by its category prefix.
    ///
    /// Slugs whose prefix matches no known category return `None`; callers
    /// skip those projects.
    pub fn from_slug(slug: &str) -> Option<Category> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| slug.starts_with(c.code()))
    }

    /// Resolve an exact category code, e.g. from a request path.
    pub fn from_code(code: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.code() == code)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Summary info about open issues and pull requests on the source repository.
///
/// Always fully populated: when the source host is unavailable the
/// [`unavailable`](GitHubIssueCount::unavailable) default is stored instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubIssueCount {
    pub open_issue_count: u32,
    pub open_pr_count: u32,
    pub issue_url: String,
    pub pr_url: String,
}

impl GitHubIssueCount {
    /// The degraded default: zero counts with URLs derived from the
    /// repository URL.
    pub fn unavailable(repo_url: &str) -> Self {
        let base = repo_url.trim_end_matches('/');
        Self {
            open_issue_count: 0,
            open_pr_count: 0,
            issue_url: format!("{base}/issues"),
            pr_url: format!("{base}/pulls"),
        }
    }

    pub fn counted(repo_url: &str, open_issue_count: u32, open_pr_count: u32) -> Self {
        Self {
            open_issue_count,
            open_pr_count,
            ..Self::unavailable(repo_url)
        }
    }
}

/// Summary of the latest release on the source repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubRelease {
    /// Git tag.
    pub tag: String,
    /// Time (UTC) when the release was published.
    #[serde(with = "time::datetime_utc")]
    pub date_created: DateTime<Utc>,
}

/// Fields shared by every document category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentCommon {
    /// Root HTML URL of the published document.
    pub url: String,

    /// The title of the documentation project.
    pub title: String,

    /// ID of the project in the docs-host API; unique within the
    /// organization and the store key within a category.
    pub project_id: String,

    /// ID of the organization in the docs-host API.
    pub organization_id: String,

    /// URL of the project's source repository.
    pub github_url: String,

    /// Summary info about open issues and PRs.
    pub github_issues: GitHubIssueCount,

    /// Time (UTC) of the latest push to the default branch.
    #[serde(with = "time::datetime_utc")]
    pub latest_commit_datetime: DateTime<Utc>,

    /// The latest release, or `None` if no release has been published.
    pub github_release: Option<GitHubRelease>,

    /// The document series; the handle's prefix, e.g. `SSDC-MS`.
    pub series: String,

    /// The document's identifier, e.g. `SSDC-MS-001`.
    pub handle: String,

    /// Name of the lead SSDC author.
    pub ssdc_author_name: String,
}

/// Shared read surface over every category document.
///
/// Store values are bound by this trait: it provides the natural key and the
/// category namespace, plus the derived date strings pages sort and display
/// by.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// The shared field block.
    fn common(&self) -> &DocumentCommon;

    /// The category this document type belongs to.
    fn category() -> Category;

    /// The store key within the category.
    fn project_id(&self) -> &str {
        &self.common().project_id
    }

    fn handle(&self) -> &str {
        &self.common().handle
    }

    /// Latest-commit date formatted for display, e.g. `2024-01-31`.
    fn commit_date_str(&self) -> String {
        self.common()
            .latest_commit_datetime
            .format("%Y-%m-%d")
            .to_string()
    }

    /// Latest-commit timestamp as an RFC 3339 string that sorts
    /// lexicographically.
    fn commit_date_sortable(&self) -> String {
        self.common()
            .latest_commit_datetime
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_slug() {
        assert_eq!(Category::from_slug("ssdc-ms-001"), Some(Category::SsdcMs));
        assert_eq!(Category::from_slug("ssdc-tr-042"), Some(Category::SsdcTr));
        assert_eq!(Category::from_slug("ssdc-op-007"), Some(Category::SsdcOp));
        // Unclassified prefixes are not an error, just unhandled
        assert_eq!(Category::from_slug("rtd-legacy-001"), None);
        assert_eq!(Category::from_slug(""), None);
    }

    #[test]
    fn test_category_codes_and_namespaces() {
        for category in Category::ALL {
            assert_eq!(category.namespace(), category.code().replace('-', "_"));
            assert_eq!(
                category.series(),
                category.code().to_uppercase().as_str()
            );
            assert_eq!(Category::from_code(category.code()), Some(category));
        }
        assert_eq!(Category::from_code("ssdc"), None);
    }

    #[test]
    fn test_issue_count_unavailable() {
        let issues = GitHubIssueCount::unavailable("https://github.com/SPHEREx/ssdc-ms-001/");
        assert_eq!(issues.open_issue_count, 0);
        assert_eq!(issues.open_pr_count, 0);
        assert_eq!(
            issues.issue_url,
            "https://github.com/SPHEREx/ssdc-ms-001/issues"
        );
        assert_eq!(issues.pr_url, "https://github.com/SPHEREx/ssdc-ms-001/pulls");
    }
}
