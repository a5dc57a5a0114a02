//! Source-host API client
//!
//! Fetches per-repository metadata: the repository descriptor (for the
//! last-push timestamp), open issue/PR counts, and the latest release.
//!
//! Live lookups need an API token. When none is configured, or a project's
//! repository URL is not on the configured host, the aggregated summary
//! degrades to well-defined defaults instead of failing; that is an
//! expected operating mode, not an error.

use chrono::{DateTime, Utc};
use docportal_common::config::GitHubConfig;
use docportal_common::domain::time;
use docportal_common::domain::{GitHubIssueCount, GitHubRelease};
use docportal_common::{AppError, Result};
use serde::Deserialize;
use tracing::debug;

const PAGE_SIZE: usize = 100;

/// Aggregated source-host metadata for one repository.
#[derive(Debug, Clone)]
pub struct GitHubSummary {
    pub issues: GitHubIssueCount,
    pub release: Option<GitHubRelease>,
    /// Time of the latest push, or the caller-supplied fallback when the
    /// source host is unavailable.
    pub latest_commit: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RepoOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    owner: RepoOwner,
    #[serde(with = "time::datetime_utc")]
    pushed_at: DateTime<Utc>,
}

/// An item from the issues endpoint; pull requests carry a `pull_request`
/// key, plain issues do not.
#[derive(Debug, Deserialize)]
struct IssueResponse {
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    tag_name: String,
    #[serde(with = "time::datetime_utc")]
    published_at: DateTime<Utc>,
}

/// Source-host API client.
pub struct GitHubClient {
    http: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new(http: reqwest::Client, config: GitHubConfig) -> Self {
        Self { http, config }
    }

    /// Split a repository web URL into `(owner, repo)` by path segments,
    /// tolerating a trailing slash or `.git` suffix. `None` when the URL
    /// is not on the configured host.
    pub fn parse_repo_url(&self, repo_url: &str) -> Option<(String, String)> {
        let rest = repo_url.strip_prefix("https://")?;
        let mut segments = rest.split('/');
        let host = segments.next()?;
        if host != self.config.repo_host {
            return None;
        }
        let owner = segments.next()?.to_string();
        let repo = segments.next()?.trim_end_matches('/');
        let repo = repo.strip_suffix(".git").unwrap_or(repo).to_string();
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some((owner, repo))
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, url: &str, token: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .bearer_auth(token)
            .header("User-Agent", "docportal")
            .header("Accept", "application/vnd.github+json")
    }

    async fn get_repository(&self, token: &str, owner: &str, repo: &str) -> Result<RepoResponse> {
        let url = self.api_url(&format!("/repos/{owner}/{repo}"));
        let response = self.request(&url, token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamHttp {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.json().await?)
    }

    /// Count open issues and PRs by paginating the issues endpoint, which
    /// returns both kinds of item.
    async fn count_open_issues(&self, token: &str, owner: &str, repo: &str) -> Result<(u32, u32)> {
        let url = self.api_url(&format!("/repos/{owner}/{repo}/issues"));
        let per_page = PAGE_SIZE.to_string();
        let mut issue_count = 0u32;
        let mut pr_count = 0u32;
        let mut page = 1u32;

        loop {
            let page_number = page.to_string();
            let response = self
                .request(&url, token)
                .query(&[
                    ("state", "open"),
                    ("per_page", per_page.as_str()),
                    ("page", page_number.as_str()),
                ])
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(AppError::UpstreamHttp {
                    status: status.as_u16(),
                    url,
                });
            }

            let items: Vec<IssueResponse> = response.json().await?;
            let item_count = items.len();
            for item in items {
                if item.pull_request.is_some() {
                    pr_count += 1;
                } else {
                    issue_count += 1;
                }
            }

            if item_count < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok((issue_count, pr_count))
    }

    /// The latest published release, or `None` when the repository has
    /// none (the endpoint answers 404 in that case).
    async fn latest_release(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<Option<GitHubRelease>> {
        let url = self.api_url(&format!("/repos/{owner}/{repo}/releases/latest"));
        let response = self.request(&url, token).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AppError::UpstreamHttp {
                status: status.as_u16(),
                url,
            });
        }

        let release: ReleaseResponse = response.json().await?;
        Ok(Some(GitHubRelease {
            tag: release.tag_name,
            date_created: release.published_at,
        }))
    }

    /// Aggregate the source-host metadata for a repository.
    ///
    /// Degrades to zero counts, derived URLs, no release, and the supplied
    /// fallback timestamp when no token is configured or the URL is not on
    /// the configured host.
    pub async fn summary(
        &self,
        repo_url: &str,
        default_commit_datetime: DateTime<Utc>,
    ) -> Result<GitHubSummary> {
        let available = self
            .config
            .token
            .as_deref()
            .and_then(|token| self.parse_repo_url(repo_url).map(|ids| (token, ids)));

        let Some((token, (owner, repo))) = available else {
            debug!(repo_url = %repo_url, "Source host unavailable for repository; using defaults");
            return Ok(GitHubSummary {
                issues: GitHubIssueCount::unavailable(repo_url),
                release: None,
                latest_commit: default_commit_datetime,
            });
        };

        let repository = self.get_repository(token, &owner, &repo).await?;
        let (open_issues, open_prs) = self.count_open_issues(token, &owner, &repo).await?;
        let release = self.latest_release(token, &owner, &repo).await?;

        let web_url = format!(
            "https://{}/{}/{}",
            self.config.repo_host, repository.owner.login, repository.name
        );
        debug!(
            repo_url = %repo_url,
            open_issues,
            open_prs,
            release = release.as_ref().map(|r| r.tag.as_str()),
            "Got source-host metadata"
        );

        Ok(GitHubSummary {
            issues: GitHubIssueCount::counted(&web_url, open_issues, open_prs),
            release,
            latest_commit: repository.pushed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn client(token: Option<&str>) -> GitHubClient {
        GitHubClient::new(
            reqwest::Client::new(),
            GitHubConfig {
                token: token.map(str::to_string),
                ..GitHubConfig::default()
            },
        )
    }

    #[test]
    fn test_parse_repo_url() {
        let c = client(None);
        assert_eq!(
            c.parse_repo_url("https://github.com/SPHEREx/ssdc-ms-001"),
            Some(("SPHEREx".to_string(), "ssdc-ms-001".to_string()))
        );
        assert_eq!(
            c.parse_repo_url("https://github.com/SPHEREx/ssdc-ms-001.git"),
            Some(("SPHEREx".to_string(), "ssdc-ms-001".to_string()))
        );
        assert_eq!(
            c.parse_repo_url("https://github.com/SPHEREx/a-rather-long-repository-name/"),
            Some(("SPHEREx".to_string(), "a-rather-long-repository-name".to_string()))
        );
    }

    #[test]
    fn test_parse_repo_url_rejects_foreign_or_partial_urls() {
        let c = client(None);
        assert_eq!(c.parse_repo_url("https://gitlab.com/SPHEREx/repo"), None);
        assert_eq!(c.parse_repo_url("https://github.com/SPHEREx"), None);
        assert_eq!(c.parse_repo_url("git@github.com:SPHEREx/repo.git"), None);
    }

    #[tokio::test]
    async fn test_summary_degrades_without_token() {
        let c = client(None);
        let fallback = Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap();
        let summary = c
            .summary("https://github.com/SPHEREx/ssdc-ms-001", fallback)
            .await
            .unwrap();

        assert_eq!(summary.issues.open_issue_count, 0);
        assert_eq!(summary.issues.open_pr_count, 0);
        assert_eq!(
            summary.issues.issue_url,
            "https://github.com/SPHEREx/ssdc-ms-001/issues"
        );
        assert!(summary.release.is_none());
        assert_eq!(summary.latest_commit, fallback);
    }

    #[tokio::test]
    async fn test_summary_degrades_for_foreign_host() {
        let c = client(Some("token"));
        let fallback = Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap();
        let summary = c
            .summary("https://example.org/internal/repo", fallback)
            .await
            .unwrap();
        assert_eq!(summary.issues.open_issue_count, 0);
        assert_eq!(summary.latest_commit, fallback);
    }
}
