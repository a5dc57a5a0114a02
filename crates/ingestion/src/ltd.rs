//! Docs-host (LTD) API client
//!
//! Read-only access to the project and organization records of the
//! documentation hosting service. Every call authenticates with a token
//! obtained from `GET /token` via a username/password exchange; the token
//! is cached for its validity window in a mutex-guarded entry, and the
//! mutex is held across the exchange so concurrent refreshes collapse to
//! one in-flight request.

use chrono::{DateTime, Utc};
use docportal_common::config::LtdConfig;
use docportal_common::domain::time;
use docportal_common::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// The edition resource, trimmed to the fields the portal consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct LtdEdition {
    /// The web URL for this edition.
    pub published_url: String,

    /// The date when the associated build was last updated (UTC).
    ///
    /// Also serves as the fallback commit timestamp when the source host
    /// is unavailable for a project.
    #[serde(with = "time::datetime_utc")]
    pub date_rebuilt: DateTime<Utc>,
}

/// The project resource.
#[derive(Debug, Clone, Deserialize)]
pub struct LtdProject {
    /// URL/path-safe identifier for this project (unique within an
    /// organization).
    pub slug: String,

    /// Title of this project.
    pub title: String,

    /// URL where this project's default edition is published on the web.
    pub published_url: String,

    /// URL of the associated source repository.
    pub source_repo_url: String,

    /// The default edition.
    pub default_edition: LtdEdition,
}

/// The organization resource.
#[derive(Debug, Clone, Deserialize)]
pub struct LtdOrganization {
    /// Identifier for this organization in the API.
    pub slug: String,

    /// Presentational name of this organization.
    pub title: String,

    /// Name of the S3 bucket hosting builds, when declared.
    #[serde(default)]
    pub s3_bucket: Option<String>,

    /// AWS region of the bucket. Not declared by the current API; the
    /// configured region is used when absent.
    #[serde(default)]
    pub aws_region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now()
    }
}

/// Docs-host API client with a time-bounded auth-token cache.
pub struct LtdClient {
    http: reqwest::Client,
    config: LtdConfig,
    token: Mutex<Option<CachedToken>>,
}

impl LtdClient {
    pub fn new(http: reqwest::Client, config: LtdConfig) -> Self {
        Self {
            http,
            config,
            token: Mutex::new(None),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Get the auth token, exchanging credentials when the cached one is
    /// missing or expired.
    async fn auth_token(&self) -> Result<String> {
        let password =
            self.config
                .password
                .as_deref()
                .ok_or_else(|| AppError::Configuration {
                    message: "Docs-host API password is not configured".to_string(),
                })?;

        let mut entry = self.token.lock().await;
        if let Some(cached) = entry.as_ref() {
            if cached.is_fresh() {
                return Ok(cached.token.clone());
            }
        }

        let url = self.url_for("/token");
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.username, Some(password))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AppError::Authentication {
                message: format!(
                    "Token exchange rejected for user '{}'",
                    self.config.username
                ),
            });
        }
        if !status.is_success() {
            return Err(AppError::UpstreamHttp {
                status: status.as_u16(),
                url,
            });
        }

        let body: TokenResponse = response.json().await?;
        debug!("Obtained docs-host auth token");

        *entry = Some(CachedToken {
            token: body.token.clone(),
            expires_at: Instant::now() + Duration::from_secs(self.config.token_ttl_secs),
        });
        Ok(body.token)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let token = self.auth_token().await?;
        let url = self.url_for(path);
        // The token goes in as the basic-auth username with empty password
        let response = self
            .http
            .get(&url)
            .basic_auth(&token, Some(""))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamHttp {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.json().await?)
    }

    /// Get all projects from the docs-host API for the organization.
    pub async fn get_projects(&self) -> Result<Vec<LtdProject>> {
        self.get_json(&format!("/v2/orgs/{}/projects", self.config.organization))
            .await
    }

    /// Get the configured organization.
    pub async fn get_organization(&self) -> Result<LtdOrganization> {
        self.get_json(&format!("/v2/orgs/{}", self.config.organization))
            .await
    }
}
