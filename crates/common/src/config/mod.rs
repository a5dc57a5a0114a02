//! Configuration management for the DocPortal services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{env}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Gateway server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Category store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Docs-host (LTD) API configuration
    #[serde(default)]
    pub ltd: LtdConfig,

    /// Object-store configuration for per-document metadata files
    #[serde(default)]
    pub s3: S3Config,

    /// Source-host API configuration
    #[serde(default)]
    pub github: GitHubConfig,

    /// Ingestion worker configuration
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Store backend: "redis" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Redis URL (ignored by the memory backend)
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Key prefix for namespacing
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LtdConfig {
    /// Root URL of the docs-host API server
    #[serde(default = "default_ltd_api_url")]
    pub api_url: String,

    /// Organization name in the docs-host API
    #[serde(default = "default_organization")]
    pub organization: String,

    /// Username for the docs-host API
    #[serde(default = "default_ltd_username")]
    pub username: String,

    /// Password corresponding to `username`; required for live ingestion
    pub password: Option<String>,

    /// Validity window for cached auth tokens, in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3Config {
    /// AWS region for the metadata bucket.
    /// The bucket name itself is declared by the docs-host organization
    /// record; the region currently is not, so it is configured here.
    #[serde(default = "default_s3_region")]
    pub region: String,

    /// AWS access key ID for reading metadata objects
    pub access_key_id: Option<String>,

    /// Secret key corresponding to `access_key_id`
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubConfig {
    /// Root URL of the source-host API
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Web host repository URLs must live on for live metadata lookup
    #[serde(default = "default_github_host")]
    pub repo_host: String,

    /// API token; when absent, source-host metadata degrades to defaults
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Use the YAML seed dataset rather than live sources
    #[serde(default = "default_use_mock_data")]
    pub use_mock_data: bool,

    /// Path to the seed dataset file
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,

    /// Seconds between refresh runs in live mode
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_store_backend() -> String {
    "redis".to_string()
}
fn default_redis_url() -> String {
    "redis://localhost:6379/0".to_string()
}
fn default_key_prefix() -> String {
    "docportal".to_string()
}
fn default_ltd_api_url() -> String {
    "https://docs-api.ipac.caltech.edu".to_string()
}
fn default_organization() -> String {
    "spherex".to_string()
}
fn default_ltd_username() -> String {
    "spherex-portal".to_string()
}
fn default_token_ttl() -> u64 {
    600
}
fn default_s3_region() -> String {
    "us-west-1".to_string()
}
fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_github_host() -> String {
    "github.com".to_string()
}
fn default_use_mock_data() -> bool {
    true
}
fn default_dataset_path() -> String {
    "dataset.example.yaml".to_string()
}
fn default_refresh_interval() -> u64 {
    900
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__STORE__URL=redis://redis:6379/0
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the refresh cadence as Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.ingest.refresh_interval_secs)
    }
}

impl S3Config {
    /// The long-lived object-store key pair, when both halves are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl Default for LtdConfig {
    fn default() -> Self {
        Self {
            api_url: default_ltd_api_url(),
            organization: default_organization(),
            username: default_ltd_username(),
            password: None,
            token_ttl_secs: default_token_ttl(),
        }
    }
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: default_s3_region(),
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            repo_host: default_github_host(),
            token: None,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            use_mock_data: default_use_mock_data(),
            dataset_path: default_dataset_path(),
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            ltd: LtdConfig::default(),
            s3: S3Config::default(),
            github: GitHubConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}
