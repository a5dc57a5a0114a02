//! DocPortal Common Library
//!
//! Shared code for the DocPortal services including:
//! - Domain models for the document categories
//! - Category store (Redis-backed, with an in-memory backend for dev/tests)
//! - Error types and handling
//! - Configuration management

pub mod config;
pub mod domain;
pub mod errors;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use domain::{Category, Document, DocumentCommon};
pub use errors::{AppError, Result};
pub use store::ProjectRepository;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Organization id documents belong to unless configured otherwise
pub const DEFAULT_ORGANIZATION: &str = "spherex";

/// Fallback bucket name used when the docs-host organization record does not
/// declare one
pub const DEFAULT_METADATA_BUCKET: &str = "spherex-docs";
