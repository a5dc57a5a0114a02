//! Ingestion worker error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    /// A project's metadata object could not be fetched or parsed.
    ///
    /// This is the per-project isolation unit: a refresh run logs it with
    /// the project's slug and moves on to the next project. The project's
    /// previously stored document, if any, stays unchanged.
    #[error("Metadata error for {slug}: {reason}")]
    Metadata {
        slug: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The seed dataset could not be read or parsed. Fatal at load time;
    /// there is no partial load.
    #[error("Seed dataset error: {0}")]
    Seed(String),

    #[error(transparent)]
    App(#[from] docportal_common::AppError),
}

impl IngestError {
    pub fn metadata(slug: impl Into<String>, reason: impl Into<String>) -> Self {
        IngestError::Metadata {
            slug: slug.into(),
            reason: reason.into(),
            source: None,
        }
    }

    pub fn metadata_with_source(
        slug: impl Into<String>,
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        IngestError::Metadata {
            slug: slug.into(),
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }
}
