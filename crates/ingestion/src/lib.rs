//! DocPortal ingestion library
//!
//! Pulls per-project metadata from the three external sources (docs-host
//! API, metadata bucket, source-host API), normalizes it into the category
//! documents, and upserts the results into the category store. The worker
//! binary drives a full refresh on a fixed cadence; the seed loader
//! bootstraps the same store shape from a YAML dataset when live sources
//! are not configured.

pub mod bucket;
pub mod errors;
pub mod github;
pub mod ltd;
pub mod metadata;
pub mod normalize;
pub mod refresh;
pub mod seed;

pub use errors::IngestError;
pub use refresh::{RefreshOutcome, RefreshService};
