//! DocPortal Ingestion Worker
//!
//! Keeps the category store fresh:
//! 1. Connects the store backend
//! 2. In mock mode, loads the seed dataset once and exits
//! 3. In live mode, runs a full refresh pass on a fixed cadence until
//!    ctrl-c flips the cancellation token

use docportal_common::{config::AppConfig, ProjectRepository, VERSION};
use docportal_ingestion::seed::SeedData;
use docportal_ingestion::RefreshService;
use std::path::Path;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting DocPortal ingestion worker v{}", VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    // Connect the category store
    let repo = Arc::new(ProjectRepository::connect(&config.store).await?);

    if config.ingest.use_mock_data {
        info!(
            dataset = %config.ingest.dataset_path,
            "Mock mode: loading seed dataset"
        );
        let seed = SeedData::from_yaml_file(Path::new(&config.ingest.dataset_path))?;
        seed.bootstrap(&repo).await?;
        info!("Seed dataset loaded; worker exiting");
        return Ok(());
    }

    let refresh_interval = config.refresh_interval();
    let service = RefreshService::new(repo, config, reqwest::Client::new());

    // ctrl-c flips the token; an in-flight run stops at the next project
    // boundary
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    let mut interval = tokio::time::interval(refresh_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = cancel.cancelled() => break,
        }

        if let Err(e) = service.run(&cancel).await {
            // The next tick retries; stale documents are the only
            // user-visible effect of a failed run
            error!(error = %e, "Refresh run failed");
        }

        if cancel.is_cancelled() {
            break;
        }
    }

    info!("Ingestion worker shutting down");
    Ok(())
}
