//! Refresh and seed-load behavior over the in-memory store backend.
//!
//! These tests drive the orchestrator with a scripted metadata source and
//! an unconfigured source-host client, so everything runs without network
//! access while exercising the same code paths as a live run.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use docportal_common::config::AppConfig;
use docportal_common::domain::Document;
use docportal_common::store::MemoryBackend;
use docportal_common::ProjectRepository;
use docportal_ingestion::bucket::MetadataSource;
use docportal_ingestion::ltd::{LtdEdition, LtdProject};
use docportal_ingestion::seed::SeedData;
use docportal_ingestion::{IngestError, RefreshService};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Serves canned metadata objects; slugs without an entry fail the way an
/// unreachable object would.
struct ScriptedSource {
    objects: HashMap<String, Value>,
}

impl ScriptedSource {
    fn new(entries: Vec<(&str, Value)>) -> Self {
        Self {
            objects: entries
                .into_iter()
                .map(|(slug, value)| (slug.to_string(), value))
                .collect(),
        }
    }
}

#[async_trait]
impl MetadataSource for ScriptedSource {
    async fn fetch(&self, slug: &str) -> Result<Value, IngestError> {
        self.objects
            .get(slug)
            .cloned()
            .ok_or_else(|| IngestError::metadata(slug, "metadata object GET returned HTTP 403"))
    }
}

fn project(slug: &str) -> LtdProject {
    LtdProject {
        slug: slug.to_string(),
        title: format!("Project {slug}"),
        published_url: format!("https://spherex-docs.ipac.caltech.edu/{slug}"),
        source_repo_url: format!("https://github.com/SPHEREx/{slug}"),
        default_edition: LtdEdition {
            published_url: format!("https://spherex-docs.ipac.caltech.edu/{slug}"),
            date_rebuilt: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
        },
    }
}

fn meta_common(slug: &str, title: &str) -> Value {
    let series = slug
        .rsplit_once('-')
        .map(|(prefix, _)| prefix.to_uppercase())
        .unwrap_or_default();
    json!({
        "title": title,
        "identifier": slug.to_uppercase(),
        "document_handle_prefix": series,
        "canonical_url": format!("https://spherex-docs.ipac.caltech.edu/{slug}"),
        "repository_url": format!("https://github.com/SPHEREx/{slug}"),
        "authors": [
            {"name": "A. Lead", "role": "IPAC Lead"},
            {"name": "B. Contact", "role": "SPHEREx Lead"}
        ]
    })
}

fn ms_meta(slug: &str, title: &str) -> Value {
    let mut value = meta_common(slug, title);
    value["pipeline_level"] = json!("L2");
    value["diagram_index"] = json!(3);
    value["difficulty"] = json!("Low");
    value
}

fn service() -> (Arc<ProjectRepository>, RefreshService) {
    let repo = Arc::new(ProjectRepository::new(
        Arc::new(MemoryBackend::new()),
        "test",
    ));
    // Default config has no source-host token, so summaries degrade to
    // defaults without touching the network
    let service = RefreshService::new(repo.clone(), AppConfig::default(), reqwest::Client::new());
    (repo, service)
}

#[tokio::test]
async fn test_failure_isolation_skips_only_the_failing_project() {
    let (repo, service) = service();
    let source = ScriptedSource::new(vec![
        ("ssdc-ms-001", ms_meta("ssdc-ms-001", "First")),
        // ssdc-ms-002 is missing: its fetch fails
        ("ssdc-ms-003", ms_meta("ssdc-ms-003", "Third")),
    ]);
    let projects = vec![
        project("ssdc-ms-001"),
        project("ssdc-ms-002"),
        project("ssdc-ms-003"),
    ];

    let outcome = service
        .ingest_projects(&source, &projects, "spherex", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.ingested, 2);
    assert_eq!(outcome.skipped_metadata, 1);

    let stored = repo.ssdc_ms.get_all().await.unwrap();
    let ids: Vec<&str> = stored.iter().map(|d| d.project_id()).collect();
    assert_eq!(ids, ["ssdc-ms-001", "ssdc-ms-003"]);
}

#[tokio::test]
async fn test_refresh_is_idempotent() {
    let (repo, service) = service();
    let source = ScriptedSource::new(vec![
        ("ssdc-ms-001", ms_meta("ssdc-ms-001", "First")),
        ("ssdc-ms-002", ms_meta("ssdc-ms-002", "Second")),
    ]);
    let projects = vec![project("ssdc-ms-001"), project("ssdc-ms-002")];
    let cancel = CancellationToken::new();

    service
        .ingest_projects(&source, &projects, "spherex", &cancel)
        .await
        .unwrap();
    let first_pass = repo.ssdc_ms.get_all().await.unwrap();

    service
        .ingest_projects(&source, &projects, "spherex", &cancel)
        .await
        .unwrap();
    let second_pass = repo.ssdc_ms.get_all().await.unwrap();

    assert_eq!(first_pass, second_pass);
    assert_eq!(second_pass.len(), 2);
}

#[tokio::test]
async fn test_reingest_replaces_the_stored_document() {
    let (repo, service) = service();
    let projects = vec![project("ssdc-ms-001")];
    let cancel = CancellationToken::new();

    let before = ScriptedSource::new(vec![("ssdc-ms-001", ms_meta("ssdc-ms-001", "Old title"))]);
    service
        .ingest_projects(&before, &projects, "spherex", &cancel)
        .await
        .unwrap();

    let after = ScriptedSource::new(vec![("ssdc-ms-001", ms_meta("ssdc-ms-001", "New title"))]);
    service
        .ingest_projects(&after, &projects, "spherex", &cancel)
        .await
        .unwrap();

    let stored = repo.ssdc_ms.get_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].common.title, "New title");
}

#[tokio::test]
async fn test_unclassified_slugs_are_skipped_silently() {
    let (repo, service) = service();
    let source = ScriptedSource::new(vec![("ssdc-ms-001", ms_meta("ssdc-ms-001", "First"))]);
    let projects = vec![project("legacy-docs-001"), project("ssdc-ms-001")];

    let outcome = service
        .ingest_projects(&source, &projects, "spherex", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.unclassified, 1);
    assert_eq!(outcome.ingested, 1);
    assert_eq!(outcome.skipped_metadata, 0);
    assert_eq!(repo.ssdc_ms.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_degraded_source_host_metadata() {
    let (repo, service) = service();
    let source = ScriptedSource::new(vec![("ssdc-ms-001", ms_meta("ssdc-ms-001", "First"))]);
    let projects = vec![project("ssdc-ms-001")];

    service
        .ingest_projects(&source, &projects, "spherex", &CancellationToken::new())
        .await
        .unwrap();

    let stored = repo.ssdc_ms.get("ssdc-ms-001").await.unwrap().unwrap();
    assert_eq!(stored.common.github_issues.open_issue_count, 0);
    assert_eq!(stored.common.github_issues.open_pr_count, 0);
    assert_eq!(
        stored.common.github_issues.issue_url,
        "https://github.com/SPHEREx/ssdc-ms-001/issues"
    );
    assert!(stored.common.github_release.is_none());
    // Falls back to the edition rebuild timestamp
    assert_eq!(
        stored.common.latest_commit_datetime,
        Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn test_mixed_categories_land_in_their_stores() {
    let (repo, service) = service();
    let mut tr = meta_common("ssdc-tr-004", "Detector Test Report");
    tr["ipac_jira_id"] = json!("SPX-99");
    let mut if_meta = meta_common("ssdc-if-002", "Downlink Interface");
    if_meta["interface_partner"] = json!("Mission Ops");

    let source = ScriptedSource::new(vec![
        ("ssdc-tr-004", tr),
        ("ssdc-if-002", if_meta),
        ("ssdc-tn-010", meta_common("ssdc-tn-010", "Calibration Note")),
    ]);
    let projects = vec![
        project("ssdc-tr-004"),
        project("ssdc-if-002"),
        project("ssdc-tn-010"),
    ];

    let outcome = service
        .ingest_projects(&source, &projects, "spherex", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.ingested, 3);

    let trs = repo.ssdc_tr.get_all().await.unwrap();
    assert_eq!(trs.len(), 1);
    assert!(trs[0].has_verification_ids());

    let ifs = repo.ssdc_if.get_all().await.unwrap();
    assert_eq!(ifs[0].interface_partner_name, "Mission Ops");

    assert_eq!(repo.ssdc_tn.get_all().await.unwrap().len(), 1);
    assert!(repo.ssdc_ms.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_run_stops_at_project_boundary() {
    let (repo, service) = service();
    let source = ScriptedSource::new(vec![("ssdc-ms-001", ms_meta("ssdc-ms-001", "First"))]);
    let projects = vec![project("ssdc-ms-001")];

    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = service
        .ingest_projects(&source, &projects, "spherex", &cancel)
        .await
        .unwrap();
    assert_eq!(outcome.ingested, 0);
    assert!(repo.ssdc_ms.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_seed_load_round_trip() {
    let dataset = r#"
ssdc-ms:
  - handle: "SSDC-MS-002"
    title: "Second Module"
    url: "https://spherex-docs.ipac.caltech.edu/ssdc-ms-002"
    github_url: "https://github.com/SPHEREx/ssdc-ms-002"
    issues: 0
    prs: 0
    commit_date: "2024-02-01T12:00:00Z"
    ssdc_author: "A. Lead"
    project_author: "B. Contact"
    difficulty: "Low"
    pipeline_level: 1
    diagram_index: 2
  - handle: "SSDC-MS-001"
    title: "First Module"
    url: "https://spherex-docs.ipac.caltech.edu/ssdc-ms-001"
    github_url: "https://github.com/SPHEREx/ssdc-ms-001"
    issues: 2
    prs: 1
    tag: "1.0.0"
    tag_date: "2024-01-10T00:00:00Z"
    commit_date: "2024-01-15T08:00:00Z"
    ssdc_author: "A. Lead"
    project_author: "B. Contact"
    difficulty: "Medium"
    pipeline_level: 2
    diagram_index: 7
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(dataset.as_bytes()).unwrap();

    let seed = SeedData::from_yaml_file(file.path()).unwrap();
    let repo = ProjectRepository::new(Arc::new(MemoryBackend::new()), "test");
    seed.bootstrap(&repo).await.unwrap();

    let stored = repo.ssdc_ms.get_all().await.unwrap();
    let handles: Vec<&str> = stored.iter().map(|d| d.handle()).collect();
    // Sorted ascending by project id regardless of dataset order
    assert_eq!(handles, ["SSDC-MS-001", "SSDC-MS-002"]);
    assert_eq!(stored[0].common.github_release.as_ref().unwrap().tag, "1.0.0");
    assert!(stored[1].common.github_release.is_none());
}

#[tokio::test]
async fn test_seed_load_rejects_malformed_dataset() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"ssdc-ms:\n  - handle: only-a-handle\n")
        .unwrap();

    let err = SeedData::from_yaml_file(file.path()).unwrap_err();
    assert!(matches!(err, IngestError::Seed(_)));
}
