//! Workflow Integration Tests
//!
//! EtlWorkflow の統合テスト（フィクスチャページとフェイクBigQueryクライアント）

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use google_cloud_bigquery::http::tabledata::insert_all::{
    Error as InsertError, ErrorMessage, InsertAllRequest, InsertAllResponse,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use otomoto_etl::adapter::bigquery::client::{BigQueryClientFactory, BigQueryTableClient};
use otomoto_etl::adapter::bigquery::models::ListingRow;
use otomoto_etl::adapter::bigquery::retry::RetryPolicy;
use otomoto_etl::adapter::config::Config;
use otomoto_etl::adapter::otomoto::parse_search_page;
use otomoto_etl::domain::entities::search_query::SearchQuery;
use otomoto_etl::domain::repositories::listing_repository::{ListingRepository, SearchPage};
use otomoto_etl::driver::cli::Args;
use otomoto_etl::driver::workflow::{EtlSummary, EtlWorkflow};

const SEARCH_PAGE: &str = include_str!("fixtures/search_page.html");

/// フィクスチャのHTMLを1ページ目として返すリポジトリ
struct FixtureListingRepository {
    requested: Mutex<Vec<(Option<String>, u32)>>,
}

impl FixtureListingRepository {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            requested: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ListingRepository for FixtureListingRepository {
    async fn fetch_page(&self, query: &SearchQuery, page: u32) -> Result<Option<SearchPage>> {
        self.requested
            .lock()
            .unwrap()
            .push((query.brand().map(str::to_string), page));
        Ok(Some(parse_search_page(SEARCH_PAGE).page))
    }
}

#[derive(Default)]
struct Recorded {
    inserted: Vec<Vec<String>>,
    truncated: Vec<String>,
    clients_created: usize,
    reject_first_insert: bool,
}

/// 呼び出しを記録するだけのBigQueryクライアント
struct RecordingClient {
    recorded: Arc<Mutex<Recorded>>,
}

#[async_trait]
impl BigQueryTableClient for RecordingClient {
    async fn insert(
        &self,
        _project_id: &str,
        _dataset: &str,
        _table: &str,
        request: &InsertAllRequest<ListingRow>,
    ) -> Result<InsertAllResponse> {
        let ids = request
            .rows
            .iter()
            .map(|row| row.json.advert_id.clone())
            .collect();
        let mut recorded = self.recorded.lock().unwrap();
        let reject = recorded.reject_first_insert && recorded.inserted.is_empty();
        recorded.inserted.push(ids);

        let insert_errors = reject.then(|| {
            vec![InsertError {
                index: 0,
                errors: vec![ErrorMessage {
                    reason: "invalid".to_string(),
                    message: "no such field: mileage".to_string(),
                    ..Default::default()
                }],
            }]
        });
        Ok(InsertAllResponse {
            kind: "bigquery#tableDataInsertAllResponse".to_string(),
            insert_errors,
        })
    }

    async fn truncate(&self, project_id: &str, dataset: &str, table: &str) -> Result<()> {
        self.recorded
            .lock()
            .unwrap()
            .truncated
            .push(format!("{}.{}.{}", project_id, dataset, table));
        Ok(())
    }
}

struct RecordingFactory {
    recorded: Arc<Mutex<Recorded>>,
}

#[async_trait]
impl BigQueryClientFactory for RecordingFactory {
    async fn create_client(&self) -> Result<Box<dyn BigQueryTableClient>> {
        self.recorded.lock().unwrap().clients_created += 1;
        Ok(Box::new(RecordingClient {
            recorded: self.recorded.clone(),
        }))
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        initial_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
        batch_delay: Duration::ZERO,
        ..RetryPolicy::default()
    }
}

fn workflow_with_recorder(config: Config) -> (EtlWorkflow, Arc<Mutex<Recorded>>) {
    let recorded = Arc::new(Mutex::new(Recorded::default()));
    let workflow = EtlWorkflow::new(config)
        .with_listing_repository(FixtureListingRepository::new())
        .with_client_factory(Arc::new(RecordingFactory {
            recorded: recorded.clone(),
        }))
        .with_retry_policy(fast_policy());
    (workflow, recorded)
}

#[tokio::test]
async fn test_workflow_dry_run_does_not_touch_bigquery() {
    let (workflow, recorded) = workflow_with_recorder(Config::default());
    let args = Args::parse_from(["otomoto-etl", "--dry-run", "--no-delay", "--days-ago", "-1"]);

    let summary = workflow.execute(&args).await.unwrap();

    // 5 edges: one without id, one duplicate
    assert_eq!(
        summary,
        EtlSummary {
            extracted: 5,
            transformed: 3,
            loaded: 0,
            failed: 0,
        }
    );
    assert_eq!(recorded.lock().unwrap().clients_created, 0);
}

#[tokio::test]
async fn test_workflow_default_freshness_drops_old_listings() {
    let (workflow, recorded) = workflow_with_recorder(Config::default());
    let args = Args::parse_from(["otomoto-etl", "--no-delay"]);

    let summary = workflow.execute(&args).await.unwrap();

    // fixture adverts are from March 2025
    assert_eq!(summary.extracted, 5);
    assert_eq!(summary.transformed, 0);
    assert_eq!(recorded.lock().unwrap().clients_created, 0);
}

#[tokio::test]
async fn test_workflow_append_loads_in_batches() {
    let config = Config {
        load_batch_size: 2,
        ..Config::default()
    };
    let (workflow, recorded) = workflow_with_recorder(config);
    let args = Args::parse_from(["otomoto-etl", "--no-delay", "--days-ago", "-1"]);

    let summary = workflow.execute(&args).await.unwrap();

    assert_eq!(summary.loaded, 3);
    assert_eq!(summary.failed, 0);

    let recorded = recorded.lock().unwrap();
    assert!(recorded.truncated.is_empty());
    assert_eq!(
        recorded.inserted,
        vec![
            vec!["6100".to_string(), "6101".to_string()],
            vec!["6102".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_workflow_rejected_batch_does_not_stop_load() {
    let config = Config {
        load_batch_size: 2,
        ..Config::default()
    };
    let (workflow, recorded) = workflow_with_recorder(config);
    recorded.lock().unwrap().reject_first_insert = true;
    let args = Args::parse_from(["otomoto-etl", "--no-delay", "--days-ago", "-1"]);

    let summary = workflow.execute(&args).await.unwrap();

    // first batch (2 rows) rejected, second batch (1 row) loaded
    assert_eq!(summary.loaded, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(recorded.lock().unwrap().inserted.len(), 2);
}

#[tokio::test]
async fn test_workflow_replace_truncates_first() {
    let (workflow, recorded) = workflow_with_recorder(Config::default());
    let args = Args::parse_from([
        "otomoto-etl",
        "--no-delay",
        "--days-ago",
        "-1",
        "--how-add",
        "replace",
    ]);

    let summary = workflow.execute(&args).await.unwrap();

    assert_eq!(summary.loaded, 3);
    let recorded = recorded.lock().unwrap();
    assert_eq!(
        recorded.truncated,
        vec!["still-worthy-453018-t6.used_car_data.otomoto_data".to_string()]
    );
    assert_eq!(recorded.inserted.len(), 1);
}

#[tokio::test]
async fn test_workflow_passes_search_filters() {
    let repository = FixtureListingRepository::new();
    let workflow = EtlWorkflow::new(Config::default())
        .with_listing_repository(repository.clone())
        .with_retry_policy(fast_policy());
    let args = Args::parse_from(["otomoto-etl", "--dry-run", "--no-delay", "--brand", "opel"]);

    workflow.execute(&args).await.unwrap();

    // 5 ads fit on one page
    let requested = repository.requested.lock().unwrap();
    assert_eq!(*requested, vec![(Some("opel".to_string()), 1)]);
}
