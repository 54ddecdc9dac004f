//! BigQuery Client Abstractions
//!
//! クライアントの抽象化と実装

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use google_cloud_bigquery::client::Client;
use google_cloud_bigquery::http::job::get_query_results::GetQueryResultsRequest;
use google_cloud_bigquery::http::job::query::QueryRequest;
use google_cloud_bigquery::http::job::JobReference;
use google_cloud_bigquery::http::tabledata::insert_all::{InsertAllRequest, InsertAllResponse};
use google_cloud_bigquery::http::types::ErrorProto;
use log::debug;

#[cfg(test)]
use mockall::automock;

use super::models::ListingRow;

/// Table-level BigQuery operations used by the loader
/// This enables mocking in tests while using the real client in production
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BigQueryTableClient: Send + Sync {
    /// Stream rows into a table
    async fn insert(
        &self,
        project_id: &str,
        dataset: &str,
        table: &str,
        request: &InsertAllRequest<ListingRow>,
    ) -> Result<InsertAllResponse>;

    /// Remove every row from a table
    async fn truncate(&self, project_id: &str, dataset: &str, table: &str) -> Result<()>;
}

/// BigQuery client that owns the Client instance
pub struct OwnedBigQueryClient {
    client: Client,
}

impl OwnedBigQueryClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

pub fn truncate_statement(project_id: &str, dataset: &str, table: &str) -> String {
    format!("TRUNCATE TABLE `{}.{}.{}`", project_id, dataset, table)
}

/// Polls allowed after the initial query call before giving up
pub const MAX_QUERY_POLLS: usize = 30;

/// Server-side wait per poll
const POLL_TIMEOUT_MS: i64 = 10_000;

/// State of a query job as reported by BigQuery
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStatus {
    pub job: JobReference,
    pub complete: bool,
    pub errors: Vec<String>,
}

impl QueryStatus {
    fn new(job: JobReference, complete: bool, errors: Option<Vec<ErrorProto>>) -> Self {
        let errors = errors
            .unwrap_or_default()
            .into_iter()
            .map(|e| {
                e.message
                    .or(e.reason)
                    .unwrap_or_else(|| "unknown error".to_string())
            })
            .collect();
        Self {
            job,
            complete,
            errors,
        }
    }
}

/// Job-level calls needed to run a statement to completion
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QueryJobApi: Send + Sync {
    async fn query(&self, project_id: &str, request: &QueryRequest) -> Result<QueryStatus>;

    async fn poll(&self, job: &JobReference) -> Result<QueryStatus>;
}

/// Run a statement and wait until its job finishes
///
/// Fails when the job reports errors or is still running after
/// `max_polls` polls.
pub async fn run_statement<A: QueryJobApi + ?Sized>(
    api: &A,
    project_id: &str,
    statement: String,
    max_polls: usize,
) -> Result<()> {
    let request = QueryRequest {
        query: statement,
        ..Default::default()
    };
    let mut status = api.query(project_id, &request).await?;
    let mut polls = 0;

    loop {
        if !status.errors.is_empty() {
            bail!("Query job {} failed: {}", status.job.job_id, status.errors.join("; "));
        }
        if status.complete {
            return Ok(());
        }
        if polls >= max_polls {
            return Err(anyhow!(
                "Query job {} did not complete after {} polls",
                status.job.job_id,
                polls
            ));
        }
        polls += 1;
        debug!(
            "Waiting for query job {} ({}/{})",
            status.job.job_id, polls, max_polls
        );
        status = api.poll(&status.job).await?;
    }
}

#[async_trait]
impl BigQueryTableClient for OwnedBigQueryClient {
    async fn insert(
        &self,
        project_id: &str,
        dataset: &str,
        table: &str,
        request: &InsertAllRequest<ListingRow>,
    ) -> Result<InsertAllResponse> {
        self.client
            .tabledata()
            .insert(project_id, dataset, table, request)
            .await
            .context("BigQuery insert failed")
    }

    async fn truncate(&self, project_id: &str, dataset: &str, table: &str) -> Result<()> {
        run_statement(
            self,
            project_id,
            truncate_statement(project_id, dataset, table),
            MAX_QUERY_POLLS,
        )
        .await
        .context("BigQuery truncate failed")
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[async_trait]
impl QueryJobApi for OwnedBigQueryClient {
    async fn query(&self, project_id: &str, request: &QueryRequest) -> Result<QueryStatus> {
        let response = self.client.job().query(project_id, request).await?;
        Ok(QueryStatus::new(
            response.job_reference,
            response.job_complete,
            response.errors,
        ))
    }

    async fn poll(&self, job: &JobReference) -> Result<QueryStatus> {
        let request = GetQueryResultsRequest {
            max_results: Some(0),
            timeout_ms: Some(POLL_TIMEOUT_MS),
            location: job.location.clone(),
            ..Default::default()
        };
        let response = self
            .client
            .job()
            .get_query_results(&job.project_id, &job.job_id, &request)
            .await?;
        Ok(QueryStatus::new(
            job.clone(),
            response.job_complete,
            response.errors,
        ))
    }
}

/// Factory for creating BigQuery clients
#[async_trait]
pub trait BigQueryClientFactory: Send + Sync {
    async fn create_client(&self) -> Result<Box<dyn BigQueryTableClient>>;
}

/// Production implementation of BigQueryClientFactory
pub struct RealClientFactory {
    key_path: Option<String>,
}

impl RealClientFactory {
    pub fn new(key_path: Option<String>) -> Self {
        Self { key_path }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[async_trait]
impl BigQueryClientFactory for RealClientFactory {
    async fn create_client(&self) -> Result<Box<dyn BigQueryTableClient>> {
        let client = crate::adapter::auth::create_bigquery_client(self.key_path.as_deref()).await?;
        Ok(Box::new(OwnedBigQueryClient::new(client)))
    }
}
