//! BigQuery Batch Upload Logic
//!
//! バッチアップロードロジック（自動分割とリトライ対応）

use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use google_cloud_bigquery::http::tabledata::insert_all::{InsertAllRequest, InsertAllResponse, Row};
use log::{error, info, warn};
use tokio::time::sleep;

use super::client::{BigQueryClientFactory, BigQueryTableClient};
use super::models::ListingRow;
use super::retry::{classify_error, error_chain_to_string, ErrorKind, RetryPolicy};
use crate::adapter::config::Config;
use crate::domain::entities::listing::CarListing;
use crate::domain::entities::load_batch::LoadBatch;
use crate::domain::services::deduplication::DeduplicationService;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Prepare rows for BigQuery insertion
pub fn prepare_rows(listings: &[CarListing]) -> Vec<Row<ListingRow>> {
    listings
        .iter()
        .map(ListingRow::from)
        .map(|row| Row {
            insert_id: Some(row.insert_id.clone()),
            json: row,
        })
        .collect()
}

/// Result of uploading one batch (possibly after splitting)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub loaded_ids: Vec<String>,
    pub failed_count: usize,
}

impl BatchOutcome {
    fn merge(&mut self, other: BatchOutcome) {
        self.loaded_ids.extend(other.loaded_ids);
        self.failed_count += other.failed_count;
    }
}

/// Uploads batches with splitting on 413, backoff on transient errors
/// and client recreation on connection errors
pub struct BatchUploader<'a, F: BigQueryClientFactory + ?Sized> {
    factory: &'a F,
    config: &'a Config,
    policy: &'a RetryPolicy,
}

impl<'a, F: BigQueryClientFactory + ?Sized> BatchUploader<'a, F> {
    pub fn new(factory: &'a F, config: &'a Config, policy: &'a RetryPolicy) -> Self {
        Self {
            factory,
            config,
            policy,
        }
    }

    pub async fn upload(&self, batch: LoadBatch) -> Result<BatchOutcome> {
        if batch.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let mut client = self
            .factory
            .create_client()
            .await
            .context("Failed to create BigQuery client")?;

        self.upload_with_split(&mut client, batch).await
    }

    fn outcome_from_response(batch: &LoadBatch, response: InsertAllResponse) -> BatchOutcome {
        match response.insert_errors {
            Some(errors) if !errors.is_empty() => {
                warn!("Batch of {} rows had insert errors:", batch.len());
                for error in &errors {
                    warn!("  Row {}: {:?}", error.index, error.errors);
                }
                BatchOutcome {
                    loaded_ids: Vec::new(),
                    failed_count: batch.len(),
                }
            }
            _ => BatchOutcome {
                loaded_ids: DeduplicationService::extract_advert_ids(batch.listings()),
                failed_count: 0,
            },
        }
    }

    fn upload_with_split<'b>(
        &'b self,
        client: &'b mut Box<dyn BigQueryTableClient>,
        batch: LoadBatch,
    ) -> BoxFuture<'b, Result<BatchOutcome>> {
        Box::pin(async move {
            let request = InsertAllRequest {
                rows: prepare_rows(batch.listings()),
                skip_invalid_rows: None,
                ignore_unknown_values: None,
                template_suffix: None,
                trace_id: None,
            };

            let mut retry_count = 0;
            let mut connection_reset_count = 0;

            loop {
                let result = client
                    .insert(
                        &self.config.project_id,
                        &self.config.dataset_id,
                        &self.config.table_id,
                        &request,
                    )
                    .await;

                let e = match result {
                    Ok(response) => {
                        let outcome = Self::outcome_from_response(&batch, response);
                        if outcome.failed_count == 0 {
                            info!("✓ Batch of {} rows loaded", batch.len());
                        }
                        return Ok(outcome);
                    }
                    Err(e) => e,
                };

                let error_msg = error_chain_to_string(&e);

                match classify_error(&error_msg) {
                    ErrorKind::RequestTooLarge => {
                        if batch.len() <= self.policy.min_split_batch_size.max(1) {
                            error!(
                                "Batch is too large even at minimum size ({})",
                                batch.len()
                            );
                            return Err(e).context("Batch too large even at minimum size");
                        }

                        let (first, second) = batch.split_half();
                        warn!(
                            "Batch too large, splitting into {} and {} rows",
                            first.len(),
                            second.len()
                        );

                        let mut outcome = self.upload_with_split(client, first).await?;
                        outcome.merge(self.upload_with_split(client, second).await?);
                        return Ok(outcome);
                    }
                    ErrorKind::Connection => {
                        connection_reset_count += 1;
                        if connection_reset_count > self.policy.max_connection_resets {
                            error!(
                                "Giving up after {} connection resets: {}",
                                connection_reset_count, error_msg
                            );
                            return Err(e).context("Too many connection resets");
                        }

                        warn!(
                            "Connection error (reset #{}), creating new client: {}",
                            connection_reset_count, error_msg
                        );
                        *client = self
                            .factory
                            .create_client()
                            .await
                            .context("Failed to recreate BigQuery client")?;

                        sleep(self.policy.delay_for(connection_reset_count)).await;
                        retry_count = 0;
                    }
                    ErrorKind::Transient if retry_count < self.policy.max_retries => {
                        retry_count += 1;
                        let delay = self.policy.delay_for(retry_count);
                        warn!(
                            "Transient error (attempt {}), retrying in {:?}: {}",
                            retry_count, delay, error_msg
                        );
                        sleep(delay).await;
                    }
                    _ => {
                        error!(
                            "Failed to load batch after {} retries: {}",
                            retry_count, error_msg
                        );
                        return Err(e).context("Failed to load rows into BigQuery");
                    }
                }
            }
        })
    }
}
