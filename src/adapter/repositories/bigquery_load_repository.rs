//! BigQuery Load Repository Implementation
//!
//! LoadRepositoryのBigQuery実装

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::adapter::bigquery::batch_uploader::BatchUploader;
use crate::adapter::bigquery::client::BigQueryClientFactory;
use crate::adapter::bigquery::retry::RetryPolicy;
use crate::adapter::config::Config;
use crate::domain::entities::load_batch::LoadBatch;
use crate::domain::repositories::load_repository::{LoadRepository, LoadResult};

/// BigQueryロードリポジトリ
pub struct BigQueryLoadRepository {
    factory: Arc<dyn BigQueryClientFactory>,
    config: Config,
    policy: RetryPolicy,
}

impl BigQueryLoadRepository {
    /// 新しいリポジトリを作成
    pub fn new(factory: Arc<dyn BigQueryClientFactory>, config: Config, policy: RetryPolicy) -> Self {
        Self {
            factory,
            config,
            policy,
        }
    }
}

#[async_trait]
impl LoadRepository for BigQueryLoadRepository {
    async fn clear_target(&self) -> Result<()> {
        let client = self
            .factory
            .create_client()
            .await
            .context("Failed to create BigQuery client")?;

        client
            .truncate(
                &self.config.project_id,
                &self.config.dataset_id,
                &self.config.table_id,
            )
            .await?;

        info!("✓ Cleared table {}", self.config.table_ref());
        Ok(())
    }

    async fn load_batch(&self, batch: &LoadBatch) -> Result<LoadResult> {
        let outcome = BatchUploader::new(self.factory.as_ref(), &self.config, &self.policy)
            .upload(batch.clone())
            .await?;

        Ok(LoadResult::new(
            outcome.loaded_ids.len(),
            outcome.failed_count,
            outcome.loaded_ids,
        ))
    }
}
