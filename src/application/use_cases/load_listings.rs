//! # Load Listings Use Case
//!
//! 広告ロードユースケース

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use crate::application::dto::etl_params::LoadMode;
use crate::domain::entities::listing::CarListing;
use crate::domain::entities::load_batch::LoadBatch;
use crate::domain::repositories::load_repository::LoadRepository;

/// ロード結果のサマリー
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub loaded_count: usize,
    pub failed_count: usize,
    pub loaded_ids: Vec<String>,
}

/// 広告ロードユースケース
///
/// 広告をバッチに分割して順にロードする
pub struct LoadListingsUseCase<U: LoadRepository + ?Sized> {
    load_repository: Arc<U>,
    batch_pause: Duration,
}

impl<U: LoadRepository + ?Sized> LoadListingsUseCase<U> {
    pub fn new(load_repository: Arc<U>) -> Self {
        Self {
            load_repository,
            batch_pause: Duration::ZERO,
        }
    }

    /// バッチ間の待機時間（レート制限対策）
    pub fn with_batch_pause(mut self, batch_pause: Duration) -> Self {
        self.batch_pause = batch_pause;
        self
    }

    /// 広告をロード
    ///
    /// 置換モードではロード前にテーブルを空にする。広告が0件の場合は
    /// テーブルに触れない。
    ///
    /// # Errors
    ///
    /// テーブルの削除、またはいずれかのバッチのロードに失敗した場合
    pub async fn execute(
        &self,
        listings: Vec<CarListing>,
        batch_size: usize,
        mode: LoadMode,
    ) -> Result<LoadSummary> {
        if listings.is_empty() {
            return Ok(LoadSummary::default());
        }

        if mode == LoadMode::Replace {
            info!("Replace mode: clearing target table before load");
            self.load_repository
                .clear_target()
                .await
                .context("Failed to clear target table")?;
        }

        let batches = LoadBatch::new(listings).split_by_size(batch_size);
        let total_batches = batches.len();
        let mut summary = LoadSummary::default();

        for (i, batch) in batches.into_iter().enumerate() {
            info!(
                "Loading batch {}/{} ({} listings)...",
                i + 1,
                total_batches,
                batch.len()
            );

            let result = self
                .load_repository
                .load_batch(&batch)
                .await
                .with_context(|| format!("Failed to load batch {}/{}", i + 1, total_batches))?;

            summary.loaded_count += result.loaded_count;
            summary.failed_count += result.failed_count;
            summary.loaded_ids.extend(result.loaded_ids);

            if i + 1 < total_batches && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::domain::entities::load_batch::test_support::create_test_listing;
    use crate::domain::repositories::load_repository::LoadResult;
    use crate::domain::services::deduplication::DeduplicationService;

    #[derive(Default)]
    struct MockLoadRepository {
        should_fail: bool,
        /// 各バッチで失敗扱いにする件数
        failed_per_batch: usize,
        calls: Mutex<Vec<String>>,
    }

    impl MockLoadRepository {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LoadRepository for MockLoadRepository {
        async fn clear_target(&self) -> Result<()> {
            self.calls.lock().unwrap().push("clear".to_string());
            Ok(())
        }

        async fn load_batch(&self, batch: &LoadBatch) -> Result<LoadResult> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("load:{}", batch.len()));
            if self.should_fail {
                anyhow::bail!("insertAll failed")
            }
            let mut ids = DeduplicationService::extract_advert_ids(batch.listings());
            ids.truncate(batch.len() - self.failed_per_batch.min(batch.len()));
            Ok(LoadResult::new(
                ids.len(),
                batch.len() - ids.len(),
                ids,
            ))
        }
    }

    fn listings(count: usize) -> Vec<CarListing> {
        (1..=count)
            .map(|i| create_test_listing(&format!("ad-{}", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_load_append_in_batches() {
        let repo = Arc::new(MockLoadRepository::default());
        let use_case = LoadListingsUseCase::new(repo.clone());

        let summary = use_case
            .execute(listings(5), 2, LoadMode::Append)
            .await
            .unwrap();

        assert_eq!(summary.loaded_count, 5);
        assert_eq!(summary.failed_count, 0);
        assert_eq!(summary.loaded_ids.len(), 5);
        assert_eq!(repo.calls(), vec!["load:2", "load:2", "load:1"]);
    }

    #[tokio::test]
    async fn test_load_replace_clears_first() {
        let repo = Arc::new(MockLoadRepository::default());
        let use_case = LoadListingsUseCase::new(repo.clone());

        use_case
            .execute(listings(3), 10, LoadMode::Replace)
            .await
            .unwrap();

        assert_eq!(repo.calls(), vec!["clear", "load:3"]);
    }

    #[tokio::test]
    async fn test_load_empty_does_not_touch_table() {
        let repo = Arc::new(MockLoadRepository::default());
        let use_case = LoadListingsUseCase::new(repo.clone());

        let summary = use_case
            .execute(vec![], 10, LoadMode::Replace)
            .await
            .unwrap();

        assert_eq!(summary.loaded_count, 0);
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn test_load_counts_partial_failures() {
        let repo = Arc::new(MockLoadRepository {
            failed_per_batch: 1,
            ..MockLoadRepository::default()
        });
        let use_case = LoadListingsUseCase::new(repo);

        let summary = use_case
            .execute(listings(4), 2, LoadMode::Append)
            .await
            .unwrap();

        assert_eq!(summary.loaded_count, 2);
        assert_eq!(summary.failed_count, 2);
    }

    #[tokio::test]
    async fn test_load_failure_propagates() {
        let repo = Arc::new(MockLoadRepository {
            should_fail: true,
            ..MockLoadRepository::default()
        });
        let use_case = LoadListingsUseCase::new(repo);

        let result = use_case.execute(listings(1), 10, LoadMode::Append).await;

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("insertAll failed"));
    }
}
