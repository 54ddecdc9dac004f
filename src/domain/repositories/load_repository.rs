//! # Load Repository Trait
//!
//! 変換済み広告のロードを抽象化

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::load_batch::LoadBatch;

/// ロード結果
#[derive(Debug, Clone, Default)]
pub struct LoadResult {
    /// ロードされた広告の数
    pub loaded_count: usize,
    /// 失敗した広告の数
    pub failed_count: usize,
    /// ロードされた広告ID
    pub loaded_ids: Vec<String>,
}

impl LoadResult {
    pub fn new(loaded_count: usize, failed_count: usize, loaded_ids: Vec<String>) -> Self {
        Self {
            loaded_count,
            failed_count,
            loaded_ids,
        }
    }

    /// ロードが完全に成功したかチェックします。
    ///
    /// # 例
    ///
    /// ```
    /// use otomoto_etl::domain::repositories::load_repository::LoadResult;
    ///
    /// assert!(LoadResult::new(10, 0, vec![]).is_success());
    /// assert!(!LoadResult::new(8, 2, vec![]).is_success());
    /// ```
    pub fn is_success(&self) -> bool {
        self.failed_count == 0
    }
}

/// ロードリポジトリ
///
/// 広告の書き込み先テーブルを担当するリポジトリ
#[async_trait]
pub trait LoadRepository: Send + Sync {
    /// 書き込み先テーブルの既存行を削除する（置換モード用）
    async fn clear_target(&self) -> Result<()>;

    /// バッチをロード
    ///
    /// # Errors
    ///
    /// リトライ後も書き込めなかった場合にエラーを返す
    async fn load_batch(&self, batch: &LoadBatch) -> Result<LoadResult>;
}
