//! # Listing Repository Trait
//!
//! 検索結果ページの取得を抽象化

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::listing::ListingInput;
use crate::domain::entities::search_query::SearchQuery;

/// 検索結果ページの中身
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// ページに表示された広告総数（見つからない場合は `None`）
    pub total_ads: Option<u64>,
    /// ページ内の広告
    ///
    /// - `None`: ページデータ自体が見つからない（サイト構造の変更）
    /// - `Some(vec![])`: ページデータはあるが広告がない
    pub listings: Option<Vec<ListingInput>>,
}

impl SearchPage {
    /// サイト構造が変わりページデータが取れなかったか
    pub fn is_structure_missing(&self) -> bool {
        self.listings.is_none()
    }
}

/// 広告リポジトリ
///
/// 検索結果ページの取得とパースを担当するリポジトリ
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// 検索結果ページを取得する
    ///
    /// # Arguments
    ///
    /// * `query` - 検索条件
    /// * `page` - ページ番号（1始まり）
    ///
    /// # Returns
    ///
    /// ページを取得できなかった場合（HTTP 200 以外）は `None`
    async fn fetch_page(&self, query: &SearchQuery, page: u32) -> Result<Option<SearchPage>>;
}
