//! # ETL Parameters DTO
//!
//! 1回のETL実行のパラメータ

use std::fmt;
use std::str::FromStr;

use crate::domain::entities::search_query::SearchQuery;

/// 書き込みモード
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// 既存の行を残して追記
    #[default]
    Append,
    /// ロード前にテーブルを空にする
    Replace,
}

impl FromStr for LoadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "replace" => Ok(Self::Replace),
            other => Err(format!(
                "unknown load mode '{}' (expected 'append' or 'replace')",
                other
            )),
        }
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Append => f.write_str("append"),
            Self::Replace => f.write_str("replace"),
        }
    }
}

/// ETLパラメータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlParams {
    /// ブランド（空文字は全ブランド）
    pub brand: String,
    /// モデル（空文字は全モデル）
    pub model: String,
    /// 何日前までの広告を残すか（負の値はフィルタなし）
    pub days_ago: i64,
    /// ページ取得の間に待機するか
    pub delay_scraping: bool,
    /// 書き込みモード
    pub how_add: LoadMode,
}

impl Default for EtlParams {
    /// 日次実行のデフォルト
    ///
    /// ```
    /// use otomoto_etl::application::dto::etl_params::{EtlParams, LoadMode};
    ///
    /// let params = EtlParams::default();
    /// assert_eq!(params.days_ago, 1);
    /// assert!(params.delay_scraping);
    /// assert_eq!(params.how_add, LoadMode::Append);
    /// ```
    fn default() -> Self {
        Self {
            brand: String::new(),
            model: String::new(),
            days_ago: 1,
            delay_scraping: true,
            how_add: LoadMode::Append,
        }
    }
}

impl EtlParams {
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery::new(&self.brand, &self.model)
    }
}
