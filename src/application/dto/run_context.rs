//! # Run Context DTO
//!
//! ETL実行ごとの識別情報

use chrono::{DateTime, NaiveDate, Utc};

/// 実行コンテキスト
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    /// 実行ID（全行に付与）
    pub etl_run_id: String,
    /// スクレイピング日（UTC）
    pub scrape_date: NaiveDate,
    /// 実行開始時刻
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    /// 現在時刻で新しい実行を開始
    pub fn start() -> Self {
        Self::at(uuid::Uuid::new_v4().to_string(), Utc::now())
    }

    pub fn at(etl_run_id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            etl_run_id,
            scrape_date: started_at.date_naive(),
            started_at,
        }
    }
}
