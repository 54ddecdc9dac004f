//! # Domain Entities
//!
//! ビジネスエンティティとバリューオブジェクトを定義するモジュール
//!
//! ## エンティティ
//!
//! - **CarListing**: 中古車広告（BigQuery の1行）
//! - **SearchQuery**: 検索条件とURL生成
//! - **LoadBatch**: ロードバッチのバリューオブジェクト

pub mod listing;
pub mod load_batch;
pub mod search_query;
