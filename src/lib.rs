//! # otomoto-etl
//!
//! otomoto.pl の中古車広告をスクレイピングし、BigQuery にロードする ETL ツール
//!
//! このプロジェクトはクリーンアーキテクチャを採用しており、以下の4層で構成されています：
//!
//! - **Domain層**: 広告エンティティ、重複排除・掲載日フィルタなどのルール（外部依存なし）
//! - **Application層**: Extract / Transform / Load のユースケース
//! - **Adapter層**: 外部システムとの統合（otomoto.pl, BigQuery, 環境変数）
//! - **Driver層**: CLI、依存性注入

// coverage_nightly cfg が設定されている場合のみ coverage_attribute を有効化
// カバレッジ計測時に外部サービス依存コードを除外するために使用
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

// Domain層（純粋なビジネスロジック）
pub mod domain;

// Application層（ユースケース）
pub mod application;

// Adapter層（Infrastructure）
pub mod adapter;

// Driver層（Presentation）
pub mod driver;
