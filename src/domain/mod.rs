//! # Domain Layer
//!
//! このモジュールはビジネスの核心的なルールとエンティティを定義します。
//!
//! ## 特徴
//!
//! - 外部依存を持たない（Rust標準ライブラリと最小限の依存のみ）
//! - HTTPやBigQueryについて何も知らない
//! - 純粋なビジネスロジック
//!
//! ## 構成要素
//!
//! - **entities**: ビジネスエンティティ（CarListing, SearchQuery, LoadBatch）
//! - **repositories**: Repository trait（インターフェース定義のみ）
//! - **services**: Domain Service（重複排除、掲載日フィルタ、ページ数計算）

pub mod entities;
pub mod repositories;
pub mod services;
