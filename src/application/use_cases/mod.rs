//! # Use Cases
//!
//! アプリケーションのビジネスフロー（ユースケース）
//!
//! ## ユースケース
//!
//! - **ExtractListingsUseCase**: 検索結果ページの巡回と広告の抽出
//! - **TransformListingsUseCase**: 行への変換、掲載日フィルタ、重複排除
//! - **LoadListingsUseCase**: バッチ分割とロード

pub mod extract_listings;
pub mod load_listings;
pub mod transform_listings;
