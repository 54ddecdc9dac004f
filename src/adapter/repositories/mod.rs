//! Repository Implementations
//!
//! Domain層のRepositoryトレイトの実装

pub mod bigquery_load_repository;
pub mod otomoto_listing_repository;
