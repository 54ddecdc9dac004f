//! Adapter Layer
//!
//! 外部システム（otomoto.pl, BigQuery, 環境変数）との統合

pub mod auth;
pub mod bigquery;
pub mod config;
pub mod otomoto;
pub mod repositories;
