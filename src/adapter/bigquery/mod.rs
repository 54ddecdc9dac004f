//! BigQuery Adapter Modules
//!
//! BigQuery統合のためのアダプターモジュール

pub mod batch_uploader;
pub mod client;
pub mod models;
pub mod retry;
