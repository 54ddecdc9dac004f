//! # Domain Services
//!
//! エンティティに属さないビジネスルール

pub mod deduplication;
pub mod freshness;
pub mod pagination;
