//! # Data Transfer Objects

pub mod etl_params;
pub mod run_context;
