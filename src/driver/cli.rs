//! CLI Argument Parsing
//!
//! CLIの引数解析

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::dto::etl_params::{EtlParams, LoadMode};

/// otomoto.pl の中古車広告をBigQueryにロードするCLI
#[derive(Parser, Debug, Clone)]
#[command(name = "otomoto-etl")]
#[command(about = "Scrape otomoto.pl used car listings into BigQuery", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Car brand to search for (all brands when empty)
    #[arg(long, default_value = "")]
    pub brand: String,

    /// Car model to search for (all models when empty)
    #[arg(long, default_value = "")]
    pub model: String,

    /// Keep listings created at most this many days ago (negative disables the filter)
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub days_ago: i64,

    /// Don't wait between page requests
    #[arg(long)]
    pub no_delay: bool,

    /// How to write into the table: append or replace
    #[arg(long, default_value = "append")]
    pub how_add: LoadMode,

    /// Dry run mode - don't actually load
    #[arg(long)]
    pub dry_run: bool,

    /// Write each page's __NEXT_DATA__ JSON into this directory
    #[arg(long)]
    pub dump_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the resolved environment configuration and exit
    ShowConfig,
}

impl Args {
    pub fn etl_params(&self) -> EtlParams {
        EtlParams {
            brand: self.brand.clone(),
            model: self.model.clone(),
            days_ago: self.days_ago,
            delay_scraping: !self.no_delay,
            how_add: self.how_add,
        }
    }
}
