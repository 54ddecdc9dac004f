//! otomoto-etl - Used Car Listings Loader
//!
//! otomoto.pl の中古車広告を BigQuery にロード

// coverage_nightly cfg が設定されている場合のみ coverage_attribute を有効化
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use anyhow::Result;
use clap::Parser;

use otomoto_etl::adapter::config::Config;
use otomoto_etl::driver::workflow::show_config;
use otomoto_etl::driver::{Args, Command, EtlWorkflow};

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    // Configuration comes from the container environment
    let config = Config::from_env()?;

    if let Some(Command::ShowConfig) = args.command {
        show_config(&config);
        return Ok(());
    }

    let workflow = EtlWorkflow::new(config);
    workflow.execute(&args).await?;

    Ok(())
}
