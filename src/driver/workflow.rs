//! Workflow Orchestration
//!
//! ワークフローのオーケストレーション

use anyhow::{Context, Result};
use log::info;

use std::sync::Arc;

use crate::adapter::bigquery::client::{BigQueryClientFactory, RealClientFactory};
use crate::adapter::bigquery::retry::RetryPolicy;
use crate::adapter::config::Config;
use crate::adapter::repositories::bigquery_load_repository::BigQueryLoadRepository;
use crate::adapter::repositories::otomoto_listing_repository::OtomotoListingRepository;
use crate::application::dto::run_context::RunContext;
use crate::application::use_cases::extract_listings::ExtractListingsUseCase;
use crate::application::use_cases::load_listings::LoadListingsUseCase;
use crate::application::use_cases::transform_listings::TransformListingsUseCase;
use crate::domain::entities::listing::CarListing;
use crate::domain::repositories::listing_repository::ListingRepository;

use super::cli::Args;

/// Counts for one ETL run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EtlSummary {
    pub extracted: usize,
    pub transformed: usize,
    pub loaded: usize,
    pub failed: usize,
}

/// One line of dry-run output
pub fn format_listing_line(listing: &CarListing) -> String {
    format!(
        "    - ID: {} | {} | {} {} | Created: {}",
        listing.advert_id, listing.title, listing.price, listing.currency, listing.created_date
    )
}

/// Print the resolved environment (`show-config`)
pub fn show_config(config: &Config) {
    for (name, value) in config.env_pairs() {
        println!("{}={}", name, value);
    }
}

/// otomoto.pl → BigQuery ETL Workflow
pub struct EtlWorkflow {
    config: Config,
    listing_repository: Option<Arc<dyn ListingRepository>>,
    client_factory: Option<Arc<dyn BigQueryClientFactory>>,
    retry_policy: RetryPolicy,
}

impl EtlWorkflow {
    /// Create a workflow that talks to otomoto.pl and BigQuery
    pub fn new(config: Config) -> Self {
        Self {
            config,
            listing_repository: None,
            client_factory: None,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Use the given listing source instead of otomoto.pl
    pub fn with_listing_repository(mut self, repository: Arc<dyn ListingRepository>) -> Self {
        self.listing_repository = Some(repository);
        self
    }

    /// Use the given BigQuery client factory instead of authenticating
    pub fn with_client_factory(mut self, factory: Arc<dyn BigQueryClientFactory>) -> Self {
        self.client_factory = Some(factory);
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    fn listing_repository(&self, args: &Args) -> Result<Arc<dyn ListingRepository>> {
        if let Some(repository) = &self.listing_repository {
            return Ok(repository.clone());
        }

        let mut repository = OtomotoListingRepository::new()?;
        if let Some(dump_dir) = &args.dump_dir {
            repository = repository.with_dump_dir(dump_dir.clone());
        }
        Ok(Arc::new(repository))
    }

    fn client_factory(&self) -> Arc<dyn BigQueryClientFactory> {
        match &self.client_factory {
            Some(factory) => factory.clone(),
            None => Arc::new(RealClientFactory::new(
                self.config.service_account_key_path.clone(),
            )),
        }
    }

    /// Execute extract → transform → load
    pub async fn execute(&self, args: &Args) -> Result<EtlSummary> {
        let params = args.etl_params();
        let run = RunContext::start();

        info!("Starting otomoto.pl ETL run {}", run.etl_run_id);
        info!("Dry run: {}", args.dry_run);

        println!("✓ Using configuration:");
        println!("  Table: {}", self.config.table_ref());
        println!("  Search: {}", params.search_query().describe());
        println!("  Days ago: {}", params.days_ago);
        println!("  Mode: {}", params.how_add);

        // Extract
        let extract_use_case = ExtractListingsUseCase::new(self.listing_repository(args)?);
        let extracted = extract_use_case
            .execute(&params)
            .await
            .context("Extract step failed")?;
        println!(
            "✓ Extracted {} listings from {}/{} pages ({} ads reported)",
            extracted.listings.len(),
            extracted.pages_fetched,
            extracted.pages_total,
            extracted.total_ads
        );

        let mut summary = EtlSummary {
            extracted: extracted.listings.len(),
            ..EtlSummary::default()
        };

        // Transform
        let outcome = TransformListingsUseCase::new().execute(extracted.listings, &params, &run);
        summary.transformed = outcome.listings.len();
        println!(
            "✓ Transformed {} listings ({} rejected, {} older than {} days, {} duplicates)",
            outcome.listings.len(),
            outcome.rejected,
            outcome.stale,
            params.days_ago,
            outcome.duplicates
        );

        if outcome.listings.is_empty() {
            println!("No listings to load. Exiting.");
            return Ok(summary);
        }

        // Load
        if args.dry_run {
            println!("✓ Dry-run mode (not actually loading)");
            println!(
                "  Would {} {} rows into {}:",
                params.how_add,
                outcome.listings.len(),
                self.config.table_ref()
            );
            for listing in &outcome.listings {
                println!("{}", format_listing_line(listing));
            }
            return Ok(summary);
        }

        let load_repository = Arc::new(BigQueryLoadRepository::new(
            self.client_factory(),
            self.config.clone(),
            self.retry_policy.clone(),
        ));
        println!("✓ Created BigQuery client factory");

        let load_summary = LoadListingsUseCase::new(load_repository)
            .with_batch_pause(self.retry_policy.batch_delay)
            .execute(outcome.listings, self.config.load_batch_size, params.how_add)
            .await
            .context("Load step failed")?;

        summary.loaded = load_summary.loaded_count;
        summary.failed = load_summary.failed_count;
        println!(
            "✓ Loaded {} rows ({} failed)",
            load_summary.loaded_count, load_summary.failed_count
        );
        println!("✓ ETL complete!");

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::load_batch::test_support::create_test_listing;

    #[test]
    fn test_format_listing_line() {
        let line = format_listing_line(&create_test_listing("6100"));
        assert!(line.contains("ID: 6100"));
        assert!(line.contains("32000 PLN"));
        assert!(line.contains("Created: 2025-03-13"));
    }

    #[test]
    fn test_new_uses_live_sources() {
        let workflow = EtlWorkflow::new(Config::default());
        assert!(workflow.client_factory.is_none());
        assert!(workflow.listing_repository.is_none());
        assert_eq!(workflow.retry_policy, RetryPolicy::default());
    }
}
