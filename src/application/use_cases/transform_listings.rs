//! # Transform Listings Use Case
//!
//! 抽出した広告を行に変換するユースケース

use log::warn;

use super::extract_listings::ExtractedListing;
use crate::application::dto::etl_params::EtlParams;
use crate::application::dto::run_context::RunContext;
use crate::domain::entities::listing::{CarListing, LoadMetadata};
use crate::domain::services::deduplication::DeduplicationService;
use crate::domain::services::freshness::FreshnessFilter;

/// 変換結果
#[derive(Debug, Clone, Default)]
pub struct TransformOutcome {
    pub listings: Vec<CarListing>,
    /// 広告IDがなく破棄した件数
    pub rejected: usize,
    /// 掲載日が古く除外した件数
    pub stale: usize,
    /// 重複として除外した件数
    pub duplicates: usize,
}

/// 広告変換ユースケース
#[derive(Debug, Default)]
pub struct TransformListingsUseCase;

impl TransformListingsUseCase {
    pub fn new() -> Self {
        Self
    }

    /// 広告を行に変換し、掲載日フィルタと重複排除を適用
    pub fn execute(
        &self,
        extracted: Vec<ExtractedListing>,
        params: &EtlParams,
        run: &RunContext,
    ) -> TransformOutcome {
        let mut rejected = 0;
        let mut rows = Vec::with_capacity(extracted.len());

        for ExtractedListing { input, search_url } in extracted {
            let metadata = LoadMetadata {
                etl_run_id: run.etl_run_id.clone(),
                search_url,
                loaded_at: run.started_at,
            };

            match CarListing::from_input(input, run.scrape_date, metadata) {
                Ok(listing) => rows.push(listing),
                Err(e) => {
                    warn!("Skipping listing: {}", e);
                    rejected += 1;
                }
            }
        }

        let before_filter = rows.len();
        let fresh = FreshnessFilter::retain_recent(rows, params.days_ago);
        let stale = before_filter - fresh.len();

        let before_dedup = fresh.len();
        let listings = DeduplicationService::filter_duplicates(fresh);
        let duplicates = before_dedup - listings.len();

        TransformOutcome {
            listings,
            rejected,
            stale,
            duplicates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;

    use crate::domain::entities::listing::ListingInput;

    fn run() -> RunContext {
        RunContext::at(
            "run-42".to_string(),
            Utc.with_ymd_and_hms(2025, 3, 14, 6, 30, 0).unwrap(),
        )
    }

    fn extracted(node: serde_json::Value) -> ExtractedListing {
        ExtractedListing {
            input: serde_json::from_value::<ListingInput>(node).unwrap(),
            search_url: "https://www.otomoto.pl/osobowe?page=1".to_string(),
        }
    }

    fn params(days_ago: i64) -> EtlParams {
        EtlParams {
            days_ago,
            ..EtlParams::default()
        }
    }

    #[test]
    fn test_transform_builds_rows_with_metadata() {
        let input = vec![extracted(json!({
            "id": "100",
            "title": "Opel Antara",
            "createdAt": "2025-03-14T05:00:00Z",
            "price": {"amount": {"units": 31000, "currencyCode": "PLN"}}
        }))];

        let outcome = TransformListingsUseCase::new().execute(input, &params(1), &run());

        assert_eq!(outcome.listings.len(), 1);
        let row = &outcome.listings[0];
        assert_eq!(row.advert_id, "100");
        assert_eq!(row.scrape_date, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        assert_eq!(row.metadata.etl_run_id, "run-42");
        assert_eq!(row.metadata.search_url, "https://www.otomoto.pl/osobowe?page=1");
        assert_eq!(row.price_pln, Some(31000));
    }

    #[test]
    fn test_transform_rejects_missing_id() {
        let input = vec![
            extracted(json!({"title": "no id", "createdAt": "2025-03-14T05:00:00Z"})),
            extracted(json!({"id": "1", "createdAt": "2025-03-14T05:00:00Z"})),
        ];

        let outcome = TransformListingsUseCase::new().execute(input, &params(1), &run());

        assert_eq!(outcome.rejected, 1);
        assert_eq!(outcome.listings.len(), 1);
    }

    #[test]
    fn test_transform_filters_stale_and_duplicates() {
        let input = vec![
            extracted(json!({"id": "1", "createdAt": "2025-03-14T05:00:00Z"})),
            extracted(json!({"id": "2", "createdAt": "2025-03-01T05:00:00Z"})),
            extracted(json!({"id": "1", "createdAt": "2025-03-14T05:00:00Z"})),
            extracted(json!({"id": "3"})),
        ];

        let outcome = TransformListingsUseCase::new().execute(input, &params(1), &run());

        assert_eq!(outcome.stale, 2);
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(outcome.listings.len(), 1);
        assert_eq!(outcome.listings[0].advert_id, "1");
    }

    #[test]
    fn test_transform_negative_days_keeps_everything() {
        let input = vec![
            extracted(json!({"id": "1", "createdAt": "2020-01-01T00:00:00Z"})),
            extracted(json!({"id": "2"})),
        ];

        let outcome = TransformListingsUseCase::new().execute(input, &params(-1), &run());

        assert_eq!(outcome.stale, 0);
        assert_eq!(outcome.listings.len(), 2);
    }

    #[test]
    fn test_transform_empty() {
        let outcome = TransformListingsUseCase::new().execute(vec![], &params(1), &run());
        assert!(outcome.listings.is_empty());
    }
}
