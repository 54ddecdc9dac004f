//! # Freshness Filter
//!
//! 掲載日による絞り込み

use chrono::Duration;

use crate::domain::entities::listing::CarListing;

pub struct FreshnessFilter;

impl FreshnessFilter {
    /// `days_ago` 日以内に掲載された広告だけを残す
    ///
    /// 基準日は各広告の `scrape_date`。負の値はフィルタ無効。
    /// 日付の範囲を超える値も全件を残す。
    pub fn retain_recent(listings: Vec<CarListing>, days_ago: i64) -> Vec<CarListing> {
        if days_ago < 0 {
            return listings;
        }
        let Some(window) = Duration::try_days(days_ago) else {
            return listings;
        };

        listings
            .into_iter()
            .filter(|listing| match listing.scrape_date.checked_sub_signed(window) {
                Some(cutoff) => listing.created_date >= cutoff,
                None => true,
            })
            .collect()
    }
}
