//! # Extract Listings Use Case
//!
//! 検索結果ページを巡回して広告を抽出するユースケース

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{info, warn};
use rand::Rng;

use crate::application::dto::etl_params::EtlParams;
use crate::domain::entities::listing::ListingInput;
use crate::domain::repositories::listing_repository::ListingRepository;
use crate::domain::services::pagination::page_count;

/// ページ取得間の待機時間（ミリ秒の範囲）
pub const PAGE_DELAY_MS: Range<u64> = 1000..2500;

/// 抽出された広告と取得元URL
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedListing {
    pub input: ListingInput,
    pub search_url: String,
}

/// 抽出結果のサマリー
#[derive(Debug, Clone, Default)]
pub struct ExtractSummary {
    /// 1ページ目に表示された広告総数
    pub total_ads: u64,
    /// 巡回予定のページ数
    pub pages_total: u32,
    /// 実際に取得できたページ数
    pub pages_fetched: u32,
    pub listings: Vec<ExtractedListing>,
}

/// 広告抽出ユースケース
pub struct ExtractListingsUseCase<R: ListingRepository + ?Sized> {
    listing_repository: Arc<R>,
    page_delay_ms: Range<u64>,
}

impl<R: ListingRepository + ?Sized> ExtractListingsUseCase<R> {
    pub fn new(listing_repository: Arc<R>) -> Self {
        Self {
            listing_repository,
            page_delay_ms: PAGE_DELAY_MS,
        }
    }

    /// ページ取得間の待機時間を変更
    pub fn with_page_delay_ms(mut self, page_delay_ms: Range<u64>) -> Self {
        self.page_delay_ms = page_delay_ms;
        self
    }

    /// 全ページから広告を抽出
    ///
    /// # Errors
    ///
    /// - 1ページ目が取得できない、または広告総数が見つからない場合
    /// - リポジトリがエラーを返した場合
    pub async fn execute(&self, params: &EtlParams) -> Result<ExtractSummary> {
        let query = params.search_query();
        let first_url = query.url(1);

        let first_page = self
            .listing_repository
            .fetch_page(&query, 1)
            .await?
            .ok_or_else(|| anyhow!("Failed to fetch first search page: {}", first_url))?;

        let total_ads = first_page
            .total_ads
            .ok_or_else(|| anyhow!("Could not find the number of ads on {}", first_url))?;

        let mut summary = ExtractSummary {
            total_ads,
            pages_total: page_count(total_ads),
            ..ExtractSummary::default()
        };
        info!(
            "{} ads found for {} ({} pages)",
            total_ads,
            query.describe(),
            summary.pages_total
        );

        let mut first_page = Some(first_page);

        for page_num in 1..=summary.pages_total {
            info!(
                "Extract data for: {}. Page number: {}/{}",
                query.describe(),
                page_num,
                summary.pages_total
            );

            let page = match first_page.take() {
                Some(page) => Some(page),
                None => {
                    if params.delay_scraping {
                        self.pause().await;
                    }
                    self.listing_repository.fetch_page(&query, page_num).await?
                }
            };

            let Some(page) = page else {
                warn!("Skipping page {}: search page could not be fetched", page_num);
                continue;
            };
            summary.pages_fetched += 1;

            if page.is_structure_missing() {
                warn!(
                    "No car listings found on page {}. The website structure may have changed.",
                    page_num
                );
                break;
            }

            let listings = page.listings.unwrap_or_default();
            if listings.is_empty() {
                warn!("No car data on page {}", page_num);
                continue;
            }

            let search_url = query.url(page_num);
            summary
                .listings
                .extend(listings.into_iter().map(|input| ExtractedListing {
                    input,
                    search_url: search_url.clone(),
                }));
        }

        Ok(summary)
    }

    async fn pause(&self) {
        if self.page_delay_ms.is_empty() {
            return;
        }
        let millis = rand::thread_rng().gen_range(self.page_delay_ms.clone());
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}
