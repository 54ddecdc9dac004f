//! otomoto.pl Listing Repository Implementation
//!
//! ListingRepositoryのHTTP実装

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::adapter::otomoto::{parse_search_page, random_user_agent};
use crate::domain::entities::search_query::{SearchQuery, OTOMOTO_BASE_URL};
use crate::domain::repositories::listing_repository::{ListingRepository, SearchPage};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// otomoto.pl から検索結果ページを取得するリポジトリ
pub struct OtomotoListingRepository {
    client: reqwest::Client,
    base_url: String,
    dump_dir: Option<PathBuf>,
}

impl OtomotoListingRepository {
    /// 新しいリポジトリを作成
    ///
    /// User-Agentは実行ごとにランダムに選ばれる
    pub fn new() -> Result<Self> {
        let user_agent = random_user_agent();
        info!("Using User-Agent: {}", user_agent);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(user_agent));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: OTOMOTO_BASE_URL.to_string(),
            dump_dir: None,
        })
    }

    /// 検索のベースURLを差し替える
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 各ページの `__NEXT_DATA__` を `page-{n}.json` として保存する
    pub fn with_dump_dir(mut self, dump_dir: PathBuf) -> Self {
        self.dump_dir = Some(dump_dir);
        self
    }

    fn dump_page(&self, page: u32, next_data: &serde_json::Value) -> Result<()> {
        let Some(dir) = &self.dump_dir else {
            return Ok(());
        };

        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create dump directory: {}", dir.display()))?;
        let path = dir.join(format!("page-{}.json", page));
        let content = serde_json::to_string_pretty(next_data)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write page dump: {}", path.display()))?;

        debug!("Dumped page {} to {}", page, path.display());
        Ok(())
    }
}

#[async_trait]
impl ListingRepository for OtomotoListingRepository {
    async fn fetch_page(&self, query: &SearchQuery, page: u32) -> Result<Option<SearchPage>> {
        let url = query.url_with_base(&self.base_url, page);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to request {}", url))?;

        if response.status() != StatusCode::OK {
            warn!("Failed to fetch page {}: {}", page, response.status());
            return Ok(None);
        }

        let html = response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;

        let parsed = parse_search_page(&html);
        if let Some(next_data) = &parsed.next_data {
            if let Err(e) = self.dump_page(page, next_data) {
                warn!("{:#}", e);
            }
        }

        Ok(Some(parsed.page))
    }
}
