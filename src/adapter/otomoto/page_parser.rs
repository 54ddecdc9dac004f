//! Search Page Parser
//!
//! 検索結果ページ（HTML）のパース

use std::sync::OnceLock;

use log::warn;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use thiserror::Error;

use crate::domain::entities::listing::ListingInput;
use crate::domain::repositories::listing_repository::SearchPage;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("urqlState not found in page data")]
    MissingUrqlState,

    #[error("urqlState entry '{0}' has no data string")]
    MissingData(String),

    #[error("Failed to decode data for key '{key}': {source}")]
    InvalidData {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("advertSearch.edges not found for key '{0}'")]
    MissingEdges(String),
}

fn ad_count_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Liczba ogłoszeń:\s*<!--\s*-->\s*<b>([\d\s]+)</b>").ok())
        .as_ref()
}

/// Total number of ads shown on a search page
pub fn parse_total_ads(html: &str) -> Option<u64> {
    let captures = ad_count_regex()?.captures(html)?;
    let digits: String = captures[1].chars().filter(|c| !c.is_whitespace()).collect();
    digits.parse().ok()
}

/// The `<script id="__NEXT_DATA__">` payload, if the page has one
pub fn extract_next_data(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script#__NEXT_DATA__").ok()?;
    let script = document.select(&selector).next()?;
    let text: String = script.text().collect();

    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("__NEXT_DATA__ is not valid JSON: {}", e);
            None
        }
    }
}

fn edges_for_key(urql_state: &serde_json::Map<String, Value>, key: &str) -> Result<Vec<Value>, PageError> {
    let data = urql_state
        .get(key)
        .and_then(|entry| entry.get("data"))
        .and_then(Value::as_str)
        .ok_or_else(|| PageError::MissingData(key.to_string()))?;

    let decoded: Value = serde_json::from_str(data).map_err(|source| PageError::InvalidData {
        key: key.to_string(),
        source,
    })?;

    decoded
        .pointer("/advertSearch/edges")
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| PageError::MissingEdges(key.to_string()))
}

/// Listing edges from `props.pageProps.urqlState`
///
/// The last key usually holds the search results; the first key is the fallback.
pub fn extract_listing_edges(next_data: &Value) -> Result<Vec<Value>, PageError> {
    let urql_state = next_data
        .pointer("/props/pageProps/urqlState")
        .and_then(Value::as_object)
        .ok_or(PageError::MissingUrqlState)?;

    let last_key = urql_state.keys().last().ok_or(PageError::MissingUrqlState)?;
    match edges_for_key(urql_state, last_key) {
        Ok(edges) => Ok(edges),
        Err(e) => {
            warn!("{}, trying the first key", e);
            let first_key = urql_state.keys().next().ok_or(PageError::MissingUrqlState)?;
            edges_for_key(urql_state, first_key)
        }
    }
}

/// Decode edge nodes, skipping the ones that cannot be read
pub fn decode_listings(edges: &[Value]) -> Vec<ListingInput> {
    edges
        .iter()
        .filter_map(|edge| {
            let node = edge.get("node")?;
            match serde_json::from_value::<ListingInput>(node.clone()) {
                Ok(input) => Some(input),
                Err(e) => {
                    warn!("Skipping listing that could not be decoded: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Parsed page plus the raw payload (kept for dumping)
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    pub page: SearchPage,
    pub next_data: Option<Value>,
}

/// Parse a full search page
pub fn parse_search_page(html: &str) -> ParsedPage {
    let total_ads = parse_total_ads(html);
    let Some(next_data) = extract_next_data(html) else {
        return ParsedPage {
            page: SearchPage {
                total_ads,
                listings: None,
            },
            next_data: None,
        };
    };

    let listings = match extract_listing_edges(&next_data) {
        Ok(edges) => decode_listings(&edges),
        Err(e) => {
            warn!("No car data on page: {}", e);
            Vec::new()
        }
    };

    ParsedPage {
        page: SearchPage {
            total_ads,
            listings: Some(listings),
        },
        next_data: Some(next_data),
    }
}
