//! # Deduplication Service
//!
//! 重複排除サービス

use std::collections::HashSet;

use crate::domain::entities::listing::CarListing;

/// 重複排除サービス
///
/// ページ送り中に広告の並びがずれると同じ広告が複数ページに現れるため、
/// 1回の実行内で広告IDごとに最初の1件だけを残す
pub struct DeduplicationService;

impl DeduplicationService {
    /// 広告IDの重複を除外（出現順を維持）
    pub fn filter_duplicates(listings: Vec<CarListing>) -> Vec<CarListing> {
        let mut seen = HashSet::new();
        listings
            .into_iter()
            .filter(|listing| seen.insert(listing.advert_id.clone()))
            .collect()
    }

    /// 広告IDリストを抽出
    pub fn extract_advert_ids(listings: &[CarListing]) -> Vec<String> {
        listings.iter().map(|l| l.advert_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::load_batch::test_support::create_test_listing;

    #[test]
    fn test_filter_duplicates_keeps_first_occurrence() {
        let mut repeated = create_test_listing("ad-1");
        repeated.title = "second copy".to_string();

        let listings = vec![
            create_test_listing("ad-1"),
            create_test_listing("ad-2"),
            repeated,
            create_test_listing("ad-3"),
        ];

        let result = DeduplicationService::filter_duplicates(listings);

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].advert_id, "ad-1");
        assert_eq!(result[0].title, "Opel Astra");
        assert_eq!(result[1].advert_id, "ad-2");
        assert_eq!(result[2].advert_id, "ad-3");
    }

    #[test]
    fn test_filter_duplicates_empty() {
        let result = DeduplicationService::filter_duplicates(vec![]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_extract_advert_ids() {
        let listings = vec![create_test_listing("ad-1"), create_test_listing("ad-2")];

        let ids = DeduplicationService::extract_advert_ids(&listings);

        assert_eq!(ids, vec!["ad-1".to_string(), "ad-2".to_string()]);
    }
}
