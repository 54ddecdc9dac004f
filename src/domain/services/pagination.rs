//! # Pagination
//!
//! 検索結果のページ数計算

/// 1ページあたりの広告数
pub const ADS_PER_PAGE: u64 = 32;

/// 広告総数からページ数を計算
///
/// ```
/// use otomoto_etl::domain::services::pagination::page_count;
///
/// assert_eq!(page_count(0), 0);
/// assert_eq!(page_count(32), 1);
/// assert_eq!(page_count(33), 2);
/// ```
pub fn page_count(total_ads: u64) -> u32 {
    let pages = total_ads.div_ceil(ADS_PER_PAGE);
    u32::try_from(pages).unwrap_or(u32::MAX)
}
