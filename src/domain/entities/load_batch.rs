//! # LoadBatch Value Object
//!
//! ロードバッチのバリューオブジェクト

use super::listing::CarListing;

/// ロードバッチ
///
/// 1回の insertAll リクエストで送る広告のまとまり
#[derive(Debug, Clone, Default)]
pub struct LoadBatch {
    listings: Vec<CarListing>,
}

impl LoadBatch {
    pub fn new(listings: Vec<CarListing>) -> Self {
        Self { listings }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn listings(&self) -> &[CarListing] {
        &self.listings
    }

    pub fn into_listings(self) -> Vec<CarListing> {
        self.listings
    }

    /// バッチをサイズで分割
    ///
    /// `batch_size` が0の場合は分割しない
    pub fn split_by_size(self, batch_size: usize) -> Vec<LoadBatch> {
        if batch_size == 0 {
            return vec![self];
        }

        self.listings
            .chunks(batch_size)
            .map(|chunk| LoadBatch::new(chunk.to_vec()))
            .collect()
    }

    /// バッチを中央で2つに分割
    ///
    /// 件数が1以下の場合は元のバッチと空のバッチを返す
    pub fn split_half(self) -> (LoadBatch, LoadBatch) {
        if self.listings.len() <= 1 {
            return (self, LoadBatch::default());
        }

        let mid = self.listings.len() / 2;
        let mut first = self.listings;
        let second = first.split_off(mid);

        (LoadBatch::new(first), LoadBatch::new(second))
    }
}

impl From<Vec<CarListing>> for LoadBatch {
    fn from(listings: Vec<CarListing>) -> Self {
        Self::new(listings)
    }
}

impl From<LoadBatch> for Vec<CarListing> {
    fn from(batch: LoadBatch) -> Self {
        batch.into_listings()
    }
}
