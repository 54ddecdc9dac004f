//! # SearchQuery Value Object
//!
//! otomoto.pl の検索条件

/// 乗用車検索のベースURL
pub const OTOMOTO_BASE_URL: &str = "https://www.otomoto.pl/osobowe";

/// 検索条件（ブランド・モデル）
///
/// 空文字は未指定として扱う
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    brand: Option<String>,
    model: Option<String>,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl SearchQuery {
    /// 新しい検索条件を作成
    pub fn new(brand: &str, model: &str) -> Self {
        Self {
            brand: non_blank(brand),
            model: non_blank(model),
        }
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// 指定ページの検索URLを返す
    ///
    /// # 例
    ///
    /// ```
    /// use otomoto_etl::domain::entities::search_query::SearchQuery;
    ///
    /// let query = SearchQuery::new("opel", "astra");
    /// assert_eq!(query.url(2), "https://www.otomoto.pl/osobowe/opel/astra?page=2");
    ///
    /// let all = SearchQuery::new("", "");
    /// assert_eq!(all.url(1), "https://www.otomoto.pl/osobowe?page=1");
    /// ```
    pub fn url(&self, page: u32) -> String {
        self.url_with_base(OTOMOTO_BASE_URL, page)
    }

    /// ベースURLを差し替えて検索URLを返す
    pub fn url_with_base(&self, base_url: &str, page: u32) -> String {
        let base_url = base_url.trim_end_matches('/');
        match (self.brand(), self.model()) {
            (Some(brand), Some(model)) => format!("{}/{}/{}?page={}", base_url, brand, model, page),
            (Some(brand), None) => format!("{}/{}?page={}", base_url, brand, page),
            (None, Some(model)) => format!("{}/{}?page={}", base_url, model, page),
            (None, None) => format!("{}?page={}", base_url, page),
        }
    }

    /// ログ表示用の説明
    pub fn describe(&self) -> String {
        match (self.brand(), self.model()) {
            (None, None) => "all cars".to_string(),
            (brand, model) => [brand, model]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}
