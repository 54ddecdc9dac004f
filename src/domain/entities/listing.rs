//! # Listing Entity
//!
//! 中古車広告のドメインエンティティ

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

/// 作成日が取得できない広告に付与する日付
pub const UNKNOWN_CREATED_DATE: &str = "1900-01-01";

/// 通貨が取得できない広告に付与する通貨コード
pub const UNKNOWN_CURRENCY: &str = "UNKNOWN";

/// 数値または数値文字列を整数として読み取る
///
/// `"120 000 km"` のような表記は空白を除去し、先頭の数字列のみを使う。
/// 数字で始まらない値は `None`。
pub fn coerce_integer(raw: &str) -> Option<i64> {
    let digits: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// JSON値を整数として読み取る（数値・数値文字列の両方を許容）
pub fn lenient_i64(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => coerce_integer(s),
        _ => None,
    }
}

fn deserialize_lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(lenient_i64))
}

fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

/// 広告パラメータ（例: `year`, `mileage`）
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ListingParameter {
    #[serde(default)]
    pub key: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceAmount {
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    pub units: Option<i64>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ListingPrice {
    #[serde(default)]
    pub amount: Option<PriceAmount>,
}

/// 検索結果ページから取り出した広告ノード
///
/// 欠けているフィールドは変換時にデフォルト値で埋める
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingInput {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub price: Option<ListingPrice>,
    #[serde(default)]
    pub cepik_verified: Option<bool>,
    #[serde(default)]
    pub parameters: Vec<ListingParameter>,
}

impl ListingInput {
    /// 広告ID（空文字は未設定扱い）
    pub fn advert_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// 車両スペック
///
/// 動的パラメータのうち型付けして保存する項目
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleSpecs {
    pub make: Option<String>,
    pub model: Option<String>,
    pub fuel_type: Option<String>,
    pub gearbox: Option<String>,
    pub year: Option<i64>,
    pub mileage: Option<i64>,
    pub engine_capacity: Option<i64>,
    pub engine_power: Option<i64>,
}

impl VehicleSpecs {
    /// パラメータ一覧からスペックを抽出
    ///
    /// 数値項目が数値でない場合は `None` になり、行全体は失敗しない
    pub fn from_parameters(parameters: &serde_json::Map<String, serde_json::Value>) -> Self {
        let text = |key: &str| {
            parameters
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let number = |key: &str| parameters.get(key).and_then(lenient_i64);

        Self {
            make: text("make"),
            model: text("model"),
            fuel_type: text("fuel_type"),
            gearbox: text("gearbox"),
            year: number("year"),
            mileage: number("mileage"),
            engine_capacity: number("engine_capacity"),
            engine_power: number("engine_power"),
        }
    }
}

/// ロードメタデータ
///
/// ETL実行ごとに広告へ付与する情報
#[derive(Debug, Clone, PartialEq)]
pub struct LoadMetadata {
    pub etl_run_id: String,
    pub search_url: String,
    pub loaded_at: DateTime<Utc>,
}

/// 中古車広告のドメインエンティティ
///
/// BigQuery の1行に対応する
#[derive(Debug, Clone, PartialEq)]
pub struct CarListing {
    pub advert_id: String,
    pub url: Option<String>,
    pub title: String,
    pub short_description: String,
    pub scrape_date: NaiveDate,
    pub created_date: NaiveDate,
    pub price: i64,
    pub currency: String,
    pub price_pln: Option<i64>,
    pub cepik_verified: bool,
    pub specs: VehicleSpecs,
    /// 全パラメータ（キー順は取得順）
    pub parameters: serde_json::Map<String, serde_json::Value>,
    pub metadata: LoadMetadata,
}

impl CarListing {
    /// 広告ノードから行を作成
    ///
    /// # Errors
    ///
    /// 広告IDが空の場合にエラーを返す
    pub fn from_input(
        input: ListingInput,
        scrape_date: NaiveDate,
        metadata: LoadMetadata,
    ) -> anyhow::Result<Self> {
        let advert_id = match input.advert_id() {
            Some(id) => id.to_string(),
            None => anyhow::bail!("Advert id cannot be empty"),
        };

        let amount = input
            .price
            .and_then(|p| p.amount)
            .unwrap_or_default();
        let price = amount.units.unwrap_or(0);
        let currency = amount
            .currency_code
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| UNKNOWN_CURRENCY.to_string());
        let price_pln = currency.eq_ignore_ascii_case("PLN").then_some(price);

        let mut parameters = serde_json::Map::new();
        for param in input.parameters {
            if param.key.is_empty() {
                continue;
            }
            let value = param
                .value
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null);
            parameters.insert(param.key, value);
        }

        Ok(Self {
            advert_id,
            url: input.url,
            title: input.title.unwrap_or_default(),
            short_description: input.short_description.unwrap_or_default(),
            scrape_date,
            created_date: parse_created_date(input.created_at.as_deref()),
            price,
            currency,
            price_pln,
            cepik_verified: input.cepik_verified.unwrap_or(false),
            specs: VehicleSpecs::from_parameters(&parameters),
            parameters,
            metadata,
        })
    }

    /// BigQuery の insertId（1広告につき1日1行）
    pub fn insert_id(&self) -> String {
        format!("{}-{}", self.advert_id, self.scrape_date)
    }
}

/// `createdAt` の先頭10文字を日付として解釈
///
/// 解釈できない場合は [`UNKNOWN_CREATED_DATE`]
pub fn parse_created_date(raw: Option<&str>) -> NaiveDate {
    raw.and_then(|s| s.get(0..10))
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .or_else(|| NaiveDate::parse_from_str(UNKNOWN_CREATED_DATE, "%Y-%m-%d").ok())
        .unwrap_or_default()
}
