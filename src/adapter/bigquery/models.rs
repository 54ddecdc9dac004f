use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};

use crate::domain::entities::listing::CarListing;

// The insertAll API expects JSON column values as pre-serialized JSON strings,
// which BigQuery then stores as native JSON type.
fn serialize_json_map_as_string<S>(
    value: &serde_json::Map<String, serde_json::Value>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&serde_json::Value::Object(value.clone()).to_string())
}

// Output for BigQuery
#[derive(Debug, Clone, Serialize)]
pub struct ListingRow {
    #[serde(skip)]
    pub insert_id: String,

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

    // Typed vehicle parameters
    pub make: Option<String>,
    pub model: Option<String>,
    pub fuel_type: Option<String>,
    pub gearbox: Option<String>,
    pub year: Option<i64>,
    pub mileage: Option<i64>,
    pub engine_capacity: Option<i64>,
    pub engine_power: Option<i64>,

    // Every scraped parameter, JSON column
    #[serde(serialize_with = "serialize_json_map_as_string")]
    pub parameters: serde_json::Map<String, serde_json::Value>,

    // Load metadata
    pub etl_run_id: String,
    pub search_url: String,
    pub loaded_at: DateTime<Utc>,
}

impl From<&CarListing> for ListingRow {
    fn from(listing: &CarListing) -> Self {
        Self {
            insert_id: listing.insert_id(),
            advert_id: listing.advert_id.clone(),
            url: listing.url.clone(),
            title: listing.title.clone(),
            short_description: listing.short_description.clone(),
            scrape_date: listing.scrape_date,
            created_date: listing.created_date,
            price: listing.price,
            currency: listing.currency.clone(),
            price_pln: listing.price_pln,
            cepik_verified: listing.cepik_verified,
            make: listing.specs.make.clone(),
            model: listing.specs.model.clone(),
            fuel_type: listing.specs.fuel_type.clone(),
            gearbox: listing.specs.gearbox.clone(),
            year: listing.specs.year,
            mileage: listing.specs.mileage,
            engine_capacity: listing.specs.engine_capacity,
            engine_power: listing.specs.engine_power,
            parameters: listing.parameters.clone(),
            etl_run_id: listing.metadata.etl_run_id.clone(),
            search_url: listing.metadata.search_url.clone(),
            loaded_at: listing.metadata.loaded_at,
        }
    }
}
