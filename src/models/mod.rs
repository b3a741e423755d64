pub mod catalog;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use catalog::{Catalog, CatalogEntry, PropertyTypeInfo};

/// Text carried in both marketplace languages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LocalizedText {
    pub ar: String,
    pub en: String,
}

impl LocalizedText {
    pub fn new(ar: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            ar: ar.into(),
            en: en.into(),
        }
    }

    /// Case-insensitive substring match against either language.
    pub fn contains_ignore_case(&self, needle_lowercase: &str) -> bool {
        self.ar.to_lowercase().contains(needle_lowercase)
            || self.en.to_lowercase().contains(needle_lowercase)
    }
}

/// Whether a listing is offered for sale or for rent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ListingStatus {
    #[serde(rename = "For Sale")]
    ForSale,
    #[serde(rename = "For Rent")]
    ForRent,
}

/// Location information for a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub city: LocalizedText,
    pub district: LocalizedText,
}

/// Core property data model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub title: LocalizedText,
    pub location: Location,
    /// Catalog identifier, e.g. `Apartment` or `Land`.
    pub property_type: String,
    pub status: ListingStatus,
    /// Asking price (or monthly rent) in EGP.
    pub price: u64,
    /// Built-up or plot area in square meters.
    pub area: u32,
    pub beds: Option<u32>,
    pub baths: Option<u32>,
    pub floor: Option<u32>,
    pub finishing_status: Option<String>,
    pub amenities: Vec<String>,
    pub is_in_compound: bool,
    pub project_id: Option<String>,
    pub installments_available: Option<bool>,
    pub real_estate_finance_available: Option<bool>,
    pub delivery_immediate: bool,
    pub listed_at: DateTime<Utc>,
}

impl Property {
    pub fn has_amenity(&self, amenity: &str) -> bool {
        self.amenities.iter().any(|candidate| candidate == amenity)
    }
}
