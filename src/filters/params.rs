use super::snapshot::{DeliveryFilter, StatusFilter, TriState};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use url::form_urlencoded;

/// Separator used to flatten list-valued filters into a single entry.
pub const LIST_DELIMITER: &str = ",";

/// Query key of the page number, which is not a filter field.
pub const PAGE_KEY: &str = "page";

/// Flat string-keyed view of a URL query string.
///
/// Keys are kept sorted so that equal maps always render to the same string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a query string, with or without the leading `?`. Empty values
    /// are dropped and the last occurrence of a repeated key wins.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let map = form_urlencoded::parse(query.as_bytes())
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Renders `application/x-www-form-urlencoded` without the leading `?`.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Every filter that can be written with `FilterStore::set_filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Status,
    Type,
    Query,
    MinPrice,
    MaxPrice,
    Project,
    Finishing,
    Installments,
    RealEstateFinance,
    Floor,
    Compound,
    Delivery,
    Amenities,
    Beds,
    Baths,
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Identifier,
    Number,
    List,
    Status,
    TriState,
    Delivery,
}

impl FilterField {
    pub const ALL: [FilterField; 16] = [
        FilterField::Status,
        FilterField::Type,
        FilterField::Query,
        FilterField::MinPrice,
        FilterField::MaxPrice,
        FilterField::Project,
        FilterField::Finishing,
        FilterField::Installments,
        FilterField::RealEstateFinance,
        FilterField::Floor,
        FilterField::Compound,
        FilterField::Delivery,
        FilterField::Amenities,
        FilterField::Beds,
        FilterField::Baths,
        FilterField::Area,
    ];

    /// URL query key of the field.
    pub fn key(self) -> &'static str {
        match self {
            FilterField::Status => "status",
            FilterField::Type => "type",
            FilterField::Query => "q",
            FilterField::MinPrice => "minPrice",
            FilterField::MaxPrice => "maxPrice",
            FilterField::Project => "project",
            FilterField::Finishing => "finishing",
            FilterField::Installments => "installments",
            FilterField::RealEstateFinance => "realEstateFinance",
            FilterField::Floor => "floor",
            FilterField::Compound => "compound",
            FilterField::Delivery => "delivery",
            FilterField::Amenities => "amenities",
            FilterField::Beds => "beds",
            FilterField::Baths => "baths",
            FilterField::Area => "area",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            FilterField::Query => FieldKind::Text,
            FilterField::Type | FilterField::Project | FilterField::Finishing => {
                FieldKind::Identifier
            }
            FilterField::MinPrice
            | FilterField::MaxPrice
            | FilterField::Floor
            | FilterField::Beds
            | FilterField::Baths
            | FilterField::Area => FieldKind::Number,
            FilterField::Amenities => FieldKind::List,
            FilterField::Status => FieldKind::Status,
            FilterField::Installments | FilterField::RealEstateFinance | FilterField::Compound => {
                FieldKind::TriState
            }
            FilterField::Delivery => FieldKind::Delivery,
        }
    }

    /// Canonical stored form of `value`, or `None` when the value is the
    /// field's default (or unusable) and the key must be absent.
    pub fn normalize(self, value: FilterValue) -> Option<String> {
        match self.kind() {
            FieldKind::Text => {
                let text = value.into_scalar();
                (!text.trim().is_empty()).then_some(text)
            }
            FieldKind::Identifier => {
                let id = value.into_scalar().trim().to_string();
                (!id.is_empty() && id != "all").then_some(id)
            }
            FieldKind::Number => parse_number(&value.into_scalar()).map(|n| n.to_string()),
            FieldKind::List => {
                let items: BTreeSet<String> = value.into_items().into_iter().collect();
                let joined = items
                    .into_iter()
                    .collect::<Vec<_>>()
                    .join(LIST_DELIMITER);
                (!joined.is_empty()).then_some(joined)
            }
            FieldKind::Status => StatusFilter::from_token(&value.into_scalar())
                .filter(|status| *status != StatusFilter::All)
                .map(|status| status.as_token().to_string()),
            FieldKind::TriState => TriState::from_token(&value.into_scalar())
                .filter(|state| *state != TriState::All)
                .map(|state| state.as_token().to_string()),
            FieldKind::Delivery => DeliveryFilter::from_token(&value.into_scalar())
                .filter(|delivery| *delivery != DeliveryFilter::All)
                .map(|delivery| delivery.as_token().to_string()),
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FilterField {
    type Err = UnknownFilterField;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        FilterField::ALL
            .into_iter()
            .find(|field| field.key() == key)
            .ok_or_else(|| UnknownFilterField(key.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter field `{0}`")]
pub struct UnknownFilterField(pub String);

/// Raw value handed to `FilterStore::set_filter`, typically straight from an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Scalar(String),
    List(Vec<String>),
}

impl FilterValue {
    fn into_scalar(self) -> String {
        match self {
            FilterValue::Scalar(value) => value,
            FilterValue::List(items) => items.join(LIST_DELIMITER),
        }
    }

    fn into_items(self) -> Vec<String> {
        let items = match self {
            FilterValue::Scalar(value) => vec![value],
            FilterValue::List(items) => items,
        };
        items
            .iter()
            .flat_map(|item| item.split(LIST_DELIMITER))
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Scalar(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Scalar(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(items: Vec<String>) -> Self {
        FilterValue::List(items)
    }
}

impl From<&[&str]> for FilterValue {
    fn from(items: &[&str]) -> Self {
        FilterValue::List(items.iter().map(|item| item.to_string()).collect())
    }
}

impl From<u64> for FilterValue {
    fn from(value: u64) -> Self {
        FilterValue::Scalar(value.to_string())
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Scalar(value.to_string())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Scalar(TriState::from_bool(value).as_token().to_string())
    }
}

impl From<StatusFilter> for FilterValue {
    fn from(value: StatusFilter) -> Self {
        FilterValue::Scalar(value.as_token().to_string())
    }
}

impl From<TriState> for FilterValue {
    fn from(value: TriState) -> Self {
        FilterValue::Scalar(value.as_token().to_string())
    }
}

impl From<DeliveryFilter> for FilterValue {
    fn from(value: DeliveryFilter) -> Self {
        FilterValue::Scalar(value.as_token().to_string())
    }
}

/// Parses a non-negative whole number from raw input. Anything else reads as absent.
pub fn parse_number(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(value) = raw.parse::<u64>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    // Whole floats ("1500000.0") are accepted, fractions are not.
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64)
        .then_some(value as u64)
}
