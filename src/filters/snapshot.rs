use super::params::{parse_number, FilterField, FilterValue, QueryParams, LIST_DELIMITER, PAGE_KEY};
use crate::models::ListingStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Listing status filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    ForSale,
    ForRent,
}

impl StatusFilter {
    pub fn as_token(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::ForSale => "for_sale",
            StatusFilter::ForRent => "for_rent",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "all" => Some(StatusFilter::All),
            "for_sale" => Some(StatusFilter::ForSale),
            "for_rent" => Some(StatusFilter::ForRent),
            _ => None,
        }
    }

    pub fn matches(self, status: ListingStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::ForSale => status == ListingStatus::ForSale,
            StatusFilter::ForRent => status == ListingStatus::ForRent,
        }
    }
}

/// Filter with an ignore state and a required value either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    #[default]
    All,
    Yes,
    No,
}

impl TriState {
    pub fn as_token(self) -> &'static str {
        match self {
            TriState::All => "all",
            TriState::Yes => "yes",
            TriState::No => "no",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "all" => Some(TriState::All),
            "yes" => Some(TriState::Yes),
            "no" => Some(TriState::No),
            _ => None,
        }
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            TriState::Yes
        } else {
            TriState::No
        }
    }

    /// `No` accepts a missing flag as well as an explicit `false`.
    pub fn matches(self, flag: Option<bool>) -> bool {
        match self {
            TriState::All => true,
            TriState::Yes => flag == Some(true),
            TriState::No => flag != Some(true),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryFilter {
    #[default]
    All,
    Immediate,
}

impl DeliveryFilter {
    pub fn as_token(self) -> &'static str {
        match self {
            DeliveryFilter::All => "all",
            DeliveryFilter::Immediate => "immediate",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "all" => Some(DeliveryFilter::All),
            "immediate" => Some(DeliveryFilter::Immediate),
            _ => None,
        }
    }
}

/// Every search filter, without the page.
///
/// `None`, `All` and empty collections are the defaults and never appear in
/// the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    pub status: StatusFilter,
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub query: String,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub project: Option<String>,
    pub finishing: Option<String>,
    pub installments: TriState,
    pub real_estate_finance: TriState,
    pub compound: TriState,
    pub delivery: DeliveryFilter,
    pub floor: Option<u32>,
    pub beds: Option<u32>,
    pub baths: Option<u32>,
    /// Minimum area in square meters.
    pub min_area: Option<u32>,
    pub amenities: BTreeSet<String>,
}

impl Filters {
    /// Reads filters from query parameters, falling back to defaults for
    /// missing or unusable values.
    pub fn from_params(params: &QueryParams) -> Self {
        let read = |field: FilterField| {
            params
                .get(field.key())
                .and_then(|raw| field.normalize(FilterValue::from(raw)))
        };
        let read_u32 = |field: FilterField| read(field).and_then(|value| value.parse::<u32>().ok());
        let read_u64 = |field: FilterField| read(field).and_then(|value| value.parse::<u64>().ok());

        Self {
            status: read(FilterField::Status)
                .and_then(|token| StatusFilter::from_token(&token))
                .unwrap_or_default(),
            property_type: read(FilterField::Type),
            query: read(FilterField::Query).unwrap_or_default(),
            min_price: read_u64(FilterField::MinPrice),
            max_price: read_u64(FilterField::MaxPrice),
            project: read(FilterField::Project),
            finishing: read(FilterField::Finishing),
            installments: read_tri_state(read(FilterField::Installments)),
            real_estate_finance: read_tri_state(read(FilterField::RealEstateFinance)),
            compound: read_tri_state(read(FilterField::Compound)),
            delivery: read(FilterField::Delivery)
                .and_then(|token| DeliveryFilter::from_token(&token))
                .unwrap_or_default(),
            floor: read_u32(FilterField::Floor),
            beds: read_u32(FilterField::Beds),
            baths: read_u32(FilterField::Baths),
            min_area: read_u32(FilterField::Area),
            amenities: read(FilterField::Amenities)
                .map(|joined| joined.split(LIST_DELIMITER).map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }

    /// Stored form of one field, `None` when it holds its default.
    pub fn value(&self, field: FilterField) -> Option<String> {
        let non_default = |token: &'static str| (token != "all").then(|| token.to_string());
        match field {
            FilterField::Status => non_default(self.status.as_token()),
            FilterField::Type => self.property_type.clone(),
            FilterField::Query => (!self.query.trim().is_empty()).then(|| self.query.clone()),
            FilterField::MinPrice => self.min_price.map(|value| value.to_string()),
            FilterField::MaxPrice => self.max_price.map(|value| value.to_string()),
            FilterField::Project => self.project.clone(),
            FilterField::Finishing => self.finishing.clone(),
            FilterField::Installments => non_default(self.installments.as_token()),
            FilterField::RealEstateFinance => non_default(self.real_estate_finance.as_token()),
            FilterField::Compound => non_default(self.compound.as_token()),
            FilterField::Delivery => non_default(self.delivery.as_token()),
            FilterField::Floor => self.floor.map(|value| value.to_string()),
            FilterField::Beds => self.beds.map(|value| value.to_string()),
            FilterField::Baths => self.baths.map(|value| value.to_string()),
            FilterField::Area => self.min_area.map(|value| value.to_string()),
            FilterField::Amenities => (!self.amenities.is_empty()).then(|| {
                self.amenities
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(LIST_DELIMITER)
            }),
        }
    }

    /// Writes every field into `params`, removing the keys of default fields.
    pub fn write_params(&self, params: &mut QueryParams) {
        for field in FilterField::ALL {
            match self
                .value(field)
                .and_then(|value| field.normalize(FilterValue::from(value)))
            {
                Some(value) => params.set(field.key(), value),
                None => {
                    params.remove(field.key());
                }
            }
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Filters::default()
    }
}

fn read_tri_state(token: Option<String>) -> TriState {
    token
        .and_then(|token| TriState::from_token(&token))
        .unwrap_or_default()
}

/// The complete filter state at a point in time: filters plus the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSnapshot {
    pub filters: Filters,
    pub page: u32,
}

impl Default for FilterSnapshot {
    fn default() -> Self {
        Self {
            filters: Filters::default(),
            page: 1,
        }
    }
}

impl FilterSnapshot {
    pub fn from_params(params: &QueryParams) -> Self {
        Self {
            filters: Filters::from_params(params),
            page: read_page(params),
        }
    }

    pub fn from_query_string(query: &str) -> Self {
        Self::from_params(&QueryParams::parse(query))
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        self.filters.write_params(&mut params);
        if self.page > 1 {
            params.set(PAGE_KEY, self.page.to_string());
        }
        params
    }

    pub fn to_query_string(&self) -> String {
        self.to_params().to_query_string()
    }
}

/// Missing, invalid and zero pages all read as the first page.
pub fn read_page(params: &QueryParams) -> u32 {
    params
        .get(PAGE_KEY)
        .and_then(parse_number)
        .and_then(|page| u32::try_from(page).ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}
