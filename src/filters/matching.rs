use super::snapshot::{DeliveryFilter, Filters, StatusFilter};
use crate::listings::QueryResult;
use crate::models::{Catalog, Property};
use std::cmp::Reverse;

/// Checks one property against every active filter.
///
/// Filters at their default are skipped. Attributes the active type filter
/// does not have (finishing for land, floor for villas, ...) are skipped as
/// well, and so are the sale financing filters while browsing rentals.
pub fn matches(property: &Property, filters: &Filters, catalog: &Catalog) -> bool {
    let type_filter = filters.property_type.as_deref();

    if !filters.status.matches(property.status) {
        return false;
    }
    if type_filter.is_some_and(|property_type| property.property_type != property_type) {
        return false;
    }

    let query = filters.query.trim();
    if !query.is_empty() {
        let needle = query.to_lowercase();
        let found = property.title.contains_ignore_case(&needle)
            || property.location.district.contains_ignore_case(&needle)
            || property.location.city.contains_ignore_case(&needle);
        if !found {
            return false;
        }
    }

    if filters.min_price.is_some_and(|min| property.price < min)
        || filters.max_price.is_some_and(|max| property.price > max)
    {
        return false;
    }

    if let Some(project) = &filters.project {
        if property.project_id.as_ref() != Some(project) {
            return false;
        }
    }

    if let Some(finishing) = &filters.finishing {
        if catalog.finishing_applies(type_filter)
            && property.finishing_status.as_ref() != Some(finishing)
        {
            return false;
        }
    }

    if filters.status != StatusFilter::ForRent
        && !(filters.installments.matches(property.installments_available)
            && filters
                .real_estate_finance
                .matches(property.real_estate_finance_available))
    {
        return false;
    }

    if !filters.compound.matches(Some(property.is_in_compound)) {
        return false;
    }

    if filters.delivery == DeliveryFilter::Immediate && !property.delivery_immediate {
        return false;
    }

    if !at_least(filters.floor, property.floor, catalog.floor_applies(type_filter))
        || !at_least(filters.beds, property.beds, catalog.beds_apply(type_filter))
        || !at_least(filters.baths, property.baths, catalog.baths_apply(type_filter))
        || !at_least(filters.min_area, Some(property.area), true)
    {
        return false;
    }

    filters
        .amenities
        .iter()
        .all(|amenity| property.has_amenity(amenity))
}

/// "N or more" check; a property without the attribute fails an active minimum.
fn at_least(minimum: Option<u32>, value: Option<u32>, applicable: bool) -> bool {
    match minimum {
        Some(minimum) if applicable => value.is_some_and(|value| value >= minimum),
        _ => true,
    }
}

/// Filters the whole collection, sorts the matches newest first and cuts out
/// the requested page. Pages past the end come back empty with the full total.
pub fn apply_filters(
    properties: &[Property],
    filters: &Filters,
    page: u32,
    limit: usize,
    catalog: &Catalog,
) -> QueryResult {
    let mut matched: Vec<&Property> = properties
        .iter()
        .filter(|property| matches(property, filters, catalog))
        .collect();
    matched.sort_by_key(|property| Reverse(property.listed_at));

    let total = matched.len();
    let offset = (page.max(1) as usize - 1).saturating_mul(limit);
    let items = matched
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    QueryResult { items, total }
}

#[cfg(test)]
mod tests {
    use super::{apply_filters, matches};
    use crate::filters::{DeliveryFilter, FilterSnapshot, Filters, StatusFilter, TriState};
    use crate::models::{Catalog, ListingStatus, LocalizedText, Location, Property};
    use chrono::{Duration, TimeZone, Utc};

    fn apartment() -> Property {
        Property {
            id: "p-1".to_string(),
            title: LocalizedText::new("شقة للبيع في مدينتي", "Apartment for sale in Madinaty"),
            location: Location {
                city: LocalizedText::new("القاهرة", "Cairo"),
                district: LocalizedText::new("مدينتي", "Madinaty"),
            },
            property_type: "Apartment".to_string(),
            status: ListingStatus::ForSale,
            price: 2_000_000,
            area: 140,
            beds: Some(3),
            baths: Some(2),
            floor: Some(4),
            finishing_status: Some("fully-finished".to_string()),
            amenities: vec!["pool".to_string(), "security".to_string()],
            is_in_compound: true,
            project_id: Some("madinaty".to_string()),
            installments_available: Some(true),
            real_estate_finance_available: None,
            delivery_immediate: true,
            listed_at: Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap(),
        }
    }

    fn land() -> Property {
        Property {
            id: "p-land".to_string(),
            title: LocalizedText::new("أرض في الشيخ زايد", "Land plot in Sheikh Zayed"),
            property_type: "Land".to_string(),
            area: 600,
            beds: None,
            baths: None,
            floor: None,
            finishing_status: None,
            amenities: vec![],
            ..apartment()
        }
    }

    fn filters(query: &str) -> Filters {
        FilterSnapshot::from_query_string(query).filters
    }

    #[test]
    fn matches_the_reference_apartment() {
        let catalog = Catalog::default();
        let active = filters(
            "status=for_sale&type=Apartment&minPrice=1000000&maxPrice=3000000&beds=3",
        );
        assert!(matches(&apartment(), &active, &catalog));

        let too_cheap = Filters {
            max_price: Some(1_500_000),
            ..active
        };
        assert!(!matches(&apartment(), &too_cheap, &catalog));
    }

    #[test]
    fn default_filters_match_everything() {
        let catalog = Catalog::default();
        assert!(matches(&apartment(), &Filters::default(), &catalog));
        assert!(matches(&land(), &Filters::default(), &catalog));
    }

    #[test]
    fn price_bounds_are_inclusive_and_crossed_bounds_match_nothing() {
        let catalog = Catalog::default();
        assert!(matches(&apartment(), &filters("minPrice=2000000&maxPrice=2000000"), &catalog));
        assert!(!matches(&apartment(), &filters("minPrice=3000000&maxPrice=1000000"), &catalog));
    }

    #[test]
    fn finishing_excludes_land_unless_land_is_the_active_type() {
        let catalog = Catalog::default();
        assert!(!matches(&land(), &filters("finishing=fully-finished"), &catalog));
        assert!(matches(&apartment(), &filters("finishing=fully-finished"), &catalog));
        assert!(matches(&land(), &filters("type=Land&finishing=fully-finished"), &catalog));
    }

    #[test]
    fn financing_filters_are_ignored_for_rentals() {
        let catalog = Catalog::default();
        let rental = Property {
            status: ListingStatus::ForRent,
            installments_available: Some(false),
            real_estate_finance_available: Some(false),
            ..apartment()
        };
        let active = Filters {
            status: StatusFilter::ForRent,
            installments: TriState::Yes,
            real_estate_finance: TriState::Yes,
            ..Filters::default()
        };
        assert!(matches(&rental, &active, &catalog));

        let for_sale = Filters {
            status: StatusFilter::All,
            ..active
        };
        assert!(!matches(&rental, &for_sale, &catalog));
    }

    #[test]
    fn tri_states_and_delivery() {
        let catalog = Catalog::default();
        let property = apartment();
        assert!(matches(&property, &filters("installments=yes&realEstateFinance=no"), &catalog));
        assert!(!matches(&property, &filters("realEstateFinance=yes"), &catalog));
        assert!(!matches(&property, &filters("compound=no"), &catalog));

        let off_plan = Property {
            delivery_immediate: false,
            ..apartment()
        };
        let immediate = Filters {
            delivery: DeliveryFilter::Immediate,
            ..Filters::default()
        };
        assert!(!matches(&off_plan, &immediate, &catalog));
        assert!(matches(&property, &immediate, &catalog));
    }

    #[test]
    fn minimums_skip_inapplicable_types() {
        let catalog = Catalog::default();
        assert!(matches(&apartment(), &filters("floor=4&beds=3&baths=2&area=140"), &catalog));
        assert!(!matches(&apartment(), &filters("floor=5"), &catalog));
        assert!(!matches(&land(), &filters("beds=1"), &catalog));
        assert!(matches(&land(), &filters("type=Land&beds=1&baths=1&floor=2"), &catalog));
        assert!(!matches(&land(), &filters("type=Land&area=700"), &catalog));
    }

    #[test]
    fn amenities_require_all_requested() {
        let catalog = Catalog::default();
        assert!(matches(&apartment(), &filters("amenities=pool,security"), &catalog));
        assert!(!matches(&apartment(), &filters("amenities=pool,gym"), &catalog));
    }

    #[test]
    fn query_is_a_case_insensitive_substring() {
        let catalog = Catalog::default();
        assert!(matches(&apartment(), &filters("q=MADINATY"), &catalog));
        assert!(matches(&apartment(), &filters("q=%D9%85%D8%AF%D9%8A%D9%86%D8%AA%D9%8A"), &catalog));
        assert!(!matches(&apartment(), &filters("q=villa"), &catalog));
    }

    #[test]
    fn paginates_newest_first_and_past_the_end() {
        let catalog = Catalog::default();
        let base = apartment();
        let properties: Vec<Property> = (0..12)
            .map(|n| Property {
                id: format!("p-{n}"),
                listed_at: base.listed_at + Duration::days(n),
                ..base.clone()
            })
            .chain(std::iter::once(land()))
            .collect();
        let apartments = filters("type=Apartment");

        let first = apply_filters(&properties, &apartments, 1, 10, &catalog);
        assert_eq!(first.total, 12);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].id, "p-11");

        let second = apply_filters(&properties, &apartments, 2, 10, &catalog);
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.items[1].id, "p-0");

        let beyond = apply_filters(&properties, &apartments, 5, 10, &catalog);
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 12);
    }
}
