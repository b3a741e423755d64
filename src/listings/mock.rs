use super::traits::PropertySource;
use super::types::{PageRequest, QueryResult};
use crate::filters::apply_filters;
use crate::models::{Catalog, ListingStatus, LocalizedText, Location, Property};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tracing::{debug, info};

/// In-memory backend that filters a fixed collection, with simulated latency
pub struct MockPropertySource {
    properties: Vec<Property>,
    catalog: Catalog,
    latency: Duration,
}

impl MockPropertySource {
    /// Create a mock backend over the bundled sample listings
    pub fn new(latency: Duration) -> Self {
        Self::with_properties(sample_properties(), Catalog::default(), latency)
    }

    /// Create a mock backend over a custom collection
    pub fn with_properties(properties: Vec<Property>, catalog: Catalog, latency: Duration) -> Self {
        Self {
            properties,
            catalog,
            latency,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }
}

impl Default for MockPropertySource {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[async_trait]
impl PropertySource for MockPropertySource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<QueryResult> {
        debug!(
            page = request.page,
            limit = request.limit,
            "Querying {} mock listings",
            self.properties.len()
        );

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let result = apply_filters(
            &self.properties,
            &request.filters,
            request.page,
            request.limit,
            &self.catalog,
        );
        info!(
            page = request.page,
            total = result.total,
            "Returning {} listings",
            result.items.len()
        );
        Ok(result)
    }

    fn source_name(&self) -> &'static str {
        "Mock"
    }
}

fn location(city_ar: &str, city_en: &str, district_ar: &str, district_en: &str) -> Location {
    Location {
        city: LocalizedText::new(city_ar, city_en),
        district: LocalizedText::new(district_ar, district_en),
    }
}

#[allow(clippy::too_many_arguments)]
fn listing(
    id: &str,
    property_type: &str,
    status: ListingStatus,
    price: u64,
    area: u32,
    title: LocalizedText,
    location: Location,
    days_ago: i64,
) -> Property {
    Property {
        id: id.to_string(),
        title,
        location,
        property_type: property_type.to_string(),
        status,
        price,
        area,
        beds: None,
        baths: None,
        floor: None,
        finishing_status: None,
        amenities: vec![],
        is_in_compound: false,
        project_id: None,
        installments_available: None,
        real_estate_finance_available: None,
        delivery_immediate: false,
        listed_at: Utc::now() - ChronoDuration::days(days_ago),
    }
}

fn amenities(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

/// Sample listings across Greater Cairo and the North Coast
pub fn sample_properties() -> Vec<Property> {
    let new_cairo = || location("القاهرة", "Cairo", "التجمع الخامس", "New Cairo");
    let october = || location("الجيزة", "Giza", "السادس من أكتوبر", "6th of October");
    let zayed = || location("الجيزة", "Giza", "الشيخ زايد", "Sheikh Zayed");
    let madinaty = || location("القاهرة", "Cairo", "مدينتي", "Madinaty");
    let north_coast = || location("مطروح", "Matrouh", "الساحل الشمالي", "North Coast");

    vec![
        Property {
            beds: Some(3),
            baths: Some(2),
            floor: Some(5),
            finishing_status: Some("fully-finished".to_string()),
            amenities: amenities(&["pool", "gym", "security", "parking"]),
            is_in_compound: true,
            project_id: Some("mountain-view-icity".to_string()),
            installments_available: Some(true),
            real_estate_finance_available: Some(true),
            ..listing(
                "apt-icity-301",
                "Apartment",
                ListingStatus::ForSale,
                4_250_000,
                165,
                LocalizedText::new("شقة 3 غرف في ماونتن فيو آي سيتي", "3BR Apartment in Mountain View iCity"),
                new_cairo(),
                2,
            )
        },
        Property {
            beds: Some(2),
            baths: Some(1),
            floor: Some(2),
            finishing_status: Some("semi-finished".to_string()),
            amenities: amenities(&["security", "elevator"]),
            installments_available: Some(true),
            delivery_immediate: true,
            ..listing(
                "apt-narges-12",
                "Apartment",
                ListingStatus::ForSale,
                1_950_000,
                120,
                LocalizedText::new("شقة نصف تشطيب في النرجس", "Semi-finished Apartment in El Narges"),
                new_cairo(),
                5,
            )
        },
        Property {
            beds: Some(2),
            baths: Some(2),
            floor: Some(7),
            finishing_status: Some("furnished".to_string()),
            amenities: amenities(&["pool", "gym", "security", "elevator"]),
            is_in_compound: true,
            project_id: Some("madinaty".to_string()),
            delivery_immediate: true,
            ..listing(
                "apt-madinaty-rent-7",
                "Apartment",
                ListingStatus::ForRent,
                28_000,
                130,
                LocalizedText::new("شقة مفروشة للإيجار في مدينتي", "Furnished Apartment for Rent in Madinaty"),
                madinaty(),
                1,
            )
        },
        Property {
            beds: Some(5),
            baths: Some(4),
            finishing_status: Some("core-and-shell".to_string()),
            amenities: amenities(&["garden", "security", "clubhouse", "pool"]),
            is_in_compound: true,
            project_id: Some("palm-hills-october".to_string()),
            installments_available: Some(true),
            real_estate_finance_available: Some(false),
            ..listing(
                "villa-palm-hills-1",
                "Villa",
                ListingStatus::ForSale,
                18_500_000,
                420,
                LocalizedText::new("فيلا مستقلة في بالم هيلز أكتوبر", "Standalone Villa in Palm Hills October"),
                october(),
                9,
            )
        },
        Property {
            beds: Some(4),
            baths: Some(3),
            finishing_status: Some("fully-finished".to_string()),
            amenities: amenities(&["garden", "security", "parking"]),
            is_in_compound: true,
            real_estate_finance_available: Some(true),
            delivery_immediate: true,
            ..listing(
                "townhouse-zayed-4",
                "Townhouse",
                ListingStatus::ForSale,
                9_800_000,
                260,
                LocalizedText::new("تاون هاوس استلام فوري في الشيخ زايد", "Ready Townhouse in Sheikh Zayed"),
                zayed(),
                3,
            )
        },
        Property {
            beds: Some(3),
            baths: Some(3),
            finishing_status: Some("super-lux".to_string()),
            amenities: amenities(&["garden", "pool", "security"]),
            is_in_compound: true,
            project_id: Some("palm-hills-october".to_string()),
            ..listing(
                "twin-october-9",
                "Twin House",
                ListingStatus::ForRent,
                65_000,
                310,
                LocalizedText::new("توين هاوس سوبر لوكس للإيجار", "Super Lux Twin House for Rent"),
                october(),
                12,
            )
        },
        Property {
            beds: Some(2),
            baths: Some(2),
            finishing_status: Some("fully-finished".to_string()),
            amenities: amenities(&["pool", "security", "balcony"]),
            is_in_compound: true,
            project_id: Some("marassi".to_string()),
            installments_available: Some(true),
            ..listing(
                "chalet-marassi-22",
                "Chalet",
                ListingStatus::ForSale,
                7_400_000,
                115,
                LocalizedText::new("شاليه على البحر في مراسي", "Sea View Chalet in Marassi"),
                north_coast(),
                20,
            )
        },
        Property {
            beds: Some(4),
            baths: Some(3),
            floor: Some(12),
            finishing_status: Some("fully-finished".to_string()),
            amenities: amenities(&["pool", "gym", "security", "elevator", "parking"]),
            is_in_compound: true,
            project_id: Some("mountain-view-icity".to_string()),
            installments_available: Some(true),
            real_estate_finance_available: Some(true),
            ..listing(
                "penthouse-icity-12",
                "Penthouse",
                ListingStatus::ForSale,
                11_200_000,
                290,
                LocalizedText::new("بنتهاوس بتراس في آي سيتي", "Penthouse with Terrace in iCity"),
                new_cairo(),
                7,
            )
        },
        Property {
            beds: Some(1),
            baths: Some(1),
            floor: Some(3),
            finishing_status: Some("furnished".to_string()),
            amenities: amenities(&["elevator", "security"]),
            delivery_immediate: true,
            ..listing(
                "studio-zayed-3",
                "Studio",
                ListingStatus::ForRent,
                14_000,
                55,
                LocalizedText::new("ستوديو مفروش بالشيخ زايد", "Furnished Studio in Sheikh Zayed"),
                zayed(),
                4,
            )
        },
        Property {
            baths: Some(1),
            floor: Some(1),
            finishing_status: Some("semi-finished".to_string()),
            amenities: amenities(&["elevator", "parking", "security"]),
            installments_available: Some(true),
            ..listing(
                "office-90th-1",
                "Office",
                ListingStatus::ForSale,
                3_600_000,
                85,
                LocalizedText::new("مكتب إداري على شارع التسعين", "Office on 90th Street"),
                new_cairo(),
                15,
            )
        },
        Property {
            floor: Some(0),
            finishing_status: Some("core-and-shell".to_string()),
            amenities: amenities(&["parking"]),
            delivery_immediate: true,
            ..listing(
                "shop-october-g",
                "Shop",
                ListingStatus::ForRent,
                40_000,
                70,
                LocalizedText::new("محل تجاري دور أرضي في أكتوبر", "Ground Floor Shop in October"),
                october(),
                6,
            )
        },
        Property {
            baths: Some(1),
            floor: Some(2),
            finishing_status: Some("fully-finished".to_string()),
            amenities: amenities(&["elevator"]),
            ..listing(
                "clinic-madinaty-2",
                "Clinic",
                ListingStatus::ForSale,
                2_700_000,
                60,
                LocalizedText::new("عيادة في مول مدينتي", "Clinic in Madinaty Mall"),
                madinaty(),
                30,
            )
        },
        Property {
            installments_available: Some(false),
            delivery_immediate: true,
            ..listing(
                "land-zayed-600",
                "Land",
                ListingStatus::ForSale,
                12_000_000,
                600,
                LocalizedText::new("أرض سكنية في الشيخ زايد", "Residential Land in Sheikh Zayed"),
                zayed(),
                11,
            )
        },
        Property {
            beds: Some(4),
            baths: Some(3),
            floor: Some(1),
            finishing_status: Some("fully-finished".to_string()),
            amenities: amenities(&["garden", "security", "parking"]),
            is_in_compound: true,
            project_id: Some("madinaty".to_string()),
            real_estate_finance_available: Some(true),
            delivery_immediate: true,
            ..listing(
                "duplex-madinaty-b6",
                "Duplex",
                ListingStatus::ForSale,
                6_300_000,
                240,
                LocalizedText::new("دوبلكس بحديقة في مدينتي", "Duplex with Garden in Madinaty"),
                madinaty(),
                8,
            )
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::{sample_properties, MockPropertySource};
    use crate::filters::FilterSnapshot;
    use crate::listings::{PageRequest, PropertySource};
    use std::collections::HashSet;
    use std::time::Duration;

    #[test]
    fn sample_listings_are_consistent_with_the_catalog() {
        let source = MockPropertySource::default();
        let catalog = source.catalog();
        let ids: HashSet<_> = source.properties().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), sample_properties().len());

        for property in source.properties() {
            let info = catalog
                .property_type(&property.property_type)
                .expect("listing type is in the catalog");
            if let Some(finishing) = &property.finishing_status {
                assert!(info.has_finishing, "{} has finishing", property.id);
                assert!(catalog.has_finishing_status(finishing));
            }
            assert!(info.has_floor || property.floor.is_none(), "{}", property.id);
            assert!(info.has_beds || property.beds.is_none(), "{}", property.id);
            assert!(info.has_baths || property.baths.is_none(), "{}", property.id);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_a_filtered_page_after_the_latency() {
        let source = MockPropertySource::new(Duration::from_millis(300));
        let request = PageRequest {
            page: 1,
            limit: 3,
            filters: FilterSnapshot::from_query_string("status=for_sale&compound=yes").filters,
        };

        let started = tokio::time::Instant::now();
        let result = source.fetch_page(&request).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(300));

        assert_eq!(result.total, 6);
        assert_eq!(result.items.len(), 3);
        assert!(result
            .items
            .windows(2)
            .all(|pair| pair[0].listed_at >= pair[1].listed_at));
    }
}
