use super::LocalizedText;
use serde::{Deserialize, Serialize};

/// A property type together with the listing attributes that make sense for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyTypeInfo {
    pub id: String,
    pub name: LocalizedText,
    pub has_finishing: bool,
    pub has_floor: bool,
    pub has_beds: bool,
    pub has_baths: bool,
}

/// Identifier with a bilingual display name (finishing statuses, amenities, projects).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub name: LocalizedText,
}

/// Reference data the filters are validated and applied against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub property_types: Vec<PropertyTypeInfo>,
    pub finishing_statuses: Vec<CatalogEntry>,
    pub amenities: Vec<CatalogEntry>,
    pub projects: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn property_type(&self, id: &str) -> Option<&PropertyTypeInfo> {
        self.property_types.iter().find(|info| info.id == id)
    }

    pub fn has_finishing_status(&self, id: &str) -> bool {
        self.finishing_statuses.iter().any(|entry| entry.id == id)
    }

    pub fn property_type_ids(&self) -> Vec<String> {
        self.property_types.iter().map(|info| info.id.clone()).collect()
    }

    pub fn finishing_status_ids(&self) -> Vec<String> {
        self.finishing_statuses
            .iter()
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Whether `finishing` applies to the given type filter. Unknown types and
    /// the `all` filter (`None`) keep the attribute applicable.
    pub fn finishing_applies(&self, type_filter: Option<&str>) -> bool {
        self.applies(type_filter, |info| info.has_finishing)
    }

    pub fn floor_applies(&self, type_filter: Option<&str>) -> bool {
        self.applies(type_filter, |info| info.has_floor)
    }

    pub fn beds_apply(&self, type_filter: Option<&str>) -> bool {
        self.applies(type_filter, |info| info.has_beds)
    }

    pub fn baths_apply(&self, type_filter: Option<&str>) -> bool {
        self.applies(type_filter, |info| info.has_baths)
    }

    fn applies(&self, type_filter: Option<&str>, flag: impl Fn(&PropertyTypeInfo) -> bool) -> bool {
        type_filter
            .and_then(|id| self.property_type(id))
            .map_or(true, flag)
    }
}

fn property_type(
    id: &str,
    ar: &str,
    has_finishing: bool,
    has_floor: bool,
    has_beds: bool,
    has_baths: bool,
) -> PropertyTypeInfo {
    PropertyTypeInfo {
        id: id.to_string(),
        name: LocalizedText::new(ar, id),
        has_finishing,
        has_floor,
        has_beds,
        has_baths,
    }
}

fn entry(id: &str, ar: &str, en: &str) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        name: LocalizedText::new(ar, en),
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            property_types: vec![
                property_type("Apartment", "شقة", true, true, true, true),
                property_type("Duplex", "دوبلكس", true, true, true, true),
                property_type("Penthouse", "بنتهاوس", true, true, true, true),
                property_type("Studio", "ستوديو", true, true, true, true),
                property_type("Villa", "فيلا", true, false, true, true),
                property_type("Townhouse", "تاون هاوس", true, false, true, true),
                property_type("Twin House", "توين هاوس", true, false, true, true),
                property_type("Chalet", "شاليه", true, false, true, true),
                property_type("Office", "مكتب إداري", true, true, false, true),
                property_type("Clinic", "عيادة", true, true, false, true),
                property_type("Shop", "محل تجاري", true, true, false, false),
                property_type("Land", "أرض", false, false, false, false),
            ],
            finishing_statuses: vec![
                entry("fully-finished", "تشطيب كامل", "Fully Finished"),
                entry("semi-finished", "نصف تشطيب", "Semi Finished"),
                entry("core-and-shell", "على الطوب", "Core & Shell"),
                entry("super-lux", "سوبر لوكس", "Super Lux"),
                entry("furnished", "مفروش", "Furnished"),
            ],
            amenities: vec![
                entry("pool", "حمام سباحة", "Swimming Pool"),
                entry("gym", "جيم", "Gym"),
                entry("security", "أمن وحراسة", "Security"),
                entry("parking", "جراج", "Parking"),
                entry("garden", "حديقة", "Garden"),
                entry("elevator", "مصعد", "Elevator"),
                entry("clubhouse", "نادي اجتماعي", "Clubhouse"),
                entry("balcony", "بلكونة", "Balcony"),
            ],
            projects: vec![
                entry("mountain-view-icity", "ماونتن فيو آي سيتي", "Mountain View iCity"),
                entry("palm-hills-october", "بالم هيلز أكتوبر", "Palm Hills October"),
                entry("madinaty", "مدينتي", "Madinaty"),
                entry("marassi", "مراسي", "Marassi"),
            ],
        }
    }
}
