use crate::filters::StatusFilter;
use crate::models::Catalog;
use serde_json::{json, Value};

/// Enumerations the model may answer with, taken from the catalog at call time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSchema {
    pub property_types: Vec<String>,
    pub finishing_statuses: Vec<String>,
}

impl ParseSchema {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            property_types: catalog.property_type_ids(),
            finishing_statuses: catalog.finishing_status_ids(),
        }
    }

    pub fn statuses() -> [&'static str; 2] {
        [
            StatusFilter::ForSale.as_token(),
            StatusFilter::ForRent.as_token(),
        ]
    }

    /// Structured output schema in the OpenAPI subset the Gemini API accepts.
    pub fn response_schema(&self) -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "type": { "type": "STRING", "enum": self.property_types },
                "status": { "type": "STRING", "enum": Self::statuses() },
                "finishing": { "type": "STRING", "enum": self.finishing_statuses },
                "minPrice": { "type": "NUMBER", "description": "Minimum price in EGP" },
                "maxPrice": { "type": "NUMBER", "description": "Maximum price in EGP" },
                "beds": { "type": "INTEGER", "description": "Minimum number of bedrooms" },
                "baths": { "type": "INTEGER", "description": "Minimum number of bathrooms" },
                "area": { "type": "NUMBER", "description": "Minimum area in square meters" },
                "compound": { "type": "BOOLEAN", "description": "Inside a gated compound" }
            }
        })
    }

    /// Prompt sent along with the user's text.
    pub fn instruction(&self, text: &str) -> String {
        format!(
            "You convert real-estate search requests written in Arabic, English or a mix of both \
             into search filters for an Egyptian property marketplace.\n\
             Only include fields the request actually mentions; never guess.\n\
             - type: one of [{types}]. شقة = Apartment, فيلا = Villa, دوبلكس = Duplex, \
             تاون هاوس = Townhouse, توين هاوس = Twin House, شاليه = Chalet, ستوديو = Studio, \
             مكتب = Office, عيادة = Clinic, محل = Shop, أرض = Land.\n\
             - status: for_sale for بيع/تمليك/buy/sale, for_rent for إيجار/ايجار/rent.\n\
             - finishing: one of [{finishing}]. متشطب/تشطيب كامل = fully-finished, \
             نص تشطيب = semi-finished, على الطوب = core-and-shell, سوبر لوكس = super-lux, \
             مفروش = furnished.\n\
             - minPrice/maxPrice: plain numbers in EGP. مليون/million/m = 1,000,000, \
             ألف/الف/thousand/k = 1,000. تحت/أقل من/under/below/max sets maxPrice, \
             فوق/أكثر من/over/above/from sets minPrice.\n\
             - beds/baths: minimum counts. غرف/أوض/bedrooms/BR = beds, حمام/bathrooms = baths.\n\
             - area: minimum square meters (متر/م/sqm).\n\
             - compound: true for كمبوند/compound/gated, false for outside a compound.\n\
             Request: {text}",
            types = self.property_types.join(", "),
            finishing = self.finishing_statuses.join(", "),
        )
    }
}
