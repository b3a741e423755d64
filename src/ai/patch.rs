use super::schema::ParseSchema;
use crate::error::SmartSearchError;
use crate::filters::{FilterField, FilterStore, FilterValue, Location, StatusFilter};
use serde_json::Value;
use tracing::warn;

/// Validated filters extracted from free text. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub property_type: Option<String>,
    pub status: Option<StatusFilter>,
    pub finishing: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub beds: Option<u32>,
    pub baths: Option<u32>,
    pub area: Option<u32>,
    pub compound: Option<bool>,
}

impl FilterPatch {
    /// Checks the model output field by field. Unknown keys and nulls are
    /// dropped; any value outside the schema rejects the whole response.
    pub fn from_json(value: Value, schema: &ParseSchema) -> Result<Self, SmartSearchError> {
        let fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(SmartSearchError::InvalidResponse(format!(
                    "expected a JSON object, got `{other}`"
                )))
            }
        };

        let mut patch = FilterPatch::default();
        for (key, value) in fields {
            if value.is_null() {
                continue;
            }
            match key.as_str() {
                "type" => patch.property_type = Some(one_of(&key, &value, &schema.property_types)?),
                "status" => {
                    let token = string(&key, &value)?;
                    patch.status = match StatusFilter::from_token(&token) {
                        Some(StatusFilter::All) => None,
                        Some(status) => Some(status),
                        None => return Err(mismatch(&key, &value)),
                    };
                }
                "finishing" => {
                    patch.finishing = Some(one_of(&key, &value, &schema.finishing_statuses)?)
                }
                "minPrice" => patch.min_price = Some(amount(&key, &value)?),
                "maxPrice" => patch.max_price = Some(amount(&key, &value)?),
                "beds" => patch.beds = Some(count(&key, &value)?),
                "baths" => patch.baths = Some(count(&key, &value)?),
                "area" => {
                    patch.area = Some(
                        u32::try_from(amount(&key, &value)?)
                            .map_err(|_| mismatch(&key, &value))?,
                    )
                }
                "compound" => {
                    patch.compound = Some(value.as_bool().ok_or_else(|| mismatch(&key, &value))?)
                }
                _ => warn!(key = %key, "Dropping unknown field from AI response"),
            }
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterPatch::default()
    }

    /// The store writes this patch amounts to, in a fixed order.
    pub fn updates(&self) -> Vec<(FilterField, FilterValue)> {
        let mut updates = Vec::new();
        if let Some(property_type) = &self.property_type {
            updates.push((FilterField::Type, FilterValue::from(property_type.as_str())));
        }
        if let Some(status) = self.status {
            updates.push((FilterField::Status, FilterValue::from(status)));
        }
        if let Some(finishing) = &self.finishing {
            updates.push((FilterField::Finishing, FilterValue::from(finishing.as_str())));
        }
        if let Some(min_price) = self.min_price {
            updates.push((FilterField::MinPrice, FilterValue::from(min_price)));
        }
        if let Some(max_price) = self.max_price {
            updates.push((FilterField::MaxPrice, FilterValue::from(max_price)));
        }
        if let Some(beds) = self.beds {
            updates.push((FilterField::Beds, FilterValue::from(beds)));
        }
        if let Some(baths) = self.baths {
            updates.push((FilterField::Baths, FilterValue::from(baths)));
        }
        if let Some(area) = self.area {
            updates.push((FilterField::Area, FilterValue::from(area)));
        }
        if let Some(compound) = self.compound {
            updates.push((FilterField::Compound, FilterValue::from(compound)));
        }
        updates
    }

    /// Merges the patch into the store; fields it does not carry are left alone.
    pub fn apply<L: Location>(&self, store: &mut FilterStore<L>) {
        for (field, value) in self.updates() {
            store.set_filter(field, value);
        }
    }
}

fn mismatch(key: &str, value: &Value) -> SmartSearchError {
    SmartSearchError::SchemaMismatch(format!("`{key}` cannot be `{value}`"))
}

fn string(key: &str, value: &Value) -> Result<String, SmartSearchError> {
    value
        .as_str()
        .map(|value| value.trim().to_string())
        .ok_or_else(|| mismatch(key, value))
}

fn one_of(key: &str, value: &Value, allowed: &[String]) -> Result<String, SmartSearchError> {
    let candidate = string(key, value)?;
    allowed
        .iter()
        .find(|allowed| **allowed == candidate)
        .cloned()
        .ok_or_else(|| mismatch(key, value))
}

/// Non-negative number, rounded to a whole unit.
fn amount(key: &str, value: &Value) -> Result<u64, SmartSearchError> {
    if let Some(amount) = value.as_u64() {
        return Ok(amount);
    }
    value
        .as_f64()
        .filter(|amount| amount.is_finite() && *amount >= 0.0 && *amount <= u64::MAX as f64)
        .map(|amount| amount.round() as u64)
        .ok_or_else(|| mismatch(key, value))
}

/// Non-negative whole count.
fn count(key: &str, value: &Value) -> Result<u32, SmartSearchError> {
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|count| *count >= 0.0 && count.fract() == 0.0)
                .map(|count| count as u64)
        })
        .and_then(|count| u32::try_from(count).ok())
        .ok_or_else(|| mismatch(key, value))
}
