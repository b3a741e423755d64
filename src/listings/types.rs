use crate::filters::Filters;
use crate::models::Property;
use serde::{Deserialize, Serialize};

/// One page request against a property source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: usize,
    pub filters: Filters,
}

/// A page of matching properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub items: Vec<Property>,
    /// Number of matches before pagination
    pub total: usize,
}

impl QueryResult {
    pub fn page_count(&self, limit: usize) -> usize {
        if limit == 0 {
            return 0;
        }
        self.total.div_ceil(limit)
    }
}
