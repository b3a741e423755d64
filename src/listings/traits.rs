use super::types::{PageRequest, QueryResult};
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for every backend that can answer paginated property queries
#[async_trait]
pub trait PropertySource: Send + Sync {
    /// Fetch one page of properties matching the request filters
    async fn fetch_page(&self, request: &PageRequest) -> Result<QueryResult>;

    /// Get the name of the backend
    fn source_name(&self) -> &'static str;
}
