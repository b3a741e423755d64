use super::schema::ParseSchema;
use crate::error::SmartSearchError;
use async_trait::async_trait;

/// Generative model turning free text into structured filter JSON
#[async_trait]
pub trait QueryParser: Send + Sync {
    /// Returns the model's JSON object, before any validation
    async fn parse_query(
        &self,
        text: &str,
        schema: &ParseSchema,
    ) -> Result<serde_json::Value, SmartSearchError>;

    /// Get the name of the model provider
    fn provider_name(&self) -> &'static str;
}
