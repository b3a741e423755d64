use crate::models::LocalizedText;
use std::time::Duration;

/// Failure of a natural-language search. None of them touch the filters.
#[derive(Debug, thiserror::Error)]
pub enum SmartSearchError {
    #[error("search text is empty")]
    EmptyQuery,
    #[error("natural-language search is not configured")]
    Unavailable,
    #[error("AI request failed: {0}")]
    Request(String),
    #[error("AI request timed out after {0:?}")]
    Timeout(Duration),
    #[error("AI response is not valid JSON: {0}")]
    InvalidResponse(String),
    #[error("AI response does not match the filter schema: {0}")]
    SchemaMismatch(String),
}

impl SmartSearchError {
    /// Message for the transient notification shown to the user.
    pub fn user_message(&self) -> LocalizedText {
        match self {
            SmartSearchError::EmptyQuery => LocalizedText::new(
                "اكتب ما تبحث عنه أولاً",
                "Type what you are looking for first",
            ),
            SmartSearchError::Unavailable => LocalizedText::new(
                "البحث الذكي غير متاح حالياً",
                "Smart search is currently unavailable",
            ),
            SmartSearchError::Timeout(_) => LocalizedText::new(
                "استغرق البحث الذكي وقتاً طويلاً، حاول مرة أخرى",
                "Smart search took too long, please try again",
            ),
            SmartSearchError::Request(_)
            | SmartSearchError::InvalidResponse(_)
            | SmartSearchError::SchemaMismatch(_) => LocalizedText::new(
                "تعذر فهم طلب البحث، حاول مرة أخرى",
                "Could not understand your search, please try again",
            ),
        }
    }
}

impl From<reqwest::Error> for SmartSearchError {
    fn from(err: reqwest::Error) -> Self {
        SmartSearchError::Request(err.to_string())
    }
}
