pub mod gemini;
pub mod patch;
pub mod schema;
pub mod smart_search;
pub mod traits;

pub use gemini::GeminiParser;
pub use patch::FilterPatch;
pub use schema::ParseSchema;
pub use smart_search::SmartSearch;
pub use traits::QueryParser;
