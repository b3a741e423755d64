pub mod mock;
pub mod pipeline;
pub mod query;
pub mod traits;
pub mod types;

pub use mock::MockPropertySource;
pub use pipeline::ListingPipeline;
pub use query::{PropertyQuery, QueryKey, QueryOptions, QueryState};
pub use traits::PropertySource;
pub use types::{PageRequest, QueryResult};
