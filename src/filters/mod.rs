pub mod matching;
pub mod params;
pub mod snapshot;
pub mod store;

pub use matching::{apply_filters, matches};
pub use params::{FilterField, FilterValue, QueryParams, UnknownFilterField};
pub use snapshot::{DeliveryFilter, FilterSnapshot, Filters, StatusFilter, TriState};
pub use store::{FilterStore, Location, MemoryHistory};
