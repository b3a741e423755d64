pub mod ai;
pub mod config;
pub mod debounce;
pub mod error;
pub mod filters;
pub mod listings;
pub mod models;

pub use config::Config;
pub use error::SmartSearchError;
