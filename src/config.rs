use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix of the environment variables that override the configuration.
pub const ENV_PREFIX: &str = "PROPERTY_SEARCH_";

/// Application configuration.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Listing query, cache and debounce settings.
    pub listing: ListingConfig,
    /// Mock backend settings.
    pub mock: MockConfig,
    /// Natural-language search settings.
    pub ai: AiConfig,
}

impl Config {
    /// Reads the defaults, then the optional TOML file, then the environment
    /// (`PROPERTY_SEARCH_AI__MODEL` sets `ai.model`).
    pub fn read(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        Ok(figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ListingConfig {
    pub page_size: usize,
    /// Quiet period before filter changes reach the backend.
    pub debounce_ms: u64,
    /// How long a fetched page stays fresh.
    pub stale_time_secs: u64,
    pub retries: u32,
    pub retry_delay_ms: u64,
    /// How long a page that is no longer displayed stays cached.
    pub cache_time_secs: u64,
}

impl ListingConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 12,
            debounce_ms: 500,
            stale_time_secs: 60,
            retries: 0,
            retry_delay_ms: 1000,
            cache_time_secs: 300,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MockConfig {
    /// Simulated backend latency.
    pub latency_ms: u64,
}

impl MockConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self { latency_ms: 300 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AiConfig {
    pub base_url: String,
    pub model: String,
    /// Without a key natural-language search is disabled.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            timeout_secs: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use std::path::Path;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.listing.page_size, 12);
        assert_eq!(config.listing.debounce_ms, 500);
        assert_eq!(config.listing.stale_time_secs, 60);
        assert_eq!(config.listing.cache_time_secs, 300);
        assert_eq!(config.mock.latency_ms, 300);
        assert_eq!(config.ai.model, "gemini-2.5-flash");
        assert_eq!(config.ai.api_key, None);
        assert_eq!(config.ai.timeout_secs, 15);
    }

    #[test]
    fn file_and_environment_override_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "property-search.toml",
                r#"
                [listing]
                page_size = 10
                debounce_ms = 250

                [ai]
                api_key = "from-file"
                "#,
            )?;
            jail.set_env("PROPERTY_SEARCH_AI__MODEL", "gemini-2.5-pro");
            jail.set_env("PROPERTY_SEARCH_MOCK__LATENCY_MS", "0");

            let config = Config::read(Some(Path::new("property-search.toml")))
                .map_err(|err| err.to_string())?;
            assert_eq!(config.listing.page_size, 10);
            assert_eq!(config.listing.debounce_ms, 250);
            assert_eq!(config.listing.stale_time_secs, 60);
            assert_eq!(config.ai.api_key.as_deref(), Some("from-file"));
            assert_eq!(config.ai.model, "gemini-2.5-pro");
            assert_eq!(config.mock.latency_ms, 0);
            Ok(())
        });
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        figment::Jail::expect_with(|_| {
            let config =
                Config::read(Some(Path::new("absent.toml"))).map_err(|err| err.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }
}
