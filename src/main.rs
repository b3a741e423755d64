use anyhow::Result;
use clap::Parser;
use property_search::ai::{GeminiParser, SmartSearch};
use property_search::filters::{FilterField, FilterStore, MemoryHistory};
use property_search::listings::{MockPropertySource, PropertyQuery, QueryOptions};
use property_search::{Config, SmartSearchError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Search the sample property listings the way the listing page does.
#[derive(Parser, Debug)]
#[command(name = "property-search", version)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial URL query string, e.g. `status=for_sale&beds=3`
    #[arg(long, default_value = "")]
    query: String,

    /// Free-text search, parsed into filters when an AI key is configured
    #[arg(long)]
    ask: Option<String>,

    /// Page to show
    #[arg(long)]
    page: Option<u32>,

    /// Save the page of results as JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::read(cli.config.as_deref())?;

    let source = Arc::new(MockPropertySource::new(config.mock.latency()));
    let catalog = source.catalog().clone();
    let query = PropertyQuery::new(source, QueryOptions::from(&config.listing));
    let mut store = FilterStore::new(MemoryHistory::new(cli.query.as_str()));

    if let Some(text) = cli.ask.as_deref() {
        match GeminiParser::from_config(&config.ai)? {
            Some(parser) => {
                let smart_search = SmartSearch::new(Arc::new(parser), &catalog, config.ai.timeout());
                if let Err(err) = smart_search.search(&mut store, text).await {
                    println!("⚠️  {}", err.user_message().en);
                }
            }
            None => {
                store.set_filter(FilterField::Query, text);
                warn!("No AI key configured, searching for the literal text");
                println!("⚠️  {}", SmartSearchError::Unavailable.user_message().en);
            }
        }
    }

    if let Some(page) = cli.page {
        store.set_page(page);
    }

    let snapshot = store.snapshot();
    info!("🔎 Filters: ?{}", snapshot.to_query_string());

    let state = query.load(snapshot.page, snapshot.filters.clone()).await;
    if let Some(err) = &state.error {
        warn!("Listings query failed: {err:#}");
        anyhow::bail!("Failed to load listings");
    }
    let Some(result) = state.data else {
        anyhow::bail!("No listings were loaded");
    };

    let page_size = query.options().page_size;
    info!(
        "✅ {} matching properties, page {} of {}\n",
        result.total,
        snapshot.page,
        result.page_count(page_size).max(1)
    );

    for (i, property) in result.items.iter().enumerate() {
        let position = (snapshot.page as usize - 1) * page_size + i + 1;
        println!("{}. {} ({} EGP)", position, property.title.en, property.price);
        println!("   {}", property.title.ar);
        println!(
            "   {} · {}, {}",
            property.property_type, property.location.district.en, property.location.city.en
        );
        let mut details = vec![format!("{} m²", property.area)];
        if let Some(beds) = property.beds {
            details.push(format!("{beds} beds"));
        }
        if let Some(baths) = property.baths {
            details.push(format!("{baths} baths"));
        }
        if let Some(floor) = property.floor {
            details.push(format!("floor {floor}"));
        }
        println!("   {}", details.join(", "));
        if !property.amenities.is_empty() {
            println!("   Amenities: {}", property.amenities.join(", "));
        }
        println!("   ID: {}", property.id);
        println!();
    }

    if let Some(path) = &cli.output {
        let json = serde_json::to_string_pretty(result.as_ref())?;
        tokio::fs::write(path, json).await?;
        info!("💾 Saved page to {}", path.display());
    }

    Ok(())
}
