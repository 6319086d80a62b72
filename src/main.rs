use anyhow::{Context, Result};
use std::env;
use tracing::{info, warn};

use unegui_pipeline::config::ScraperConfig;
use unegui_pipeline::fetcher::{Collector, CrawlState, HttpPageSource};
use unegui_pipeline::processor::ListingExtractor;
use unegui_pipeline::storage::FileStorage;

const DEFAULT_CONFIG: &str = "src/configs/unegui.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config_path = env::var("UNEGUI_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let config = ScraperConfig::load_or_default(&config_path)
        .context("Failed to load scraper configuration")?;

    info!(
        "🚀 Starting {} collector: {} pages from {}",
        config.site.name, config.scraping.pages, config.site.base_url
    );

    let source = HttpPageSource::new(&config).context("Failed to build HTTP client")?;
    let extractor = ListingExtractor::from_config(&config.selectors)
        .context("Invalid selector configuration")?;
    let storage = FileStorage::from_config(&config.output);
    let collector = Collector::new(source, extractor, config);

    let mut state = CrawlState::new();
    let summary = collector.run(&mut state).await;

    if state.is_empty() {
        warn!("⚠️ No listings collected ({} pages failed)", summary.pages_failed);
        return Ok(());
    }

    let records = state.into_records();
    let (csv_path, json_path) = storage.store_all(&records)?;
    info!(
        "✅ Saved {} listings: {}, {}",
        records.len(),
        csv_path.display(),
        json_path.display()
    );

    Ok(())
}
