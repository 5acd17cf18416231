use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use instant_client::InstantClient;
use towerscout_common::Config;
use towerscout_pipeline::{
    ArchiveCrawler, CrawlLimits, DedupRegistry, HttpFetcher, InstantStore, Store,
};

/// One shallow pass over every registered source. Run after seeding new
/// sources to backfill their archives.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("towerscout=info".parse()?))
        .init();

    info!("Tower Scout dredger starting...");

    let config = Config::harvest_from_env();
    let client = InstantClient::new(
        &config.instant_api_base,
        &config.instant_app_id,
        &config.instant_admin_token,
    );
    let store = InstantStore::new(client);
    let fetcher = HttpFetcher::new();

    let sources = store.all_sources().await?;
    if sources.is_empty() {
        warn!("No sources registered, nothing to dredge");
        return Ok(());
    }
    info!(sources = sources.len(), "Dredging all sources");

    let mut registry = DedupRegistry::from_urls(store.signal_urls().await?);
    info!(known_urls = registry.len(), "Seeded dedup registry");

    let crawler = ArchiveCrawler::new(&fetcher, &store, CrawlLimits::sweep());
    let mut total_new = 0;
    let mut total_duplicates = 0;

    for source in &sources {
        match crawler.discover(source, &mut registry).await {
            Ok(stats) => {
                total_new += stats.new;
                total_duplicates += stats.duplicates;
            }
            Err(e) => warn!(source = %source.url, error = %e, "Dredge failed for source"),
        }
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }

    info!(
        sources = sources.len(),
        new = total_new,
        duplicates = total_duplicates,
        "Dredge complete"
    );
    Ok(())
}
