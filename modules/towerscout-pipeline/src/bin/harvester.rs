use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use instant_client::InstantClient;
use towerscout_common::Config;
use towerscout_pipeline::{CrawlLimits, HarvestLoop, HttpFetcher, InstantStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("towerscout=info".parse()?))
        .init();

    info!("Tower Scout harvester starting...");

    let config = Config::harvest_from_env();
    let client = InstantClient::new(
        &config.instant_api_base,
        &config.instant_app_id,
        &config.instant_admin_token,
    );
    let store = InstantStore::new(client);
    let fetcher = HttpFetcher::new();

    let harvester = HarvestLoop::new(&store, &fetcher, CrawlLimits::deep());
    harvester.run().await;
    Ok(())
}
