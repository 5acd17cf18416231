use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use instant_client::InstantClient;
use towerscout_common::Config;
use towerscout_pipeline::cleanup::prune_non_root_sources;
use towerscout_pipeline::InstantStore;

/// One-shot maintenance pass: delete sources whose URL is not a bare root
/// domain.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("towerscout=info".parse()?))
        .init();

    info!("Tower Scout source cleanup starting...");

    let config = Config::harvest_from_env();
    let client = InstantClient::new(
        &config.instant_api_base,
        &config.instant_app_id,
        &config.instant_admin_token,
    );
    let store = InstantStore::new(client);

    let stats = prune_non_root_sources(&store).await?;
    println!("kept {} sources, deleted {}", stats.kept, stats.deleted);
    Ok(())
}
