use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use instant_client::InstantClient;
use towerscout_common::Config;
use towerscout_pipeline::auditor::StalenessAuditor;
use towerscout_pipeline::InstantStore;

/// One-shot coverage audit: report every source's freshness and requeue the
/// stale ones.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("towerscout=info".parse()?))
        .init();

    info!("Tower Scout source audit starting...");

    let config = Config::harvest_from_env();
    let client = InstantClient::new(
        &config.instant_api_base,
        &config.instant_app_id,
        &config.instant_admin_token,
    );
    let store = InstantStore::new(client);

    let report = StalenessAuditor::new(&store).audit().await?;
    println!("{report}");
    Ok(())
}
