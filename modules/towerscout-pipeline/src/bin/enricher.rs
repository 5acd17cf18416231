use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::Roster;
use instant_client::InstantClient;
use towerscout_common::Config;
use towerscout_pipeline::{InstantStore, Orchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("towerscout=info".parse()?))
        .init();

    info!("Tower Scout enricher starting...");

    let config = Config::from_env();
    let client = InstantClient::new(
        &config.instant_api_base,
        &config.instant_app_id,
        &config.instant_admin_token,
    );
    let store = InstantStore::new(client);

    let roster = Roster::from_keys(&config.groq_api_key, &config.google_api_key);
    anyhow::ensure!(!roster.is_empty(), "no AI provider keys configured");

    let orchestrator = Orchestrator::new(&store, &roster);
    orchestrator.run().await;
    Ok(())
}
