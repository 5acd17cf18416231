use anyhow::{Context, Result};
use async_trait::async_trait;
use instant_client::{InstantClient, TxStep};
use serde_json::{json, Value};
use towerscout_common::{Project, RawSignal, Source};
use tracing::warn;
use uuid::Uuid;

use super::Store;

const SOURCES: &str = "sources";
const SIGNALS: &str = "raw_signals";
const PROJECTS: &str = "projects";
/// Relation name on the projects collection pointing back at raw_signals.
const SIGNAL_RELATION: &str = "signals";

/// Document-store-backed [`Store`]. Queries fetch whole collections and
/// filter client side; the store's query language stays out of the pipeline.
pub struct InstantStore {
    client: InstantClient,
}

impl InstantStore {
    pub fn new(client: InstantClient) -> Self {
        Self { client }
    }

    async fn collection(&self, name: &str) -> Result<Vec<Value>> {
        let resp = self
            .client
            .query(json!({ name: {} }))
            .await
            .with_context(|| format!("query {name}"))?;
        match resp.get(name) {
            Some(Value::Array(items)) => Ok(items.clone()),
            _ => Ok(Vec::new()),
        }
    }

    async fn raw_signals(&self) -> Result<Vec<RawSignal>> {
        let items = self.collection(SIGNALS).await?;
        Ok(decode_all(items, SIGNALS))
    }
}

/// Decode collection entries, skipping malformed records rather than failing
/// the whole query.
fn decode_all<T: serde::de::DeserializeOwned>(items: Vec<Value>, name: &str) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(collection = name, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect()
}

#[async_trait]
impl Store for InstantStore {
    async fn all_sources(&self) -> Result<Vec<Source>> {
        let items = self.collection(SOURCES).await?;
        Ok(decode_all(items, SOURCES))
    }

    async fn add_source(&self, url: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let step = TxStep::update(SOURCES, &id.to_string(), json!({ "url": url }));
        self.client.transact(&[step]).await.context("add source")?;
        Ok(id)
    }

    async fn update_source_timestamp(&self, id: Uuid, timestamp_ms: i64) -> Result<()> {
        let step = TxStep::update(
            SOURCES,
            &id.to_string(),
            json!({ "last_crawled": timestamp_ms }),
        );
        self.client
            .transact(&[step])
            .await
            .context("update source timestamp")?;
        Ok(())
    }

    async fn reset_source(&self, id: Uuid) -> Result<()> {
        let step = TxStep::update(SOURCES, &id.to_string(), json!({ "last_crawled": null }));
        self.client.transact(&[step]).await.context("reset source")?;
        Ok(())
    }

    async fn delete_source(&self, id: Uuid) -> Result<()> {
        let step = TxStep::delete(SOURCES, &id.to_string());
        self.client
            .transact(&[step])
            .await
            .context("delete source")?;
        Ok(())
    }

    async fn signal_urls(&self) -> Result<Vec<String>> {
        let signals = self.raw_signals().await?;
        Ok(signals.into_iter().filter_map(|s| s.url).collect())
    }

    async fn latest_signal_ms_for_source(&self, source_id: Uuid) -> Result<Option<i64>> {
        let signals = self.raw_signals().await?;
        Ok(signals
            .iter()
            .filter(|s| s.source_id == Some(source_id))
            .map(|s| s.created_at)
            .max())
    }

    async fn add_raw_signal(&self, signal: &RawSignal) -> Result<()> {
        let mut fields = serde_json::to_value(signal).context("encode signal")?;
        if let Value::Object(map) = &mut fields {
            map.remove("id");
        }
        let step = TxStep::update(SIGNALS, &signal.id.to_string(), fields);
        self.client
            .transact(&[step])
            .await
            .context("add raw signal")?;
        Ok(())
    }

    async fn unprocessed_signals(&self, limit: usize) -> Result<Vec<RawSignal>> {
        let signals = self.raw_signals().await?;
        Ok(signals
            .into_iter()
            .filter(|s| !s.processed)
            .take(limit)
            .collect())
    }

    async fn mark_signal_processed(&self, id: Uuid, article_date: Option<&str>) -> Result<()> {
        let mut fields = json!({ "processed": true });
        if let Some(date) = article_date {
            fields["article_date"] = json!(date);
        }
        let step = TxStep::update(SIGNALS, &id.to_string(), fields);
        self.client
            .transact(&[step])
            .await
            .context("mark signal processed")?;
        Ok(())
    }

    async fn insert_project(&self, project: &Project) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let fields = serde_json::to_value(project).context("encode project")?;
        let step = TxStep::update(PROJECTS, &id.to_string(), fields);
        self.client
            .transact(&[step])
            .await
            .context("insert project")?;
        Ok(id)
    }

    async fn link_project_signal(&self, project_id: Uuid, signal_id: Uuid) -> Result<()> {
        let step = TxStep::link(
            PROJECTS,
            &project_id.to_string(),
            SIGNAL_RELATION,
            &signal_id.to_string(),
        );
        self.client
            .transact(&[step])
            .await
            .context("link project to signal")?;
        Ok(())
    }
}
