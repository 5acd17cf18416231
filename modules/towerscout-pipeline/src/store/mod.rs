mod instant;
#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use instant::InstantStore;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;
use towerscout_common::{Project, RawSignal, Source};
use uuid::Uuid;

/// Persistence operations the pipeline needs. Backed by the document store
/// in production, by [`MemoryStore`] in tests.
#[async_trait]
pub trait Store: Send + Sync {
    async fn all_sources(&self) -> Result<Vec<Source>>;

    async fn add_source(&self, url: &str) -> Result<Uuid>;

    /// Record a completed crawl attempt.
    async fn update_source_timestamp(&self, id: Uuid, timestamp_ms: i64) -> Result<()>;

    /// Clear `last_crawled` so the scheduler treats the source as new.
    async fn reset_source(&self, id: Uuid) -> Result<()>;

    async fn delete_source(&self, id: Uuid) -> Result<()>;

    /// Every signal URL on record, for seeding the dedup registry.
    async fn signal_urls(&self) -> Result<Vec<String>>;

    /// Newest `created_at` among a source's signals, if it has any.
    async fn latest_signal_ms_for_source(&self, source_id: Uuid) -> Result<Option<i64>>;

    async fn add_raw_signal(&self, signal: &RawSignal) -> Result<()>;

    async fn unprocessed_signals(&self, limit: usize) -> Result<Vec<RawSignal>>;

    async fn mark_signal_processed(&self, id: Uuid, article_date: Option<&str>) -> Result<()>;

    async fn insert_project(&self, project: &Project) -> Result<Uuid>;

    async fn link_project_signal(&self, project_id: Uuid, signal_id: Uuid) -> Result<()>;
}
