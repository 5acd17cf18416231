use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use towerscout_common::{Project, RawSignal, Source};
use uuid::Uuid;

use super::Store;

#[derive(Default)]
struct Inner {
    sources: Vec<Source>,
    signals: Vec<RawSignal>,
    projects: Vec<(Uuid, Project)>,
    links: Vec<(Uuid, Uuid)>,
}

/// In-memory [`Store`] for tests. Mirrors the document store's semantics
/// closely enough that pipeline logic cannot tell the difference.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sources(sources: Vec<Source>) -> Self {
        let store = Self::new();
        store.inner.lock().unwrap().sources = sources;
        store
    }

    pub fn sources(&self) -> Vec<Source> {
        self.inner.lock().unwrap().sources.clone()
    }

    pub fn signals(&self) -> Vec<RawSignal> {
        self.inner.lock().unwrap().signals.clone()
    }

    pub fn projects(&self) -> Vec<Project> {
        self.inner
            .lock()
            .unwrap()
            .projects
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn links(&self) -> Vec<(Uuid, Uuid)> {
        self.inner.lock().unwrap().links.clone()
    }

    pub fn push_signal(&self, signal: RawSignal) {
        self.inner.lock().unwrap().signals.push(signal);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn all_sources(&self) -> Result<Vec<Source>> {
        Ok(self.inner.lock().unwrap().sources.clone())
    }

    async fn add_source(&self, url: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().sources.push(Source {
            id,
            url: url.to_string(),
            last_crawled: None,
        });
        Ok(id)
    }

    async fn update_source_timestamp(&self, id: Uuid, timestamp_ms: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let source = inner
            .sources
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| anyhow!("unknown source {id}"))?;
        source.last_crawled = Some(timestamp_ms);
        Ok(())
    }

    async fn reset_source(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let source = inner
            .sources
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| anyhow!("unknown source {id}"))?;
        source.last_crawled = None;
        Ok(())
    }

    async fn delete_source(&self, id: Uuid) -> Result<()> {
        self.inner.lock().unwrap().sources.retain(|s| s.id != id);
        Ok(())
    }

    async fn signal_urls(&self) -> Result<Vec<String>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .signals
            .iter()
            .filter_map(|s| s.url.clone())
            .collect())
    }

    async fn latest_signal_ms_for_source(&self, source_id: Uuid) -> Result<Option<i64>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .signals
            .iter()
            .filter(|s| s.source_id == Some(source_id))
            .map(|s| s.created_at)
            .max())
    }

    async fn add_raw_signal(&self, signal: &RawSignal) -> Result<()> {
        self.inner.lock().unwrap().signals.push(signal.clone());
        Ok(())
    }

    async fn unprocessed_signals(&self, limit: usize) -> Result<Vec<RawSignal>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .signals
            .iter()
            .filter(|s| !s.processed)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_signal_processed(&self, id: Uuid, article_date: Option<&str>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let signal = inner
            .signals
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| anyhow!("unknown signal {id}"))?;
        signal.processed = true;
        if let Some(date) = article_date {
            signal.article_date = Some(date.to_string());
        }
        Ok(())
    }

    async fn insert_project(&self, project: &Project) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().projects.push((id, project.clone()));
        Ok(id)
    }

    async fn link_project_signal(&self, project_id: Uuid, signal_id: Uuid) -> Result<()> {
        self.inner.lock().unwrap().links.push((project_id, signal_id));
        Ok(())
    }
}
