use std::time::Duration;

use towerscout_common::{now_ms, Source};
use tracing::{info, warn};

use crate::crawler::{ArchiveCrawler, CrawlLimits, DiscoveryStats};
use crate::dedup::DedupRegistry;
use crate::fetch::PageFetcher;
use crate::store::Store;

/// The source most overdue for a crawl: oldest `last_crawled` wins, and a
/// never-crawled source beats any timestamp. Ties go to the first in store
/// order.
pub fn pick_next_source(sources: &[Source]) -> Option<&Source> {
    sources
        .iter()
        .min_by_key(|s| s.last_crawled.unwrap_or(i64::MIN))
}

/// What one scheduler cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No sources registered.
    Idle,
    Crawled {
        source_url: String,
        stats: DiscoveryStats,
    },
    /// The cycle failed before the source's timestamp could be advanced; the
    /// same source stays at the head of the queue.
    Failed,
}

/// Round-robin harvest scheduler. Each cycle crawls the single most overdue
/// source, then stamps it so every other source gets a turn before it comes
/// up again.
pub struct HarvestLoop<'a> {
    store: &'a dyn Store,
    fetcher: &'a dyn PageFetcher,
    limits: CrawlLimits,
    idle_pause: Duration,
    failure_pause: Duration,
}

impl<'a> HarvestLoop<'a> {
    pub fn new(store: &'a dyn Store, fetcher: &'a dyn PageFetcher, limits: CrawlLimits) -> Self {
        Self {
            store,
            fetcher,
            limits,
            idle_pause: Duration::from_secs(10),
            failure_pause: Duration::from_secs(5),
        }
    }

    /// Override the pauses. Tests only.
    pub fn with_pauses(mut self, idle: Duration, failure: Duration) -> Self {
        self.idle_pause = idle;
        self.failure_pause = failure;
        self
    }

    pub async fn run_once(&self, registry: &mut DedupRegistry) -> CycleOutcome {
        let sources = match self.store.all_sources().await {
            Ok(sources) => sources,
            Err(e) => {
                warn!(error = %e, "Failed to load sources");
                return CycleOutcome::Failed;
            }
        };

        let source = match pick_next_source(&sources) {
            Some(source) => source.clone(),
            None => {
                info!("No sources to crawl");
                return CycleOutcome::Idle;
            }
        };

        let crawler = ArchiveCrawler::new(self.fetcher, self.store, self.limits.clone());
        match crawler.discover(&source, registry).await {
            Ok(stats) => {
                // Stamp even empty crawls, or a barren source would pin the
                // queue forever.
                if let Err(e) = self
                    .store
                    .update_source_timestamp(source.id, now_ms())
                    .await
                {
                    warn!(source = %source.url, error = %e, "Failed to stamp source");
                }
                CycleOutcome::Crawled {
                    source_url: source.url,
                    stats,
                }
            }
            Err(e) => {
                warn!(source = %source.url, error = %e, "Crawl failed");
                CycleOutcome::Failed
            }
        }
    }

    /// Crawl forever. The dedup registry is seeded from stored signal URLs
    /// once, then carried across cycles.
    pub async fn run(&self) {
        let mut registry = match self.store.signal_urls().await {
            Ok(urls) => {
                let registry = DedupRegistry::from_urls(urls);
                info!(known_urls = registry.len(), "Seeded dedup registry");
                registry
            }
            Err(e) => {
                warn!(error = %e, "Could not seed dedup registry, starting empty");
                DedupRegistry::new()
            }
        };

        loop {
            match self.run_once(&mut registry).await {
                CycleOutcome::Idle => tokio::time::sleep(self.idle_pause).await,
                CycleOutcome::Failed => tokio::time::sleep(self.failure_pause).await,
                CycleOutcome::Crawled { .. } => {}
            }
        }
    }
}
