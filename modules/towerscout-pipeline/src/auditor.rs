use std::fmt;

use anyhow::Result;
use chrono::Duration;
use towerscout_common::{extract_domain, now_ms, Source};
use tracing::{info, warn};

use crate::store::Store;

/// A source older than this is stale and gets requeued.
const STALE_THRESHOLD_HOURS: i64 = 48;

/// At most this many sources are requeued per audit; the rest wait for the
/// next run so the harvester is not flooded with resets.
const REQUEUE_LIMIT: usize = 10;

/// Coverage classification of one source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceHealth {
    Healthy,
    Stale,
    NeverCrawled,
}

#[derive(Debug, Clone)]
pub struct SourceStatus {
    pub domain: String,
    pub health: SourceHealth,
    /// Most recent activity, epoch ms. Zero when never crawled.
    pub effective_ms: i64,
}

/// Audit summary across all sources.
#[derive(Debug, Default)]
pub struct AuditReport {
    pub statuses: Vec<SourceStatus>,
    pub healthy: usize,
    pub stale: usize,
    pub never_crawled: usize,
    pub requeued: usize,
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Source coverage audit")?;
        for status in &self.statuses {
            let state = match status.health {
                SourceHealth::Healthy => "healthy",
                SourceHealth::Stale => "STALE",
                SourceHealth::NeverCrawled => "never crawled",
            };
            writeln!(f, "  {:<40} {}", status.domain, state)?;
        }
        writeln!(
            f,
            "  healthy: {}  stale: {}  never crawled: {}  requeued: {}",
            self.healthy, self.stale, self.never_crawled, self.requeued
        )
    }
}

/// Watches source coverage. A source's freshness is the more recent of its
/// crawl stamp and its newest signal, so a source that keeps yielding
/// articles is not flagged just because the scheduler skipped it.
pub struct StalenessAuditor<'a> {
    store: &'a dyn Store,
}

impl<'a> StalenessAuditor<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Classify every source and requeue the stale ones (up to the limit) by
    /// clearing their crawl stamp, which puts them at the head of the
    /// scheduler's queue.
    pub async fn audit(&self) -> Result<AuditReport> {
        let sources = self.store.all_sources().await?;
        let mut report = AuditReport::default();
        let mut requeue: Vec<Source> = Vec::new();
        let now = now_ms();

        for source in sources {
            let latest_signal = self
                .store
                .latest_signal_ms_for_source(source.id)
                .await?
                .unwrap_or(0);
            let effective_ms = source.last_crawled.unwrap_or(0).max(latest_signal);

            let health = classify(effective_ms, now);
            match health {
                SourceHealth::Healthy => report.healthy += 1,
                SourceHealth::Stale => {
                    report.stale += 1;
                    requeue.push(source.clone());
                }
                SourceHealth::NeverCrawled => {
                    report.never_crawled += 1;
                    requeue.push(source.clone());
                }
            }

            report.statuses.push(SourceStatus {
                domain: extract_domain(&source.url),
                health,
                effective_ms,
            });
        }

        for source in requeue.iter().take(REQUEUE_LIMIT) {
            match self.store.reset_source(source.id).await {
                Ok(()) => {
                    report.requeued += 1;
                    info!(source = %source.url, "Requeued stale source");
                }
                Err(e) => warn!(source = %source.url, error = %e, "Failed to requeue"),
            }
        }
        if requeue.len() > REQUEUE_LIMIT {
            info!(
                deferred = requeue.len() - REQUEUE_LIMIT,
                "More stale sources deferred to the next audit"
            );
        }

        Ok(report)
    }
}

fn classify(effective_ms: i64, now_ms: i64) -> SourceHealth {
    if effective_ms == 0 {
        return SourceHealth::NeverCrawled;
    }
    let age = Duration::milliseconds(now_ms - effective_ms);
    if age > Duration::hours(STALE_THRESHOLD_HOURS) {
        SourceHealth::Stale
    } else {
        SourceHealth::Healthy
    }
}
