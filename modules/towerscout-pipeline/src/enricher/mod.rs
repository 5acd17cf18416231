pub mod parse;
pub mod prompt;

use std::time::Duration;

use ai_client::{Roster, RosterError};
use anyhow::Result;
use towerscout_common::{Project, RawSignal};
use tracing::{info, warn};

use crate::store::Store;

use parse::{parse_extraction, ExtractionOutcome};
use prompt::build_prompt;

/// Signals shorter than this carry no extractable article.
const MIN_SIGNAL_CHARS: usize = 100;

const BATCH_SIZE: usize = 10;

/// Sleep schedule for the enrichment loop.
#[derive(Debug, Clone)]
pub struct Pacing {
    /// After each provider round-trip.
    pub request: Duration,
    /// After a per-signal store failure.
    pub error: Duration,
    /// After the whole roster comes back rate-limited.
    pub rate_limit_cooldown: Duration,
    /// When the queue is empty.
    pub idle: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(5),
            error: Duration::from_secs(2),
            rate_limit_cooldown: Duration::from_secs(30),
            idle: Duration::from_secs(30),
        }
    }
}

impl Pacing {
    /// No sleeping at all. Tests only.
    pub fn instant() -> Self {
        Self {
            request: Duration::ZERO,
            error: Duration::ZERO,
            rate_limit_cooldown: Duration::ZERO,
            idle: Duration::ZERO,
        }
    }
}

/// Tally for one batch.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchStats {
    /// Signals pulled from the queue this round.
    pub fetched: usize,
    /// Projects extracted and saved.
    pub projects: usize,
    /// Signals the model judged non-residential.
    pub filtered: usize,
    /// Too-short signals marked processed without an AI call.
    pub skipped: usize,
    /// Unparseable responses or store failures.
    pub failed: usize,
    /// Roster-exhausted signals left unprocessed for a later retry.
    pub deferred: usize,
}

/// Drains the unprocessed-signal queue through the provider roster, one
/// batch at a time. Every signal leaves the queue exactly once except when
/// the entire roster is rate-limited, in which case it stays queued and the
/// loop cools down.
pub struct Orchestrator<'a> {
    store: &'a dyn Store,
    roster: &'a Roster,
    pacing: Pacing,
}

impl<'a> Orchestrator<'a> {
    pub fn new(store: &'a dyn Store, roster: &'a Roster) -> Self {
        Self {
            store,
            roster,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Process up to one batch of queued signals.
    pub async fn process_batch(&self) -> Result<BatchStats> {
        let signals = self.store.unprocessed_signals(BATCH_SIZE).await?;
        let mut stats = BatchStats {
            fetched: signals.len(),
            ..Default::default()
        };
        if signals.is_empty() {
            return Ok(stats);
        }

        info!(batch = signals.len(), "Enriching batch");
        for signal in &signals {
            self.process_signal(signal, &mut stats).await;
        }

        info!(
            projects = stats.projects,
            filtered = stats.filtered,
            skipped = stats.skipped,
            failed = stats.failed,
            deferred = stats.deferred,
            "Batch finished"
        );
        Ok(stats)
    }

    async fn process_signal(&self, signal: &RawSignal, stats: &mut BatchStats) {
        if signal.content.chars().count() < MIN_SIGNAL_CHARS {
            info!(signal = %signal.id, "Skipping tiny signal");
            if self.mark(signal, None).await {
                stats.skipped += 1;
            } else {
                stats.failed += 1;
            }
            return;
        }

        let prompt = build_prompt(&signal.content);
        let (response, provider) = match self.roster.generate(&prompt).await {
            Ok(out) => out,
            Err(RosterError::Exhausted { rate_limited: true }) => {
                // Leave the signal queued; it will come back in a later
                // batch once the providers calm down.
                warn!(signal = %signal.id, "Roster rate limited, cooling down");
                stats.deferred += 1;
                tokio::time::sleep(self.pacing.rate_limit_cooldown).await;
                return;
            }
            Err(RosterError::Exhausted {
                rate_limited: false,
            }) => {
                // Hard provider failures must not wedge the queue: the
                // signal is given up on without a project so the rest of
                // the backlog keeps moving.
                warn!(signal = %signal.id, "No provider could handle signal, giving up on it");
                self.mark(signal, None).await;
                stats.failed += 1;
                tokio::time::sleep(self.pacing.error).await;
                return;
            }
        };

        match parse_extraction(&response) {
            ExtractionOutcome::Project(extraction) => {
                let article_date = extraction.article_date.clone();
                match extraction.into_project(signal.id, signal.url.as_deref()) {
                    Some(project) => {
                        let name = project.name.clone();
                        match self.save_project(signal, &project, article_date.as_deref()).await {
                            Ok(()) => {
                                info!(%provider, project = %name, "Saved project");
                                stats.projects += 1;
                            }
                            Err(e) => {
                                warn!(signal = %signal.id, error = %e, "Failed to save project");
                                stats.failed += 1;
                                tokio::time::sleep(self.pacing.error).await;
                            }
                        }
                    }
                    None => {
                        if self.mark(signal, article_date.as_deref()).await {
                            stats.filtered += 1;
                        } else {
                            stats.failed += 1;
                        }
                    }
                }
            }
            ExtractionOutcome::Filtered { article_date } => {
                info!(%provider, signal = %signal.id, "No residential project found");
                if self.mark(signal, article_date.as_deref()).await {
                    stats.filtered += 1;
                } else {
                    stats.failed += 1;
                }
            }
            ExtractionOutcome::Unparseable => {
                warn!(%provider, signal = %signal.id, "Unparseable response");
                self.mark(signal, None).await;
                stats.failed += 1;
            }
        }

        tokio::time::sleep(self.pacing.request).await;
    }

    async fn save_project(
        &self,
        signal: &RawSignal,
        project: &Project,
        article_date: Option<&str>,
    ) -> Result<()> {
        let project_id = self.store.insert_project(project).await?;
        self.store
            .link_project_signal(project_id, signal.id)
            .await?;
        self.store
            .mark_signal_processed(signal.id, article_date)
            .await?;
        Ok(())
    }

    /// Mark a signal processed. Reports false on store failure so the caller
    /// counts the signal exactly once.
    async fn mark(&self, signal: &RawSignal, article_date: Option<&str>) -> bool {
        match self.store.mark_signal_processed(signal.id, article_date).await {
            Ok(()) => true,
            Err(e) => {
                warn!(signal = %signal.id, error = %e, "Failed to mark signal");
                tokio::time::sleep(self.pacing.error).await;
                false
            }
        }
    }

    /// Enrich forever, idling when the queue is clear.
    pub async fn run(&self) {
        loop {
            match self.process_batch().await {
                Ok(stats) if stats.fetched == 0 => {
                    info!("Pipeline clear, idling");
                    tokio::time::sleep(self.pacing.idle).await;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Batch failed");
                    tokio::time::sleep(self.pacing.idle).await;
                }
            }
        }
    }
}
