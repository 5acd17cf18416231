//! Harvest scheduling and enrichment pipeline for real-estate news.
//!
//! Three cooperating loops share one document store:
//! - the harvester crawls the most overdue source's archive for new articles
//! - the enricher drains unprocessed articles through an AI provider roster
//! - the auditor requeues sources that have gone quiet

pub mod auditor;
pub mod cleanup;
pub mod crawler;
pub mod dedup;
pub mod enricher;
pub mod fetch;
pub mod scheduler;
pub mod store;

pub use crawler::{ArchiveCrawler, CrawlLimits, DiscoveryStats};
pub use dedup::DedupRegistry;
pub use enricher::{BatchStats, Orchestrator, Pacing};
pub use fetch::{HttpFetcher, PageFetcher};
pub use scheduler::{pick_next_source, CycleOutcome, HarvestLoop};
pub use store::{InstantStore, Store};
