use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use ai_client::{Provider, ProviderError, Roster};
use towerscout_common::{now_ms, RawSignal, Source};
use towerscout_pipeline::auditor::StalenessAuditor;
use towerscout_pipeline::cleanup::prune_non_root_sources;
use towerscout_pipeline::store::MemoryStore;
use towerscout_pipeline::{
    CrawlLimits, CycleOutcome, DedupRegistry, HarvestLoop, Orchestrator, Pacing, PageFetcher,
    Store,
};

// --- fixtures ---

struct SiteFetcher {
    pages: HashMap<String, String>,
}

impl SiteFetcher {
    fn new(pages: Vec<(&str, String)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(url, body)| (url.to_string(), body))
                .collect(),
        }
    }
}

#[async_trait]
impl PageFetcher for SiteFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<String>> {
        Ok(self.pages.get(url).cloned())
    }
}

struct CannedProvider {
    body: &'static str,
    calls: Arc<AtomicUsize>,
}

impl CannedProvider {
    fn new(body: &'static str) -> Self {
        Self {
            body,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Provider for CannedProvider {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.to_string())
    }

    fn name(&self) -> &str {
        "canned"
    }
}

struct BrokenProvider;

#[async_trait]
impl Provider for BrokenProvider {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Api {
            status: 500,
            message: "internal error".into(),
        })
    }

    fn name(&self) -> &str {
        "broken"
    }
}

struct RateLimitedProvider;

#[async_trait]
impl Provider for RateLimitedProvider {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::RateLimited)
    }

    fn name(&self) -> &str {
        "limited"
    }
}

fn article_html(body: &str) -> String {
    let body = body.repeat(30);
    format!(r#"<html><body><div class="entry-content"><p>{body}</p></div></body></html>"#)
}

fn tiny_limits() -> CrawlLimits {
    let mut limits = CrawlLimits::deep().unpaced();
    limits.archive_pages = 1;
    limits
}

fn long_signal(content_seed: &str) -> RawSignal {
    RawSignal::harvested(
        None,
        "https://example.com/2025/06/story",
        content_seed.repeat(10),
        "example.com",
    )
}

// --- harvesting ---

#[tokio::test]
async fn harvest_cycle_saves_new_articles_and_stamps_the_source() {
    let store = MemoryStore::new();
    let source_id = store.add_source("https://example.com").await.unwrap();

    let listing = r#"
        <a href="/2025/03/skyline-tower/">Skyline</a>
        <a href="/2025/04/harbor-lofts/">Harbor</a>
        <a href="/about/">About</a>
    "#;
    let fetcher = SiteFetcher::new(vec![
        ("https://example.com/page/1/", listing.to_string()),
        (
            "https://example.com/2025/03/skyline-tower",
            article_html("Developers filed plans for a 40-story condo tower. "),
        ),
        (
            "https://example.com/2025/04/harbor-lofts",
            article_html("A 12-story waterfront condo project got approval. "),
        ),
    ]);

    let harvester = HarvestLoop::new(&store, &fetcher, tiny_limits());
    let mut registry = DedupRegistry::new();

    match harvester.run_once(&mut registry).await {
        CycleOutcome::Crawled { source_url, stats } => {
            assert_eq!(source_url, "https://example.com");
            assert_eq!(stats.new, 2);
            assert_eq!(stats.duplicates, 0);
        }
        other => panic!("expected crawl, got {other:?}"),
    }

    let signals = store.signals();
    assert_eq!(signals.len(), 2);
    assert!(signals.iter().all(|s| !s.processed));
    assert!(signals.iter().all(|s| s.source_id == Some(source_id)));
    assert!(signals
        .iter()
        .all(|s| s.source.as_deref() == Some("example.com")));

    let sources = store.sources();
    assert!(sources[0].last_crawled.is_some());
}

#[tokio::test]
async fn second_harvest_pass_is_idempotent() {
    let store = MemoryStore::new();
    store.add_source("https://example.com").await.unwrap();

    let fetcher = SiteFetcher::new(vec![
        (
            "https://example.com/page/1/",
            r#"<a href="/2025/03/skyline-tower/">Skyline</a>"#.to_string(),
        ),
        (
            "https://example.com/2025/03/skyline-tower",
            article_html("Developers filed plans for a 40-story condo tower. "),
        ),
    ]);

    let harvester = HarvestLoop::new(&store, &fetcher, tiny_limits());
    let mut registry = DedupRegistry::new();

    harvester.run_once(&mut registry).await;
    assert_eq!(store.signals().len(), 1);

    match harvester.run_once(&mut registry).await {
        CycleOutcome::Crawled { stats, .. } => {
            assert_eq!(stats.new, 0);
            assert_eq!(stats.duplicates, 1);
        }
        other => panic!("expected crawl, got {other:?}"),
    }
    assert_eq!(store.signals().len(), 1);
}

#[tokio::test]
async fn dedup_registry_seeded_from_store_prevents_refetch() {
    let store = MemoryStore::new();
    store.add_source("https://example.com").await.unwrap();
    store.push_signal(RawSignal::harvested(
        None,
        "https://example.com/2025/03/skyline-tower",
        "already harvested".into(),
        "example.com",
    ));

    let fetcher = SiteFetcher::new(vec![(
        "https://example.com/page/1/",
        r#"<a href="/2025/03/skyline-tower/">Skyline</a>"#.to_string(),
    )]);

    let harvester = HarvestLoop::new(&store, &fetcher, tiny_limits());
    let mut registry = DedupRegistry::from_urls(store.signal_urls().await.unwrap());

    match harvester.run_once(&mut registry).await {
        CycleOutcome::Crawled { stats, .. } => {
            assert_eq!(stats.new, 0);
            assert_eq!(stats.duplicates, 1);
        }
        other => panic!("expected crawl, got {other:?}"),
    }
    assert_eq!(store.signals().len(), 1);
}

#[tokio::test]
async fn sitemap_candidates_are_harvested() {
    let store = MemoryStore::new();
    store.add_source("https://example.com").await.unwrap();

    let sitemap = r#"<urlset>
        <url><loc>https://example.com/2025/05/brickell-one/</loc></url>
        <url><loc>https://example.com/2019/05/too-old/</loc></url>
    </urlset>"#;
    let fetcher = SiteFetcher::new(vec![
        ("https://example.com/sitemap.xml", sitemap.to_string()),
        (
            "https://example.com/2025/05/brickell-one",
            article_html("A 60-story residential supertall broke ground. "),
        ),
    ]);

    let harvester = HarvestLoop::new(&store, &fetcher, tiny_limits());
    let mut registry = DedupRegistry::new();

    match harvester.run_once(&mut registry).await {
        CycleOutcome::Crawled { stats, .. } => assert_eq!(stats.new, 1),
        other => panic!("expected crawl, got {other:?}"),
    }
    let signals = store.signals();
    assert_eq!(
        signals[0].url.as_deref(),
        Some("https://example.com/2025/05/brickell-one")
    );
}

#[tokio::test]
async fn empty_store_idles() {
    let store = MemoryStore::new();
    let fetcher = SiteFetcher::new(vec![]);
    let harvester = HarvestLoop::new(&store, &fetcher, tiny_limits());
    let mut registry = DedupRegistry::new();
    assert_eq!(harvester.run_once(&mut registry).await, CycleOutcome::Idle);
}

#[tokio::test]
async fn never_crawled_source_goes_first() {
    let store = MemoryStore::with_sources(vec![
        Source {
            id: Uuid::new_v4(),
            url: "https://old.com".into(),
            last_crawled: Some(1_700_000_000_000),
        },
        Source {
            id: Uuid::new_v4(),
            url: "https://fresh.com".into(),
            last_crawled: None,
        },
    ]);
    let fetcher = SiteFetcher::new(vec![]);
    let harvester = HarvestLoop::new(&store, &fetcher, tiny_limits());
    let mut registry = DedupRegistry::new();

    match harvester.run_once(&mut registry).await {
        CycleOutcome::Crawled { source_url, .. } => assert_eq!(source_url, "https://fresh.com"),
        other => panic!("expected crawl, got {other:?}"),
    }
}

// --- enrichment ---

const PROJECT_JSON: &str = r#"{
    "project_name": "Skyline Tower",
    "developer": "Acme Development",
    "key_people": ["Jorge Perez (Developer)"],
    "stats": {"gdv": "$500M", "floors": 40, "units": 200, "delivery_date": "2027"},
    "status_stage": "Planning",
    "address": "100 Main St",
    "article_date": "2025-06-12"
}"#;

#[tokio::test]
async fn enrichment_saves_project_and_links_signal() {
    let store = MemoryStore::new();
    let signal = long_signal("Developers filed plans for a 40-story condo tower. ");
    let signal_id = signal.id;
    store.push_signal(signal);

    let roster = Roster::new(vec![Box::new(CannedProvider::new(PROJECT_JSON))]).without_jitter();
    let orchestrator = Orchestrator::new(&store, &roster).with_pacing(Pacing::instant());

    let stats = orchestrator.process_batch().await.unwrap();
    assert_eq!(stats.fetched, 1);
    assert_eq!(stats.projects, 1);

    let projects = store.projects();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "Skyline Tower");
    assert_eq!(projects[0].units, Some(200));
    assert_eq!(projects[0].stories, Some(40));
    assert_eq!(projects[0].source_signal_id, signal_id);

    let links = store.links();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].1, signal_id);

    let signals = store.signals();
    assert!(signals[0].processed);
    assert_eq!(signals[0].article_date.as_deref(), Some("2025-06-12"));
}

#[tokio::test]
async fn non_residential_articles_are_filtered_but_dated() {
    let store = MemoryStore::new();
    store.push_signal(long_signal("A new Target store opened downtown. "));

    let roster = Roster::new(vec![Box::new(CannedProvider::new(
        r#"{"project_name": null, "article_date": "2025-02-01"}"#,
    ))])
    .without_jitter();
    let orchestrator = Orchestrator::new(&store, &roster).with_pacing(Pacing::instant());

    let stats = orchestrator.process_batch().await.unwrap();
    assert_eq!(stats.filtered, 1);
    assert!(store.projects().is_empty());

    let signals = store.signals();
    assert!(signals[0].processed);
    assert_eq!(signals[0].article_date.as_deref(), Some("2025-02-01"));
}

#[tokio::test]
async fn tiny_signals_skip_the_roster() {
    let store = MemoryStore::new();
    store.push_signal(RawSignal::harvested(
        None,
        "https://example.com/2025/06/stub",
        "too short".into(),
        "example.com",
    ));

    let provider = CannedProvider::new(PROJECT_JSON);
    let calls = Arc::clone(&provider.calls);
    let roster = Roster::new(vec![Box::new(provider)]).without_jitter();
    let orchestrator = Orchestrator::new(&store, &roster).with_pacing(Pacing::instant());

    let stats = orchestrator.process_batch().await.unwrap();
    assert_eq!(stats.skipped, 1);
    assert!(store.signals()[0].processed);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn exhausted_roster_leaves_signal_queued() {
    let store = MemoryStore::new();
    store.push_signal(long_signal("Developers filed plans for a condo tower. "));

    let roster = Roster::new(vec![Box::new(RateLimitedProvider)]).without_jitter();
    let orchestrator = Orchestrator::new(&store, &roster).with_pacing(Pacing::instant());

    let stats = orchestrator.process_batch().await.unwrap();
    assert_eq!(stats.deferred, 1);
    assert_eq!(stats.projects, 0);
    assert!(!store.signals()[0].processed);
}

#[tokio::test]
async fn hard_provider_failures_do_not_wedge_the_queue() {
    let store = MemoryStore::new();
    for _ in 0..11 {
        store.push_signal(long_signal("Developers filed plans for a condo tower. "));
    }

    let roster = Roster::new(vec![Box::new(BrokenProvider)]).without_jitter();
    let orchestrator = Orchestrator::new(&store, &roster).with_pacing(Pacing::instant());

    // First batch gives up on all ten fetched signals instead of deferring
    // them, so the second batch reaches the rest of the backlog.
    let stats = orchestrator.process_batch().await.unwrap();
    assert_eq!(stats.fetched, 10);
    assert_eq!(stats.failed, 10);
    assert_eq!(stats.deferred, 0);

    let stats = orchestrator.process_batch().await.unwrap();
    assert_eq!(stats.fetched, 1);
    assert_eq!(stats.failed, 1);

    assert!(store.signals().iter().all(|s| s.processed));
    assert!(store.projects().is_empty());
}

#[tokio::test]
async fn unparseable_responses_mark_the_signal_processed() {
    let store = MemoryStore::new();
    store.push_signal(long_signal("Developers filed plans for a condo tower. "));

    let roster = Roster::new(vec![Box::new(CannedProvider::new(
        "Sorry, I cannot help with that.",
    ))])
    .without_jitter();
    let orchestrator = Orchestrator::new(&store, &roster).with_pacing(Pacing::instant());

    let stats = orchestrator.process_batch().await.unwrap();
    assert_eq!(stats.failed, 1);
    assert!(store.signals()[0].processed);
    assert!(store.projects().is_empty());
}

#[tokio::test]
async fn whole_batch_ends_processed() {
    let store = MemoryStore::new();
    for _ in 0..5 {
        store.push_signal(long_signal("Developers filed plans for a condo tower. "));
    }

    let roster = Roster::new(vec![Box::new(CannedProvider::new(PROJECT_JSON))]).without_jitter();
    let orchestrator = Orchestrator::new(&store, &roster).with_pacing(Pacing::instant());

    let stats = orchestrator.process_batch().await.unwrap();
    assert_eq!(stats.fetched, 5);
    assert_eq!(stats.projects, 5);
    assert!(store.signals().iter().all(|s| s.processed));
}

// --- auditing ---

#[tokio::test]
async fn audit_requeues_stale_sources_up_to_the_limit() {
    const HOUR_MS: i64 = 3_600_000;
    let now = now_ms();

    let mut sources = vec![Source {
        id: Uuid::new_v4(),
        url: "https://healthy.com".into(),
        last_crawled: Some(now - HOUR_MS),
    }];
    for i in 0..12 {
        sources.push(Source {
            id: Uuid::new_v4(),
            url: format!("https://stale-{i}.com"),
            last_crawled: Some(now - 72 * HOUR_MS),
        });
    }
    let store = MemoryStore::with_sources(sources);

    let report = StalenessAuditor::new(&store).audit().await.unwrap();
    assert_eq!(report.healthy, 1);
    assert_eq!(report.stale, 12);
    assert_eq!(report.requeued, 10);

    let reset = store
        .sources()
        .iter()
        .filter(|s| s.last_crawled.is_none())
        .count();
    assert_eq!(reset, 10);
}

#[tokio::test]
async fn recent_signal_keeps_a_skipped_source_healthy() {
    const HOUR_MS: i64 = 3_600_000;
    let now = now_ms();
    let source_id = Uuid::new_v4();

    let store = MemoryStore::with_sources(vec![Source {
        id: source_id,
        url: "https://busy.com".into(),
        last_crawled: Some(now - 100 * HOUR_MS),
    }]);
    let mut signal = RawSignal::harvested(
        Some(source_id),
        "https://busy.com/2025/06/story",
        "fresh find".into(),
        "busy.com",
    );
    signal.created_at = now - HOUR_MS;
    store.push_signal(signal);

    let report = StalenessAuditor::new(&store).audit().await.unwrap();
    assert_eq!(report.healthy, 1);
    assert_eq!(report.stale, 0);
    assert_eq!(report.requeued, 0);
    assert!(store.sources()[0].last_crawled.is_some());
}

// --- cleanup ---

#[tokio::test]
async fn cleanup_deletes_only_non_root_sources() {
    let store = MemoryStore::new();
    store.add_source("https://floridayimby.com").await.unwrap();
    store
        .add_source("https://example.com/2025/06/story")
        .await
        .unwrap();
    store.add_source("https://example.com/?page=2").await.unwrap();

    let stats = prune_non_root_sources(&store).await.unwrap();
    assert_eq!(stats.kept, 1);
    assert_eq!(stats.deleted, 2);

    let sources = store.sources();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].url, "https://floridayimby.com");
}

// keep the pauses honest: default pacing should not be instant
#[test]
fn default_pacing_matches_production_values() {
    let pacing = Pacing::default();
    assert_eq!(pacing.request, Duration::from_secs(5));
    assert_eq!(pacing.rate_limit_cooldown, Duration::from_secs(30));
    assert_eq!(pacing.idle, Duration::from_secs(30));
}
