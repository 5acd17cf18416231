pub mod content;
pub mod links;
pub mod sitemap;
pub mod targets;

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{anyhow, Result};
use towerscout_common::{extract_domain, normalize_base_url, RawSignal, Source};
use tracing::{debug, info, warn};

use crate::dedup::DedupRegistry;
use crate::fetch::PageFetcher;
use crate::store::Store;

use content::extract_article_content;
use links::{extract_article_links, has_recent_year};
use sitemap::extract_sitemap_entries;
use targets::{archive_targets, ArchiveTarget};

/// How hard to dig into one source's archive.
#[derive(Debug, Clone)]
pub struct CrawlLimits {
    /// Pagination depth per pattern.
    pub archive_pages: usize,
    /// Pause between article fetches.
    pub article_delay: Duration,
    /// Pause between archive pages.
    pub page_delay: Duration,
}

impl CrawlLimits {
    /// Scheduled harvesting digs deep on one source at a time.
    pub fn deep() -> Self {
        Self {
            archive_pages: 20,
            article_delay: Duration::from_secs(2),
            page_delay: Duration::from_millis(500),
        }
    }

    /// One-shot sweeps across every source stay shallow.
    pub fn sweep() -> Self {
        Self {
            archive_pages: 10,
            article_delay: Duration::from_secs(2),
            page_delay: Duration::from_millis(500),
        }
    }

    /// Drop the pauses. Tests only.
    pub fn unpaced(mut self) -> Self {
        self.article_delay = Duration::ZERO;
        self.page_delay = Duration::ZERO;
        self
    }
}

/// Outcome of one source crawl.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DiscoveryStats {
    /// Signals harvested and saved this pass.
    pub new: usize,
    /// Article URLs already on record.
    pub duplicates: usize,
    /// Candidates that fetched empty, too short, or failed to save.
    pub rejected: usize,
}

/// Crawls one source's archive: enumerates pagination and sitemap targets,
/// collects candidate article URLs, and harvests each new article's text
/// into a raw signal.
pub struct ArchiveCrawler<'a> {
    fetcher: &'a dyn PageFetcher,
    store: &'a dyn Store,
    limits: CrawlLimits,
}

impl<'a> ArchiveCrawler<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, store: &'a dyn Store, limits: CrawlLimits) -> Self {
        Self {
            fetcher,
            store,
            limits,
        }
    }

    pub async fn discover(
        &self,
        source: &Source,
        registry: &mut DedupRegistry,
    ) -> Result<DiscoveryStats> {
        let base = normalize_base_url(&source.url)
            .ok_or_else(|| anyhow!("source {} has an empty URL", source.id))?;
        let label = source_label(&base);

        info!(source = %label, base = %base, "Crawling archive");

        let candidates = self.collect_candidates(&base).await;
        let recent: Vec<&String> = candidates.iter().filter(|u| has_recent_year(u)).collect();
        debug!(
            candidates = candidates.len(),
            recent = recent.len(),
            "Candidate article URLs"
        );

        let mut stats = DiscoveryStats::default();
        for url in recent {
            let url = url.trim_end_matches('/');
            if registry.contains(url) {
                stats.duplicates += 1;
                continue;
            }

            match self.harvest_article(source, url, &label).await {
                Ok(true) => {
                    registry.register(url);
                    stats.new += 1;
                }
                Ok(false) => stats.rejected += 1,
                Err(e) => {
                    warn!(%url, error = %e, "Failed to save signal");
                    stats.rejected += 1;
                }
            }

            tokio::time::sleep(self.limits.article_delay).await;
        }

        info!(
            source = %label,
            new = stats.new,
            duplicates = stats.duplicates,
            rejected = stats.rejected,
            "Crawl finished"
        );
        Ok(stats)
    }

    /// Sweep all archive targets and gather candidate article URLs.
    async fn collect_candidates(&self, base: &str) -> HashSet<String> {
        let mut candidates = HashSet::new();

        for target in archive_targets(base, self.limits.archive_pages) {
            let body = match self.fetcher.fetch(target.url()).await {
                Ok(Some(body)) => body,
                Ok(None) => continue,
                Err(e) => {
                    debug!(url = target.url(), error = %e, "Archive page fetch failed");
                    continue;
                }
            };

            match &target {
                ArchiveTarget::Html(url) => {
                    let links = extract_article_links(&body, base);
                    if !links.is_empty() {
                        debug!(%url, links = links.len(), "Archive page links");
                    }
                    candidates.extend(links);
                }
                ArchiveTarget::Sitemap(url) => {
                    let entries = extract_sitemap_entries(&body);
                    debug!(
                        %url,
                        pages = entries.pages.len(),
                        nested = entries.nested.len(),
                        "Sitemap entries"
                    );
                    candidates.extend(entries.pages);
                    // Index files are followed one level down, no deeper.
                    for nested_url in entries.nested {
                        if let Ok(Some(nested_body)) = self.fetcher.fetch(&nested_url).await {
                            candidates.extend(extract_sitemap_entries(&nested_body).pages);
                        }
                    }
                }
            }

            tokio::time::sleep(self.limits.page_delay).await;
        }

        candidates
    }

    /// Fetch one article and save it as a raw signal. Ok(false) means the
    /// page was missing or its content too thin to keep.
    async fn harvest_article(&self, source: &Source, url: &str, label: &str) -> Result<bool> {
        let html = match self.fetcher.fetch(url).await {
            Ok(Some(html)) => html,
            Ok(None) => return Ok(false),
            Err(e) => {
                debug!(%url, error = %e, "Article fetch failed");
                return Ok(false);
            }
        };

        let content = match extract_article_content(&html) {
            Some(content) => content,
            None => {
                debug!(%url, "No usable article content");
                return Ok(false);
            }
        };

        let signal = RawSignal::harvested(Some(source.id), url, content, label);
        self.store.add_raw_signal(&signal).await?;
        info!(source = %label, %url, "Harvested article");
        Ok(true)
    }
}

/// Human-readable source label: the domain without its `www.` prefix.
pub fn source_label(base_url: &str) -> String {
    let domain = extract_domain(base_url);
    domain
        .strip_prefix("www.")
        .unwrap_or(&domain)
        .to_string()
}
