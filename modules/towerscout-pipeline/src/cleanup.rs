use anyhow::Result;
use tracing::{info, warn};
use url::Url;

use crate::store::Store;

/// The scheduler only makes sense over root domains; a source pointing at an
/// individual article would be re-crawled as if it were an archive. True
/// when the URL has no path beyond `/` and no query.
pub fn is_root_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            (parsed.path().is_empty() || parsed.path() == "/") && parsed.query().is_none()
        }
        Err(_) => false,
    }
}

/// Summary of one cleanup pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CleanupStats {
    pub kept: usize,
    pub deleted: usize,
}

/// Delete every source whose URL is not a bare root domain.
pub async fn prune_non_root_sources(store: &dyn Store) -> Result<CleanupStats> {
    let sources = store.all_sources().await?;
    let mut stats = CleanupStats::default();

    for source in sources {
        if is_root_url(&source.url) {
            stats.kept += 1;
            continue;
        }
        match store.delete_source(source.id).await {
            Ok(()) => {
                info!(url = %source.url, "Deleted non-root source");
                stats.deleted += 1;
            }
            Err(e) => warn!(url = %source.url, error = %e, "Failed to delete source"),
        }
    }

    info!(kept = stats.kept, deleted = stats.deleted, "Cleanup finished");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_urls_pass() {
        assert!(is_root_url("https://floridayimby.com"));
        assert!(is_root_url("https://www.example.com/"));
    }

    #[test]
    fn article_urls_fail() {
        assert!(!is_root_url("https://example.com/2025/06/story"));
        assert!(!is_root_url("https://example.com/?page=2"));
        assert!(!is_root_url("not a url"));
    }
}
