use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

/// URL path fragments that are never article pages.
const IGNORE_PATTERNS: &[&str] = &[
    "/contact",
    "/about",
    "/login",
    "/privacy",
    "/terms",
    "/advertise",
    "/subscribe",
    "/newsletter",
    "/tag/",
    "/category/",
    "/author/",
    "/wp-admin",
    "/wp-login",
    "/feed/",
    "/rss",
    "/sitemap",
    "/search",
];

pub fn should_ignore(url: &str) -> bool {
    let lower = url.to_lowercase();
    IGNORE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Recency gate: news archives are date-pathed, so only `/2024/`, `/2025/`
/// and `/2026/` URLs are worth fetching.
pub fn has_recent_year(url: &str) -> bool {
    url.contains("/2024/") || url.contains("/2025/") || url.contains("/2026/")
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Extract candidate article links from an archive listing page.
///
/// - Resolves relative hrefs against `base_url`
/// - Keeps same-domain http(s) links only (www-insensitive)
/// - Drops navigation/legal pages via the ignore patterns
/// - Strips fragments and query strings, trims the trailing slash
/// - Skips the homepage itself
pub fn extract_article_links(html: &str, base_url: &str) -> HashSet<String> {
    let base = match Url::parse(base_url) {
        Ok(u) => u,
        Err(_) => return HashSet::new(),
    };
    let base_domain = match base.host_str() {
        Some(h) => strip_www(h).to_string(),
        None => return HashSet::new(),
    };

    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("a[href]").unwrap();

    let mut links = HashSet::new();
    for element in document.select(&anchor_selector) {
        let href = match element.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };
        if href.is_empty() {
            continue;
        }

        let resolved = match base.join(href) {
            Ok(u) => u,
            Err(_) => continue,
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }

        let link_domain = match resolved.host_str() {
            Some(h) => strip_www(h).to_string(),
            None => continue,
        };
        if !base_domain.contains(&link_domain) && !link_domain.contains(&base_domain) {
            continue;
        }

        if should_ignore(resolved.as_str()) {
            continue;
        }

        let host = match resolved.host_str() {
            Some(h) => h,
            None => continue,
        };
        let clean = format!("{}://{}{}", resolved.scheme(), host, resolved.path());
        let clean = clean.trim_end_matches('/').to_string();

        if clean == base_url {
            continue;
        }

        links.insert(clean);
    }

    links
}
