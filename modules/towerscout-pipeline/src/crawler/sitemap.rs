use std::sync::OnceLock;

use regex::Regex;

use super::links::should_ignore;

/// Cap on URLs taken from a single sitemap.
const SITEMAP_URL_LIMIT: usize = 500;

fn loc_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<loc>\s*(.*?)\s*</loc>").unwrap())
}

/// `<loc>` entries split into page URLs and nested sitemaps.
#[derive(Debug, Default)]
pub struct SitemapEntries {
    pub pages: Vec<String>,
    pub nested: Vec<String>,
}

/// Pull `<loc>` entries out of sitemap XML. Tolerates namespaces and
/// malformed markup by matching tags textually rather than parsing the
/// document. Entries ending in `.xml` are nested sitemaps (index files);
/// everything else is a page URL, subject to the ignore patterns and the
/// overall cap.
pub fn extract_sitemap_entries(xml: &str) -> SitemapEntries {
    let mut entries = SitemapEntries::default();

    for cap in loc_regex().captures_iter(xml) {
        let loc = cap[1].trim();
        if loc.is_empty() {
            continue;
        }
        if loc.ends_with(".xml") {
            entries.nested.push(loc.to_string());
        } else if !should_ignore(loc) {
            entries.pages.push(loc.to_string());
            if entries.pages.len() >= SITEMAP_URL_LIMIT {
                break;
            }
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_page_urls() {
        let xml = r#"<?xml version="1.0"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>https://example.com/2025/03/skyline-tower/</loc></url>
              <url><loc> https://example.com/2025/04/harbor-lofts </loc></url>
            </urlset>"#;
        let entries = extract_sitemap_entries(xml);
        assert_eq!(
            entries.pages,
            vec![
                "https://example.com/2025/03/skyline-tower/",
                "https://example.com/2025/04/harbor-lofts"
            ]
        );
        assert!(entries.nested.is_empty());
    }

    #[test]
    fn classifies_index_entries_as_nested() {
        let xml = r#"<sitemapindex>
              <sitemap><loc>https://example.com/post-sitemap.xml</loc></sitemap>
              <sitemap><loc>https://example.com/page-sitemap.xml</loc></sitemap>
            </sitemapindex>"#;
        let entries = extract_sitemap_entries(xml);
        assert!(entries.pages.is_empty());
        assert_eq!(entries.nested.len(), 2);
    }

    #[test]
    fn applies_ignore_patterns() {
        let xml = r#"
            <url><loc>https://example.com/tag/miami/</loc></url>
            <url><loc>https://example.com/2025/06/story/</loc></url>
        "#;
        let entries = extract_sitemap_entries(xml);
        assert_eq!(entries.pages, vec!["https://example.com/2025/06/story/"]);
    }

    #[test]
    fn caps_page_count() {
        let mut xml = String::new();
        for i in 0..600 {
            xml.push_str(&format!("<url><loc>https://example.com/2025/{i}/</loc></url>"));
        }
        let entries = extract_sitemap_entries(&xml);
        assert_eq!(entries.pages.len(), 500);
    }
}
