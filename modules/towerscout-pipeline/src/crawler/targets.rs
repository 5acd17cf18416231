/// An archive page candidate and how to read it.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveTarget {
    /// An HTML listing page to scan for article links.
    Html(String),
    /// A sitemap (or sitemap index) to pull `<loc>` entries from.
    Sitemap(String),
}

impl ArchiveTarget {
    pub fn url(&self) -> &str {
        match self {
            ArchiveTarget::Html(url) | ArchiveTarget::Sitemap(url) => url,
        }
    }
}

/// Candidate archive pages for a source root, in fetch order: WordPress-style
/// `/page/N/` paths, `?page=N` query pagination, then the common sitemap
/// locations. Sites that support none of these simply 404 the misses.
pub fn archive_targets(base_url: &str, max_pages: usize) -> Vec<ArchiveTarget> {
    let mut targets = Vec::with_capacity(max_pages * 2 + 3);

    for i in 1..=max_pages {
        targets.push(ArchiveTarget::Html(format!("{base_url}/page/{i}/")));
    }
    for i in 1..=max_pages {
        targets.push(ArchiveTarget::Html(format!("{base_url}/?page={i}")));
    }

    targets.push(ArchiveTarget::Sitemap(format!("{base_url}/sitemap.xml")));
    targets.push(ArchiveTarget::Sitemap(format!(
        "{base_url}/sitemap_index.xml"
    )));
    targets.push(ArchiveTarget::Sitemap(format!(
        "{base_url}/post-sitemap.xml"
    )));

    targets
}
