use std::collections::HashSet;

/// URL-identity dedup set shared across crawl cycles. Two URLs are the same
/// signal when they match after trailing-slash normalization.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    seen: HashSet<String>,
}

fn normalize(url: &str) -> &str {
    url.trim_end_matches('/')
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from every signal URL already on record.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let seen = urls
            .into_iter()
            .map(|u| normalize(u.as_ref()).to_string())
            .collect();
        Self { seen }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(normalize(url))
    }

    /// Record a URL. Returns false if it was already present.
    pub fn register(&mut self, url: &str) -> bool {
        self.seen.insert(normalize(url).to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_variants_collide() {
        let mut registry = DedupRegistry::new();
        assert!(registry.register("https://example.com/2025/tower/"));
        assert!(registry.contains("https://example.com/2025/tower"));
        assert!(!registry.register("https://example.com/2025/tower"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn seeding_from_stored_urls() {
        let registry = DedupRegistry::from_urls(vec![
            "https://a.com/2025/one/",
            "https://a.com/2025/two",
        ]);
        assert!(registry.contains("https://a.com/2025/one"));
        assert!(registry.contains("https://a.com/2025/two/"));
        assert!(!registry.contains("https://a.com/2025/three"));
    }
}
