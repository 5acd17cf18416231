use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

/// Below this many characters an extraction is navigation chrome, not an
/// article.
pub const MIN_CONTENT_LENGTH: usize = 500;

/// Content containers tried in order of specificity.
const CONTENT_SELECTORS: &[&str] = &[
    "div.entry-content",
    "article .content",
    "div.post-content",
    "div.article-content",
    "div.story-content",
    "article",
    "main",
    "div.content",
];

/// Chrome stripped before text extraction.
const STRIP_SELECTOR: &str = "script, style, nav, footer, header, aside, .sidebar, .comments, .sharedaddy, .jp-relatedposts, .related-posts, .advertisement, .ad-container";

/// Extract the main article text from a page. Tries known content
/// containers from most to least specific, falling back to the whole body;
/// returns None when nothing yields at least [`MIN_CONTENT_LENGTH`] chars.
pub fn extract_article_content(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let strip = Selector::parse(STRIP_SELECTOR).unwrap();
    let stripped: HashSet<NodeId> = document.select(&strip).map(|e| e.id()).collect();

    for selector_str in CONTENT_SELECTORS {
        let selector = Selector::parse(selector_str).unwrap();
        if let Some(container) = document.select(&selector).next() {
            let text = collect_text(container, &stripped);
            if text.len() >= MIN_CONTENT_LENGTH {
                return Some(text);
            }
        }
    }

    let body = Selector::parse("body").unwrap();
    if let Some(container) = document.select(&body).next() {
        let text = collect_text(container, &stripped);
        if text.len() >= MIN_CONTENT_LENGTH {
            return Some(text);
        }
    }

    None
}

/// Text of a container, newline-separated, skipping any node under a
/// stripped element.
fn collect_text(container: ElementRef<'_>, stripped: &HashSet<NodeId>) -> String {
    let mut parts: Vec<String> = Vec::new();

    for node in container.descendants() {
        if let Some(text) = node.value().as_text() {
            let under_stripped = node.ancestors().any(|a| stripped.contains(&a.id()));
            if under_stripped {
                continue;
            }
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed.to_string());
            }
        }
    }

    parts.join("\n")
}
