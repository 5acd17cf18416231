use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current wall-clock time as epoch milliseconds, the store's timestamp unit.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// A root-domain crawl target registered for periodic harvesting.
///
/// `last_crawled` is absent for never-crawled sources; absent sorts before
/// any timestamp, so new sources are always highest priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_crawled: Option<i64>,
}

/// One harvested document: article body plus URL and metadata, pending or
/// having undergone enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSignal {
    pub id: Uuid,
    /// Owning source. Absent for manually-fed signals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<Uuid>,
    /// Absent only for manually-seeded signals, which cannot be deduplicated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub content: String,
    pub created_at: i64,
    #[serde(default)]
    pub processed: bool,
    /// Human-readable domain label recorded by the crawler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Article publication date in YYYY-MM-DD, derived during enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_date: Option<String>,
}

impl RawSignal {
    /// A freshly-harvested, unprocessed signal.
    pub fn harvested(
        source_id: Option<Uuid>,
        url: &str,
        content: String,
        source_label: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id,
            url: Some(url.to_string()),
            content,
            created_at: now_ms(),
            processed: false,
            source: Some(source_label.to_string()),
            article_date: None,
        }
    }
}

/// One line of a project's unit mix (e.g. "2BR", 120 units, "$850K+").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitMixEntry {
    #[serde(rename = "type", default)]
    pub unit_type: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub price: Option<String>,
}

/// Geographic point later filled in by the external geocoder. This core only
/// carries the field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A structured real-estate development record extracted from a RawSignal.
///
/// Exists only when the extraction passed the residential/hospitality filter
/// (non-null project name). One Project per successful extraction; projects
/// are not deduplicated by name across signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_team: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_people: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gdv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stories: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unit_mix: Vec<UnitMixEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub source_signal_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub created_at: i64,
}

/// Extract the domain from a URL (e.g., "https://www.example.com/path" ->
/// "www.example.com").
pub fn extract_domain(url: &str) -> String {
    url.split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

/// Normalize a source root URL: trim whitespace, default to https when
/// schemeless, strip the trailing slash. Returns None for empty input.
pub fn normalize_base_url(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    let url = if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    Some(url.trim_end_matches('/').to_string())
}
