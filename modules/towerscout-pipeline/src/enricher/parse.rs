use std::sync::OnceLock;

use ai_client::strip_code_blocks;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use towerscout_common::{now_ms, Project, UnitMixEntry};
use uuid::Uuid;

/// Nested numeric block of the extraction schema.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExtractionStats {
    #[serde(default)]
    pub gdv: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub floors: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub units: Option<i64>,
    #[serde(default)]
    pub delivery_date: Option<String>,
}

/// What the model returned. Field aliases absorb the schema drift between
/// model families; lenient number decoding absorbs "12" vs 12.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Extraction {
    #[serde(default, alias = "name")]
    pub project_name: Option<String>,
    #[serde(default)]
    pub developer: Option<String>,
    #[serde(default)]
    pub architect: Option<String>,
    #[serde(default)]
    pub lender: Option<String>,
    #[serde(default)]
    pub sales_team: Option<String>,
    #[serde(default, alias = "individuals")]
    pub key_people: Option<Vec<String>>,
    #[serde(default)]
    pub stats: Option<ExtractionStats>,
    #[serde(default)]
    pub unit_mix: Option<Vec<UnitMixEntry>>,
    #[serde(default)]
    pub status_stage: Option<String>,
    #[serde(default)]
    pub signal_type: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub article_date: Option<String>,
}

/// Result of interpreting a provider response.
#[derive(Debug)]
pub enum ExtractionOutcome {
    /// A residential project was extracted.
    Project(Box<Extraction>),
    /// The model looked at the text and declined (null project name); the
    /// article date may still have been extracted.
    Filtered { article_date: Option<String> },
    /// No JSON object could be recovered from the response.
    Unparseable,
}

fn object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").unwrap())
}

/// Interpret a raw model response: strip code fences, parse the JSON
/// directly, and if that fails fall back to the widest `{...}` span in the
/// text (models like to editorialize around the object).
pub fn parse_extraction(raw: &str) -> ExtractionOutcome {
    let cleaned = strip_code_blocks(raw);
    if cleaned.is_empty() || cleaned == "null" {
        return ExtractionOutcome::Filtered { article_date: None };
    }

    let value = match serde_json::from_str::<Value>(cleaned) {
        Ok(v) => Some(v),
        Err(_) => object_regex()
            .find(cleaned)
            .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok()),
    };

    let extraction: Extraction = match value.and_then(|v| serde_json::from_value(v).ok()) {
        Some(e) => e,
        None => return ExtractionOutcome::Unparseable,
    };

    match &extraction.project_name {
        Some(name) if !name.trim().is_empty() && name.trim() != "null" => {
            ExtractionOutcome::Project(Box::new(extraction))
        }
        _ => ExtractionOutcome::Filtered {
            article_date: extraction.article_date,
        },
    }
}

impl Extraction {
    /// Build the project record. Returns None when the extraction carries no
    /// project name (callers get this via [`ExtractionOutcome::Filtered`]
    /// already, so None here means a logic error upstream).
    pub fn into_project(self, signal_id: Uuid, source_url: Option<&str>) -> Option<Project> {
        let name = self.project_name.filter(|n| !n.trim().is_empty())?;
        let stats = self.stats.unwrap_or_default();

        Some(Project {
            name,
            developer: self.developer,
            architect: self.architect,
            lender: self.lender,
            sales_team: self.sales_team,
            key_people: self.key_people.unwrap_or_default(),
            gdv: stats.gdv,
            stories: stats.floors,
            units: stats.units,
            delivery_date: stats.delivery_date,
            unit_mix: self.unit_mix.unwrap_or_default(),
            status_stage: self.status_stage,
            signal_type: self.signal_type,
            image_url: self.image_url,
            address: self.address,
            city: self.city,
            coordinates: None,
            source_signal_id: signal_id,
            source_url: source_url.map(|u| u.to_string()),
            created_at: now_ms(),
        })
    }
}

/// Accept an integer, a float, or a numeric string; anything else is null.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(coerce_i64))
}

fn coerce_i64(value: Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}
