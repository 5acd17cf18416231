use ai_client::truncate_to_char_boundary;

/// Article text beyond this is dropped before prompting; extraction quality
/// plateaus well below it and the cheaper models have tight token limits.
pub const MAX_CONTENT_LEN: usize = 25_000;

pub const SYSTEM_PROMPT: &str = r#"STRICT FILTERING RULE: You are looking ONLY for 'High-Rise Residential', 'Condo', 'Mixed-Use with Residential', or 'Luxury Hospitality' projects.
- DISCARD any project that is purely Commercial, Retail (e.g., Amazon Fresh, Target, standalone stores), Industrial, or Single Family Homes.
- If the text describes a retail store WITHOUT a residential tower component, return {"project_name": null}.
- If valid, extract the JSON below.

You are a Real Estate Intelligence Officer. Analyze the text and extract the following JSON. Be precise. If a field is not found, use null.

{
  "project_name": string,
  "developer": string,
  "architect": string,
  "lender": string,
  "sales_team": string,
  "key_people": [string],
  "stats": {
    "gdv": string,
    "floors": int,
    "units": int,
    "delivery_date": string
  },
  "unit_mix": [{"type": string, "count": int, "price": string}],
  "status_stage": string,
  "signal_type": string,
  "image_url": string,
  "address": string,
  "city": string,
  "article_date": string
}

Return ONLY valid JSON, no markdown code blocks."#;

pub fn build_prompt(content: &str) -> String {
    let content = truncate_to_char_boundary(content, MAX_CONTENT_LEN);
    format!("{SYSTEM_PROMPT}\n\n---\n\nTEXT TO ANALYZE:\n{content}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_content_after_instructions() {
        let prompt = build_prompt("A 40-story condo tower was announced.");
        assert!(prompt.starts_with("STRICT FILTERING RULE"));
        assert!(prompt.ends_with("A 40-story condo tower was announced."));
        assert!(prompt.contains("TEXT TO ANALYZE:"));
    }

    #[test]
    fn schema_requests_every_project_field() {
        for field in [
            "\"project_name\"",
            "\"key_people\"",
            "\"unit_mix\"",
            "\"address\"",
            "\"city\"",
            "\"article_date\"",
        ] {
            assert!(SYSTEM_PROMPT.contains(field), "schema is missing {field}");
        }
    }

    #[test]
    fn long_content_is_truncated() {
        let long = "x".repeat(40_000);
        let prompt = build_prompt(&long);
        assert!(prompt.len() < SYSTEM_PROMPT.len() + MAX_CONTENT_LEN + 100);
    }
}
