pub mod error;

pub use error::{InstantError, Result};

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

/// One transaction step in the store's array wire form:
/// `["update", collection, id, fields]`, `["delete", collection, id]`,
/// `["link", collection, id, relation, target_id]`.
#[derive(Debug, Clone, PartialEq)]
pub enum TxStep {
    Update {
        collection: String,
        id: String,
        fields: Value,
    },
    Delete {
        collection: String,
        id: String,
    },
    Link {
        collection: String,
        id: String,
        relation: String,
        target_id: String,
    },
}

impl TxStep {
    pub fn update(collection: &str, id: &str, fields: Value) -> Self {
        Self::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        }
    }

    pub fn delete(collection: &str, id: &str) -> Self {
        Self::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn link(collection: &str, id: &str, relation: &str, target_id: &str) -> Self {
        Self::Link {
            collection: collection.to_string(),
            id: id.to_string(),
            relation: relation.to_string(),
            target_id: target_id.to_string(),
        }
    }
}

impl Serialize for TxStep {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let arr = match self {
            TxStep::Update {
                collection,
                id,
                fields,
            } => json!(["update", collection, id, fields]),
            TxStep::Delete { collection, id } => json!(["delete", collection, id]),
            TxStep::Link {
                collection,
                id,
                relation,
                target_id,
            } => json!(["link", collection, id, relation, target_id]),
        };
        arr.serialize(serializer)
    }
}

/// Client for the document store's admin API. Exposes exactly the two calls
/// the pipeline relies on: `query` (fetch collections by pattern) and
/// `transact` (ordered write steps). Both may fail on network/auth/timeout;
/// callers treat failures as non-fatal and retry on the next cycle.
pub struct InstantClient {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
    admin_token: String,
}

impl InstantClient {
    pub fn new(base_url: &str, app_id: &str, admin_token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
            admin_token: admin_token.to_string(),
        }
    }

    /// Execute a query. `pattern` maps collection names to filter specs;
    /// an empty object fetches the whole collection.
    pub async fn query(&self, pattern: Value) -> Result<Value> {
        let endpoint = format!("{}/query", self.base_url);
        debug!(%pattern, "instant query");

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("App-Id", &self.app_id)
            .header("Authorization", format!("Bearer {}", self.admin_token))
            .json(&json!({ "query": pattern }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(InstantError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }

    /// Execute an ordered list of transaction steps.
    pub async fn transact(&self, steps: &[TxStep]) -> Result<Value> {
        let endpoint = format!("{}/transact", self.base_url);
        debug!(steps = steps.len(), "instant transact");

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("App-Id", &self.app_id)
            .header("Authorization", format!("Bearer {}", self.admin_token))
            .json(&json!({ "steps": steps }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(InstantError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_step_serializes_to_array_form() {
        let step = TxStep::update("sources", "abc", json!({"last_crawled": 1700000000000_i64}));
        let v = serde_json::to_value(&step).unwrap();
        assert_eq!(
            v,
            json!(["update", "sources", "abc", {"last_crawled": 1700000000000_i64}])
        );
    }

    #[test]
    fn link_step_serializes_to_array_form() {
        let step = TxStep::link("projects", "p1", "signals", "s1");
        let v = serde_json::to_value(&step).unwrap();
        assert_eq!(v, json!(["link", "projects", "p1", "signals", "s1"]));
    }

    #[test]
    fn delete_step_serializes_to_array_form() {
        let step = TxStep::delete("sources", "x");
        let v = serde_json::to_value(&step).unwrap();
        assert_eq!(v, json!(["delete", "sources", "x"]));
    }
}
