use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::ProviderError;
use crate::gemini::GeminiProvider;
use crate::groq::GroqProvider;

/// One extraction backend: single-turn text completion.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
    fn name(&self) -> &str;
}

#[async_trait]
impl Provider for GroqProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        GroqProvider::generate(self, prompt).await
    }

    fn name(&self) -> &str {
        self.model()
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        GeminiProvider::generate(self, prompt).await
    }

    fn name(&self) -> &str {
        self.model()
    }
}

#[derive(Debug, Error)]
pub enum RosterError {
    /// Every roster entry failed or was skipped for this call.
    #[error("all providers exhausted")]
    Exhausted {
        /// True when at least one entry was turned away by a rate limit, so
        /// the same call may succeed after a cooldown. False means every
        /// entry hard-failed and a retry is unlikely to help.
        rate_limited: bool,
    },
}

/// Ordered list of extraction providers tried in sequence; the first to
/// return a non-empty response wins. Model-not-found entries are skipped for
/// the call; rate-limited entries are skipped in favor of the next one.
pub struct Roster {
    entries: Vec<Box<dyn Provider>>,
    /// Jitter range slept before each attempt, to desynchronize 429s.
    jitter: (u64, u64),
}

impl Roster {
    pub fn new(entries: Vec<Box<dyn Provider>>) -> Self {
        Self {
            entries,
            jitter: (500, 1500),
        }
    }

    /// The default engine order: Groq first for speed and volume, Gemini as
    /// backup. Entries whose API key is missing are left out.
    pub fn from_keys(groq_api_key: &str, google_api_key: &str) -> Self {
        let mut entries: Vec<Box<dyn Provider>> = Vec::new();
        if !groq_api_key.is_empty() {
            entries.push(Box::new(GroqProvider::new(
                groq_api_key,
                "llama-3.3-70b-versatile",
            )));
            entries.push(Box::new(GroqProvider::new(
                groq_api_key,
                "llama-3.1-8b-instant",
            )));
        }
        if !google_api_key.is_empty() {
            entries.push(Box::new(GeminiProvider::new(
                google_api_key,
                "gemini-flash-latest",
            )));
            entries.push(Box::new(GeminiProvider::new(
                google_api_key,
                "gemini-2.0-flash",
            )));
        }
        Self::new(entries)
    }

    /// Drop the pre-attempt jitter. Tests only.
    pub fn without_jitter(mut self) -> Self {
        self.jitter = (0, 1);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Try each entry in order until one returns text. Returns the response
    /// and the name of the provider that produced it.
    pub async fn generate(&self, prompt: &str) -> Result<(String, String), RosterError> {
        let mut rate_limited = false;

        for entry in &self.entries {
            let jitter_ms = rand::rng().random_range(self.jitter.0..self.jitter.1);
            tokio::time::sleep(Duration::from_millis(jitter_ms)).await;

            match entry.generate(prompt).await {
                Ok(text) => {
                    info!(provider = entry.name(), "Provider responded");
                    return Ok((text, entry.name().to_string()));
                }
                Err(ProviderError::ModelNotFound) => {
                    info!(provider = entry.name(), "Model not found, skipping");
                }
                Err(ProviderError::RateLimited) => {
                    warn!(provider = entry.name(), "Rate limited, trying next entry");
                    rate_limited = true;
                }
                Err(e) => {
                    warn!(provider = entry.name(), error = %e, "Provider error, trying next entry");
                }
            }
        }

        Err(RosterError::Exhausted { rate_limited })
    }
}
