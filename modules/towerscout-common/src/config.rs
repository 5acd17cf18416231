use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Document store
    pub instant_api_base: String,
    pub instant_app_id: String,
    pub instant_admin_token: String,

    // AI providers
    pub groq_api_key: String,
    pub google_api_key: String,
}

const DEFAULT_API_BASE: &str = "https://api.instantdb.com/admin";

impl Config {
    /// Load full configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            instant_api_base: env::var("INSTANT_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            instant_app_id: required_env("INSTANT_APP_ID"),
            instant_admin_token: required_env("INSTANT_ADMIN_TOKEN"),
            groq_api_key: required_env("GROQ_API_KEY"),
            google_api_key: env::var("GOOGLE_API_KEY").unwrap_or_default(),
        }
    }

    /// Load a minimal config for crawl-only processes (no AI keys needed).
    pub fn harvest_from_env() -> Self {
        Self {
            instant_api_base: env::var("INSTANT_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            instant_app_id: required_env("INSTANT_APP_ID"),
            instant_admin_token: required_env("INSTANT_ADMIN_TOKEN"),
            groq_api_key: String::new(),
            google_api_key: String::new(),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
