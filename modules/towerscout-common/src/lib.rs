pub mod config;
pub mod types;

pub use config::Config;
pub use types::{
    extract_domain, normalize_base_url, now_ms, Project, RawSignal, Source, UnitMixEntry,
};
