use thiserror::Error;

pub type Result<T> = std::result::Result<T, InstantError>;

#[derive(Debug, Error)]
pub enum InstantError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for InstantError {
    fn from(err: reqwest::Error) -> Self {
        InstantError::Network(err.to_string())
    }
}
