//! Error types for keydesk.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Key lookup errors
    #[error("No license key found for: {0}")]
    NotFound(String),

    #[error("License key already exists: {key}")]
    AlreadyExists { key: String },

    // Remote throttling
    #[error("HWID reset on cooldown for {minutes_remaining} minutes")]
    OnCooldown { minutes_remaining: f64 },

    // Remote API errors
    #[error("Remote API error: {0}")]
    Remote(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Caller errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
