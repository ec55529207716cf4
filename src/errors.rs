use std::result::Result as StdResult;

use thiserror::Error;

/// Error type that captures ledger and persistence failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Stored value for `{key}` could not be decoded: {message}")]
    Decode { key: String, message: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("`{key}` would become {value}, which cannot be stored")]
    OutOfRange { key: String, value: f64 },
}

impl LedgerError {
    pub fn decode(key: &str, message: impl Into<String>) -> Self {
        LedgerError::Decode {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = StdResult<T, LedgerError>;
