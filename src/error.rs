// Boundary errors
// The engine and the validator never fail; these only surface while
// decoding payloads and loading configuration

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: String },
}
