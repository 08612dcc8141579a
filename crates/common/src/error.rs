//! Error types for the dealer exposure workspace

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GexError {
    #[error("Invalid option right code: {0:?}")]
    InvalidRight(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("No chain data found for {symbol}")]
    ChainNotFound { symbol: String },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type GexResult<T> = Result<T, GexError>;

impl GexError {
    pub fn chain_not_found(symbol: impl Into<String>) -> Self {
        Self::ChainNotFound {
            symbol: symbol.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
