use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The gateway session is not live. Fatal to `start()`.
    #[error("gateway session is not connected")]
    NotConnected,

    /// Missing quote/candle data for one instrument. Skip it this tick.
    #[error("market data unavailable: {0}")]
    DataUnavailable(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
