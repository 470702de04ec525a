//! Connection to a doninai game server.
//!
//! The bot only needs three things from the wire: send a frame, block until
//! the next frame arrives, and close. [Transport] captures that, [WebSocket]
//! implements it over `tokio-tungstenite`.

pub mod endpoint;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod transport;

pub use endpoint::{player_name, websocket_url};
pub use transport::{Transport, WebSocket};

use std::time::Duration;
use thiserror::Error;

/// Error type for client operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid URL scheme: {0} (expected http or https)")]
    InvalidScheme(String),
    #[error("no frame received within {0:?}")]
    Timeout(Duration),
    #[error("binary frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
