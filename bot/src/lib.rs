//! Autonomous player for the doninai deck-building game.
//!
//! A [Session](session::Session) reads server messages one at a time and
//! hands every `StartTurn` to a [Turn](turn::Turn), which plays actions,
//! plays treasures, buys what the [Strategy] asks for and ends the turn.
//! Attacks are answered wherever they arrive.

pub mod attack;
pub mod channel;
pub mod session;
pub mod state;
pub mod strategy;
pub mod turn;

pub use session::{Outcome, Record, Session};
pub use strategy::Strategy;

use doninai_client::{websocket_url, WebSocket};
use doninai_types::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Error type for bot operations. Every variant ends the session.
#[derive(Error, Debug)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] doninai_client::Error),
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{method} failed ({code}): {message}")]
    Protocol {
        method: String,
        code: i64,
        message: String,
    },
    #[error("server reported fatal error: {0}")]
    Fatal(String),
    #[error("unhandled attack: {0}")]
    UnhandledAttack(String),
    #[error("{0} request without id")]
    MissingId(Method),
    #[error("invalid {method} params: {source}")]
    InvalidParams {
        method: Method,
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

fn default_rounds() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Bot configuration (from config file, overridable by flags).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub http_endpoint: String,
    pub player: u32,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    #[serde(default)]
    pub strategy: Option<Strategy>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub response_timeout_ms: Option<u64>,
}

impl Config {
    pub fn new(http_endpoint: impl Into<String>, player: u32) -> Self {
        Self {
            http_endpoint: http_endpoint.into(),
            player,
            rounds: default_rounds(),
            strategy: None,
            log_level: default_log_level(),
            response_timeout_ms: None,
        }
    }

    /// Configured strategy, or the player's default.
    pub fn strategy(&self) -> Strategy {
        self.strategy
            .unwrap_or_else(|| Strategy::for_player(self.player))
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_ms.map(Duration::from_millis)
    }
}

/// Connect to the server and play every configured round.
pub async fn play(config: &Config) -> Result<Record> {
    let url = websocket_url(&config.http_endpoint, config.player)?;
    info!(%url, "Connecting");
    let transport = WebSocket::connect(&url, config.response_timeout()).await?;
    Session::new(transport, config.player, config.strategy(), config.rounds)
        .run()
        .await
}
