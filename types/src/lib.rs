//! Common types used by the doninai client and bot.
//!
//! [catalog] holds the static card attributes the bot ranks cards by, and
//! [api] the JSON-RPC frames exchanged with the game server.

pub mod api;
pub mod catalog;

pub use api::{Call, Id, Message, Method, StatePatch};
