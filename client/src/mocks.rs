//! In-memory transport for driving the bot without a server.

use crate::{Error, Result, Transport};
use serde_json::Value;
use std::collections::VecDeque;

/// Replays a fixed script of server frames and records everything sent.
///
/// Because the protocol is strictly request/reply, a script can be written
/// as the exact sequence of frames the server would emit.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    inbound: VecDeque<String>,
    sent: Vec<String>,
    closed: bool,
}

impl ScriptedTransport {
    pub fn new<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inbound: frames.into_iter().map(Into::into).collect(),
            sent: Vec::new(),
            closed: false,
        }
    }

    pub fn push(&mut self, frame: impl Into<String>) {
        self.inbound.push_back(frame.into());
    }

    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Sent frames parsed as JSON (unparseable frames become `null`).
    pub fn sent_json(&self) -> Vec<Value> {
        self.sent
            .iter()
            .map(|frame| serde_json::from_str(frame).unwrap_or(Value::Null))
            .collect()
    }

    /// Number of scripted frames not yet received.
    pub fn remaining(&self) -> usize {
        self.inbound.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for ScriptedTransport {
    async fn send(&mut self, text: String) -> Result<()> {
        if self.closed {
            return Err(Error::ConnectionClosed);
        }
        self.sent.push(text);
        Ok(())
    }

    async fn receive(&mut self) -> Result<String> {
        if self.closed {
            return Err(Error::ConnectionClosed);
        }
        self.inbound.pop_front().ok_or(Error::ConnectionClosed)
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
