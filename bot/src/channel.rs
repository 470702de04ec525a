use crate::Result;
use doninai_client::Transport;
use doninai_types::api::{Call, Id, Message, Reply};
use serde::Serialize;
use tracing::trace;

/// JSON-RPC framing on top of a [Transport].
///
/// Request ids are assigned sequentially for protocol compliance only;
/// replies are matched by order since at most one request is in flight.
pub struct Channel<T> {
    transport: T,
    next_id: u64,
}

impl<T: Transport> Channel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: 0,
        }
    }

    /// Block until the next frame arrives and decode it.
    pub async fn receive(&mut self) -> Result<Message> {
        let text = self.transport.receive().await?;
        trace!(%text, "Received");
        Ok(Message::decode(&text)?)
    }

    /// Send a request, returning the id it was sent with.
    pub async fn request(&mut self, call: &Call) -> Result<u64> {
        let id = self.next_id;
        self.next_id += 1;
        let text = call.encode(id)?;
        trace!(%text, "Sending");
        self.transport.send(text).await?;
        Ok(id)
    }

    /// Answer a server-initiated request.
    pub async fn reply<R: Serialize>(&mut self, id: &Id, result: R) -> Result<()> {
        let text = Reply::new(id, result).encode()?;
        trace!(%text, "Replying");
        self.transport.send(text).await?;
        Ok(())
    }

    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await?;
        Ok(())
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
