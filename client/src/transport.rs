use crate::{Error, Result};
use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, trace};
use url::Url;

/// A duplex text channel to the game server.
///
/// Callers never have more than one request outstanding, so a plain
/// send-then-receive sequence is enough to correlate replies.
pub trait Transport {
    fn send(&mut self, text: String) -> impl Future<Output = Result<()>>;

    /// Wait for the next text frame.
    fn receive(&mut self) -> impl Future<Output = Result<String>>;

    fn close(&mut self) -> impl Future<Output = Result<()>>;
}

/// WebSocket connection to the game server.
pub struct WebSocket {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    timeout: Option<Duration>,
}

impl WebSocket {
    /// Connect to `url`.
    ///
    /// With `timeout` set, a receive that waits longer fails with
    /// [Error::Timeout]; otherwise receives block until the server speaks.
    pub async fn connect(url: &Url, timeout: Option<Duration>) -> Result<Self> {
        let (stream, response) = connect_async(url.as_str()).await?;
        debug!(%url, status = %response.status(), "connected");
        Ok(Self { stream, timeout })
    }

    async fn next_frame(&mut self) -> Result<String> {
        while let Some(msg) = self.stream.next().await {
            match msg? {
                Message::Text(text) => {
                    trace!(len = text.len(), "received text frame");
                    return Ok(text);
                }
                Message::Binary(data) => {
                    trace!(len = data.len(), "received binary frame");
                    return Ok(String::from_utf8(data)?);
                }
                Message::Close(frame) => {
                    debug!(?frame, "WebSocket closed");
                    return Err(Error::ConnectionClosed);
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Err(Error::ConnectionClosed)
    }
}

impl Transport for WebSocket {
    async fn send(&mut self, text: String) -> Result<()> {
        trace!(len = text.len(), "sending text frame");
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<String> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.next_frame())
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => self.next_frame().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.stream.close(None).await {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
