//! Frame-level transport seam shared by both call legs.
//!
//! The telephony leg arrives as an axum WebSocket accepted by the server,
//! while the model leg is a tokio-tungstenite client socket. Both protocols
//! are JSON over text frames, so the adapters only need two capabilities:
//! pull the next text frame, and push a text frame / close.
//!
//! Binary, ping and pong frames are skipped by every source. Pings are
//! answered by the underlying WebSocket implementations.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite;

/// Errors raised by a frame transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying WebSocket failed
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The transport was already closed locally
    #[error("Transport closed")]
    Closed,
}

/// Source of inbound text frames.
#[async_trait]
pub trait FrameSource: Send {
    /// Wait for the next text frame.
    ///
    /// Returns `None` once the peer has closed the connection.
    async fn next_text(&mut self) -> Option<Result<String, TransportError>>;
}

/// Sink for outbound text frames.
#[async_trait]
pub trait FrameSink: Send {
    /// Send one text frame without waiting for any acknowledgment.
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the outbound side of the connection.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Boxed source, as held by the adapters.
pub type BoxedFrameSource = Box<dyn FrameSource>;

/// Boxed sink, as held by the adapters.
pub type BoxedFrameSink = Box<dyn FrameSink>;

// =============================================================================
// tokio-tungstenite (model leg)
// =============================================================================

#[async_trait]
impl<S> FrameSource for SplitStream<WebSocketStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn next_text(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.next().await? {
                Ok(tungstenite::Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(tungstenite::Message::Close(frame)) => {
                    tracing::debug!(?frame, "Upstream WebSocket close frame received");
                    return None;
                }
                Ok(_) => continue,
                Err(tungstenite::Error::ConnectionClosed) => return None,
                Err(e) => return Some(Err(TransportError::WebSocket(e.to_string()))),
            }
        }
    }
}

#[async_trait]
impl<S> FrameSink for SplitSink<WebSocketStream<S>, tungstenite::Message>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.send(tungstenite::Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        // The peer may already be gone; closing the sink still releases it.
        let _ = self.send(tungstenite::Message::Close(None)).await;
        SinkExt::close(self)
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }
}

// =============================================================================
// axum (telephony leg)
// =============================================================================

#[async_trait]
impl FrameSource for SplitStream<axum::extract::ws::WebSocket> {
    async fn next_text(&mut self) -> Option<Result<String, TransportError>> {
        use axum::extract::ws::Message;

        loop {
            match self.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "Telephony WebSocket close frame received");
                    return None;
                }
                Ok(_) => continue,
                Err(e) => return Some(Err(TransportError::WebSocket(e.to_string()))),
            }
        }
    }
}

#[async_trait]
impl FrameSink for SplitSink<axum::extract::ws::WebSocket, axum::extract::ws::Message> {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.send(axum::extract::ws::Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let _ = self.send(axum::extract::ws::Message::Close(None)).await;
        SinkExt::close(self)
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }
}

// =============================================================================
// In-process channels
// =============================================================================

/// Frame source fed by an in-process channel.
///
/// Useful for embedding the bridge behind a transport other than WebSocket.
pub struct ChannelSource {
    rx: mpsc::Receiver<String>,
}

impl ChannelSource {
    pub fn new(rx: mpsc::Receiver<String>) -> Self {
        Self { rx }
    }
}

#[async_trait]
impl FrameSource for ChannelSource {
    async fn next_text(&mut self) -> Option<Result<String, TransportError>> {
        self.rx.recv().await.map(Ok)
    }
}

/// Frame sink writing into an in-process channel.
///
/// Closing drops the sender, so the receiving side observes end of stream.
pub struct ChannelSink {
    tx: Option<mpsc::Sender<String>>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx: Some(tx) }
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(text).await.map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx.take();
        Ok(())
    }
}
