use axum::extract::ws::WebSocket;
use futures_util::StreamExt;
use thiserror::Error;

use super::messages::{OutboundMessage, TelephonyMessage};
use crate::core::audio::AudioFrame;
use crate::core::transport::{BoxedFrameSink, BoxedFrameSource, TransportError};

/// Errors raised by the telephony leg.
#[derive(Debug, Error)]
pub enum TelephonyError {
    /// Outbound audio was offered before the stream identifier was known.
    /// Recoverable: the frame is dropped and the call continues.
    #[error("Stream identifier not known yet")]
    NoStreamId,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TelephonyError {
    fn from(err: serde_json::Error) -> Self {
        TelephonyError::Serialization(err.to_string())
    }
}

/// The telephony media connection for one call.
pub struct TelephonySocketAdapter {
    sender: TelephonySender,
    receiver: TelephonyReceiver,
}

impl TelephonySocketAdapter {
    /// Wrap a WebSocket accepted by the HTTP server.
    pub fn from_axum(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self::from_transport(Box::new(sink), Box::new(stream))
    }

    pub fn from_transport(sink: BoxedFrameSink, source: BoxedFrameSource) -> Self {
        Self {
            sender: TelephonySender { sink, closed: false },
            receiver: TelephonyReceiver { source },
        }
    }

    pub async fn next_message(&mut self) -> Option<Result<TelephonyMessage, TelephonyError>> {
        self.receiver.next_message().await
    }

    pub async fn send_audio(
        &mut self,
        stream_id: Option<&str>,
        frame: &AudioFrame,
    ) -> Result<(), TelephonyError> {
        self.sender.send_audio(stream_id, frame).await
    }

    pub async fn close(&mut self) -> Result<(), TelephonyError> {
        self.sender.close().await
    }

    pub fn split(self) -> (TelephonySender, TelephonyReceiver) {
        (self.sender, self.receiver)
    }
}

/// Inbound half: control and media messages from the provider.
pub struct TelephonyReceiver {
    source: BoxedFrameSource,
}

impl TelephonyReceiver {
    /// Wait for the next message; `None` once the provider hangs up the socket.
    ///
    /// Frames that are not valid media-stream JSON are logged and skipped.
    pub async fn next_message(&mut self) -> Option<Result<TelephonyMessage, TelephonyError>> {
        loop {
            let text = match self.source.next_text().await? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };

            match TelephonyMessage::parse(&text) {
                Ok(message) => return Some(Ok(message)),
                Err(e) => {
                    tracing::warn!(error = %e, len = text.len(), "Skipping malformed telephony frame");
                }
            }
        }
    }
}

/// Outbound half: audio and control messages to the provider.
pub struct TelephonySender {
    sink: BoxedFrameSink,
    closed: bool,
}

impl TelephonySender {
    /// Send model audio to the caller, addressed by `stream_id`.
    ///
    /// Without a stream identifier nothing is sent and
    /// [`TelephonyError::NoStreamId`] is returned.
    pub async fn send_audio(
        &mut self,
        stream_id: Option<&str>,
        frame: &AudioFrame,
    ) -> Result<(), TelephonyError> {
        let Some(stream_id) = stream_id.filter(|id| !id.is_empty()) else {
            tracing::warn!(
                len = frame.payload().len(),
                "Dropping outbound audio: stream identifier not known yet"
            );
            return Err(TelephonyError::NoStreamId);
        };
        self.send(&OutboundMessage::media(stream_id, frame)).await
    }

    /// Ask the provider to discard audio queued for playback.
    pub async fn send_clear(&mut self, stream_id: Option<&str>) -> Result<(), TelephonyError> {
        let Some(stream_id) = stream_id.filter(|id| !id.is_empty()) else {
            return Err(TelephonyError::NoStreamId);
        };
        self.send(&OutboundMessage::clear(stream_id)).await
    }

    async fn send(&mut self, message: &OutboundMessage<'_>) -> Result<(), TelephonyError> {
        if self.closed {
            return Err(TransportError::Closed.into());
        }
        let text = serde_json::to_string(message)?;
        self.sink.send_text(text).await?;
        Ok(())
    }

    /// Close the socket. Repeated calls are no-ops.
    pub async fn close(&mut self) -> Result<(), TelephonyError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.sink.close().await?;
        Ok(())
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
