use std::fmt;
use std::sync::OnceLock;

use thiserror::Error;

/// Lifecycle of one call bridge.
///
/// `Connecting → Configuring → Streaming → Closing → Closed`. A failure while
/// connecting or configuring goes straight to `Closing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Connecting,
    Configuring,
    Streaming,
    Closing,
    Closed,
}

impl BridgeState {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeState::Connecting => "connecting",
            BridgeState::Configuring => "configuring",
            BridgeState::Streaming => "streaming",
            BridgeState::Closing => "closing",
            BridgeState::Closed => "closed",
        }
    }
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peer {
    Telephony,
    Model,
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Peer::Telephony => f.write_str("telephony"),
            Peer::Model => f.write_str("model"),
        }
    }
}

/// Fatal conditions for a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Handshake or authentication with the model failed
    #[error("Upstream connect failed: {0}")]
    UpstreamConnect(String),

    /// The session setup could not be sent
    #[error("Upstream session configuration failed: {0}")]
    UpstreamConfig(String),

    /// The model reported an `error` event
    #[error("Upstream protocol error: {0}")]
    UpstreamProtocol(String),

    /// A socket failed mid-call
    #[error("{peer} transport error: {detail}")]
    Transport { peer: Peer, detail: String },
}

/// Why a bridge stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// The telephony leg sent `stop`
    TelephonyStopped,
    /// A socket closed normally
    PeerClosed(Peer),
    /// Stopped from outside through a [`BridgeHandle`](super::BridgeHandle)
    Shutdown,
    /// A fatal error ended the call
    Failed(CallError),
}

impl TerminationReason {
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, TerminationReason::Failed(_))
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::TelephonyStopped => f.write_str("telephony stopped"),
            TerminationReason::PeerClosed(peer) => write!(f, "{peer} closed"),
            TerminationReason::Shutdown => f.write_str("shutdown"),
            TerminationReason::Failed(err) => write!(f, "failed: {err}"),
        }
    }
}

/// Write-once holder for the telephony stream identifier.
///
/// Set by the inbound pump, read by the outbound pump. Once set it never
/// changes.
#[derive(Debug, Default)]
pub struct StreamIdCell {
    inner: OnceLock<String>,
}

impl StreamIdCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the identifier.
    ///
    /// If one is already recorded the new value is rejected and returned.
    pub fn set(&self, stream_id: String) -> Result<(), String> {
        self.inner.set(stream_id)
    }

    #[inline]
    pub fn get(&self) -> Option<&str> {
        self.inner.get().map(String::as_str)
    }
}
