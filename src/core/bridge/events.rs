use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::state::TerminationReason;

/// Who spoke a transcribed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptRole {
    User,
    Assistant,
}

impl fmt::Display for TranscriptRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptRole::User => f.write_str("user"),
            TranscriptRole::Assistant => f.write_str("assistant"),
        }
    }
}

/// Final accounting for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSummary {
    /// Identifier supplied when the call was accepted
    pub call_id: String,
    /// Identifier generated for this bridge instance
    pub session_id: String,
    /// Telephony stream identifier, if a `start` was seen
    pub stream_id: Option<String>,
    pub reason: TerminationReason,
    /// Caller frames forwarded to the model
    pub inbound_frames: u64,
    /// Model frames forwarded to the caller
    pub outbound_frames: u64,
    /// Model frames dropped because no stream identifier was known
    pub dropped_frames: u64,
    pub inbound_audio_bytes: u64,
    pub outbound_audio_bytes: u64,
}

/// Observations surfaced by a running bridge. Nothing here is sent over
/// either socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    Transcript { role: TranscriptRole, text: String },
    ModelError { detail: String },
    Closed(CallSummary),
}

/// Callback type for call events.
pub type CallEventCallback =
    Arc<dyn Fn(CallEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;
