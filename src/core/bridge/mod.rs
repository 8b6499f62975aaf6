//! Per-call relay between the telephony leg and the realtime model.
//!
//! A [`CallBridge`] owns both connections for exactly one call. The only
//! state its two pumps share is the write-once stream identifier and the
//! cancellation token.

mod coordinator;
mod events;
mod state;

pub use coordinator::{BridgeHandle, CallBridge};
pub use events::{CallEvent, CallEventCallback, CallSummary, TranscriptRole};
pub use state::{BridgeState, CallError, Peer, StreamIdCell, TerminationReason};
