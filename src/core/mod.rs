pub mod audio;
pub mod bridge;
pub mod realtime;
pub mod telephony;
pub mod transport;

// Re-export commonly used types for convenience
pub use audio::{AudioFrame, Direction};

pub use bridge::{
    BridgeHandle, BridgeState, CallBridge, CallError, CallEvent, CallEventCallback, CallSummary,
    Peer, TerminationReason, TranscriptRole,
};

pub use realtime::{
    ModelEvent, ModelSessionConfig, RealtimeAudioFormat, RealtimeEndpoint, RealtimeError,
    RealtimeModelAdapter, RealtimeResult, RealtimeVoice, TurnDetectionConfig,
};

pub use telephony::{TelephonyError, TelephonyMessage, TelephonySocketAdapter};

pub use transport::{ChannelSink, ChannelSource, FrameSink, FrameSource, TransportError};
