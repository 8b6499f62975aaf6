//! Audio frames relayed between the telephony leg and the realtime model.
//!
//! Payloads are opaque: both ends already speak the same encoding
//! (G.711 μ-law, base64 on the wire), so frames are copied across
//! without being decoded or resampled.

use std::fmt;

/// Which way a frame is travelling relative to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Captured from the caller, headed for the model
    Inbound,
    /// Synthesized by the model, headed for the caller
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => write!(f, "inbound"),
            Direction::Outbound => write!(f, "outbound"),
        }
    }
}

/// One already-encoded chunk of audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    payload: String,
    direction: Direction,
}

impl AudioFrame {
    /// Frame received from the caller.
    pub fn inbound(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            direction: Direction::Inbound,
        }
    }

    /// Frame produced by the model.
    pub fn outbound(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            direction: Direction::Outbound,
        }
    }

    /// Wire-encoded payload, exactly as received.
    #[inline]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Upper bound on the number of audio bytes carried by the payload.
    ///
    /// Computed from the base64 length; the payload itself is never decoded.
    #[inline]
    pub fn estimated_audio_bytes(&self) -> usize {
        base64::decoded_len_estimate(self.payload.len())
    }
}
