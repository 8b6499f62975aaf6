//! Telephony media-stream message types.
//!
//! Inbound (provider → gateway), tagged by `event`:
//! - connected - Socket established, no stream yet
//! - start - Stream metadata, including the stream identifier
//! - media - One chunk of caller audio
//! - stop - Stream ended
//!
//! `mark`, `dtmf` and anything unrecognized are reported as
//! [`TelephonyMessage::Other`].
//!
//! Outbound (gateway → provider):
//! - media - Audio to play to the caller
//! - clear - Drop audio the provider has buffered but not yet played

use serde::{Deserialize, Serialize};

use crate::core::audio::AudioFrame;

// =============================================================================
// Inbound
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum InboundEvent {
    Connected,
    Start {
        #[serde(rename = "streamSid", default)]
        stream_sid: Option<String>,
        #[serde(default)]
        start: StartPayload,
    },
    Media {
        media: MediaPayload,
    },
    Stop,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartPayload {
    #[serde(default)]
    stream_sid: Option<String>,
    #[serde(default)]
    call_sid: Option<String>,
    #[serde(default)]
    media_format: Option<MediaFormat>,
}

/// Encoding metadata announced by `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFormat {
    #[serde(default)]
    pub encoding: String,
    #[serde(default)]
    pub sample_rate: u32,
    #[serde(default)]
    pub channels: u16,
}

#[derive(Debug, Deserialize)]
struct MediaPayload {
    payload: String,
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(default)]
    event: String,
}

/// A decoded inbound telephony message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelephonyMessage {
    /// The media stream started
    Start {
        stream_id: String,
        call_sid: Option<String>,
        media_format: Option<MediaFormat>,
    },
    /// Caller audio
    Media(AudioFrame),
    /// The media stream ended
    Stop,
    /// Any message the bridge ignores, identified by its `event`
    Other(String),
}

impl TelephonyMessage {
    /// Decode one inbound text frame.
    ///
    /// A `start` without any stream identifier cannot address outbound audio,
    /// so it is reported as `Other("start")`.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let message = match serde_json::from_str::<InboundEvent>(text)? {
            InboundEvent::Start { stream_sid, start } => {
                match start.stream_sid.or(stream_sid).filter(|s| !s.is_empty()) {
                    Some(stream_id) => TelephonyMessage::Start {
                        stream_id,
                        call_sid: start.call_sid,
                        media_format: start.media_format,
                    },
                    None => {
                        tracing::warn!("Ignoring start message without a stream identifier");
                        TelephonyMessage::Other("start".to_string())
                    }
                }
            }
            InboundEvent::Media { media } => {
                TelephonyMessage::Media(AudioFrame::inbound(media.payload))
            }
            InboundEvent::Stop => TelephonyMessage::Stop,
            InboundEvent::Connected => TelephonyMessage::Other("connected".to_string()),
            InboundEvent::Unknown => {
                let envelope: EventEnvelope = serde_json::from_str(text)?;
                TelephonyMessage::Other(envelope.event)
            }
        };
        Ok(message)
    }
}

// =============================================================================
// Outbound
// =============================================================================

/// Messages sent to the telephony leg.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum OutboundMessage<'a> {
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: &'a str,
        media: OutboundMedia<'a>,
    },
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: &'a str,
    },
}

#[derive(Debug, Serialize)]
pub struct OutboundMedia<'a> {
    pub payload: &'a str,
}

impl<'a> OutboundMessage<'a> {
    pub fn media(stream_sid: &'a str, frame: &'a AudioFrame) -> Self {
        OutboundMessage::Media {
            stream_sid,
            media: OutboundMedia {
                payload: frame.payload(),
            },
        }
    }

    pub fn clear(stream_sid: &'a str) -> Self {
        OutboundMessage::Clear { stream_sid }
    }
}
