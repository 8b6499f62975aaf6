//! Realtime model session configuration.
//!
//! This module contains the per-call parameters sent to the model right after
//! the upstream socket opens:
//! - Voice selection
//! - Audio format (shared with the telephony leg)
//! - Turn detection settings
//! - Persona instructions and sampling temperature
//!
//! Values here are plain data. A session is configured exactly once per call
//! and never changed afterwards.

use serde::{Deserialize, Serialize};

use super::messages::{InputAudioTranscription, SessionConfig, TurnDetection};

/// OpenAI Realtime API WebSocket endpoint.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Model used when none is configured.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview-2024-12-17";

/// Transcription model used for caller speech.
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

// =============================================================================
// Voices
// =============================================================================

/// Available voices for the realtime model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RealtimeVoice {
    /// Alloy voice (default)
    #[default]
    Alloy,
    Ash,
    Ballad,
    Coral,
    Echo,
    Sage,
    Shimmer,
    Verse,
}

impl RealtimeVoice {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Ash => "ash",
            Self::Ballad => "ballad",
            Self::Coral => "coral",
            Self::Echo => "echo",
            Self::Sage => "sage",
            Self::Shimmer => "shimmer",
            Self::Verse => "verse",
        }
    }

    /// Parse a voice name, case-insensitively. `None` for unsupported voices.
    pub fn parse(s: &str) -> Option<Self> {
        let voice = match s.trim().to_lowercase().as_str() {
            "alloy" => Self::Alloy,
            "ash" => Self::Ash,
            "ballad" => Self::Ballad,
            "coral" => Self::Coral,
            "echo" => Self::Echo,
            "sage" => Self::Sage,
            "shimmer" => Self::Shimmer,
            "verse" => Self::Verse,
            _ => return None,
        };
        Some(voice)
    }
}

impl std::fmt::Display for RealtimeVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Audio Formats
// =============================================================================

/// Audio encodings understood by the realtime model.
///
/// Telephony media streams carry G.711 μ-law at 8kHz, which the model accepts
/// natively, so that is the default and no transcoding is ever needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RealtimeAudioFormat {
    /// G.711 u-law (8-bit, 8kHz)
    #[default]
    #[serde(rename = "g711_ulaw")]
    G711Ulaw,
    /// G.711 a-law (8-bit, 8kHz)
    #[serde(rename = "g711_alaw")]
    G711Alaw,
    /// PCM 16-bit signed little-endian (24kHz)
    #[serde(rename = "pcm16")]
    Pcm16,
}

impl RealtimeAudioFormat {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::G711Ulaw => "g711_ulaw",
            Self::G711Alaw => "g711_alaw",
            Self::Pcm16 => "pcm16",
        }
    }

    /// Get the sample rate for this format.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        match self {
            Self::G711Ulaw | Self::G711Alaw => 8000,
            Self::Pcm16 => 24000,
        }
    }

    /// Parse a format name or common alias. `None` for unknown encodings.
    pub fn parse(s: &str) -> Option<Self> {
        let format = match s.trim().to_lowercase().as_str() {
            "g711_ulaw" | "ulaw" | "mulaw" | "audio/x-mulaw" => Self::G711Ulaw,
            "g711_alaw" | "alaw" => Self::G711Alaw,
            "pcm16" | "pcm" | "linear16" => Self::Pcm16,
            _ => return None,
        };
        Some(format)
    }
}

impl std::fmt::Display for RealtimeAudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Turn Detection
// =============================================================================

/// Voice-activity-based turn detection settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnDetectionConfig {
    /// Activation threshold (0.0 to 1.0)
    pub threshold: f32,
    /// Audio retained before detected speech (ms)
    pub prefix_padding_ms: u32,
    /// Silence that ends a caller turn (ms)
    pub silence_duration_ms: u32,
}

impl Default for TurnDetectionConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            prefix_padding_ms: 300,
            silence_duration_ms: 500,
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// Parameters used to initialize one model session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSessionConfig {
    /// Persona instructions
    pub instructions: String,
    /// Voice for synthesized speech
    pub voice: RealtimeVoice,
    /// Encoding of audio sent to the model
    pub input_audio_format: RealtimeAudioFormat,
    /// Encoding of audio produced by the model
    pub output_audio_format: RealtimeAudioFormat,
    /// Transcription model for caller speech, `None` disables transcripts
    pub transcription_model: Option<String>,
    /// Server-side turn detection
    pub turn_detection: TurnDetectionConfig,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for ModelSessionConfig {
    fn default() -> Self {
        Self {
            instructions: String::new(),
            voice: RealtimeVoice::default(),
            input_audio_format: RealtimeAudioFormat::default(),
            output_audio_format: RealtimeAudioFormat::default(),
            transcription_model: Some(DEFAULT_TRANSCRIPTION_MODEL.to_string()),
            turn_detection: TurnDetectionConfig::default(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl ModelSessionConfig {
    /// Build the wire-level `session.update` payload.
    pub fn to_wire(&self) -> SessionConfig {
        SessionConfig {
            modalities: Some(vec!["text".to_string(), "audio".to_string()]),
            instructions: (!self.instructions.is_empty()).then(|| self.instructions.clone()),
            voice: Some(self.voice.as_str().to_string()),
            input_audio_format: Some(self.input_audio_format.as_str().to_string()),
            output_audio_format: Some(self.output_audio_format.as_str().to_string()),
            input_audio_transcription: self
                .transcription_model
                .as_ref()
                .map(|model| InputAudioTranscription {
                    model: model.clone(),
                }),
            turn_detection: Some(TurnDetection::ServerVad {
                threshold: Some(self.turn_detection.threshold),
                prefix_padding_ms: Some(self.turn_detection.prefix_padding_ms),
                silence_duration_ms: Some(self.turn_detection.silence_duration_ms),
            }),
            temperature: Some(self.temperature),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_from_str() {
        assert_eq!(RealtimeVoice::parse("alloy"), Some(RealtimeVoice::Alloy));
        assert_eq!(RealtimeVoice::parse("SHIMMER"), Some(RealtimeVoice::Shimmer));
        assert_eq!(RealtimeVoice::parse("nova"), None);
    }

    #[test]
    fn test_audio_format_from_str() {
        assert_eq!(
            RealtimeAudioFormat::parse("audio/x-mulaw"),
            Some(RealtimeAudioFormat::G711Ulaw)
        );
        assert_eq!(
            RealtimeAudioFormat::parse("linear16"),
            Some(RealtimeAudioFormat::Pcm16)
        );
        assert_eq!(RealtimeAudioFormat::parse("opus"), None);
    }

    #[test]
    fn test_audio_format_sample_rate() {
        assert_eq!(RealtimeAudioFormat::G711Ulaw.sample_rate(), 8000);
        assert_eq!(RealtimeAudioFormat::G711Alaw.sample_rate(), 8000);
        assert_eq!(RealtimeAudioFormat::Pcm16.sample_rate(), 24000);
    }

    #[test]
    fn test_default_session_matches_telephony_leg() {
        let session = ModelSessionConfig::default();
        assert_eq!(session.input_audio_format, RealtimeAudioFormat::G711Ulaw);
        assert_eq!(session.output_audio_format, RealtimeAudioFormat::G711Ulaw);
        assert_eq!(session.temperature, 0.8);
        assert_eq!(session.turn_detection.threshold, 0.5);
        assert_eq!(session.turn_detection.prefix_padding_ms, 300);
        assert_eq!(session.turn_detection.silence_duration_ms, 500);
    }

    #[test]
    fn test_to_wire_serializes_full_session() {
        let session = ModelSessionConfig {
            instructions: "Be brief.".to_string(),
            voice: RealtimeVoice::Coral,
            ..Default::default()
        };

        let json = serde_json::to_value(session.to_wire()).unwrap();
        assert_eq!(json["modalities"], serde_json::json!(["text", "audio"]));
        assert_eq!(json["instructions"], "Be brief.");
        assert_eq!(json["voice"], "coral");
        assert_eq!(json["input_audio_format"], "g711_ulaw");
        assert_eq!(json["output_audio_format"], "g711_ulaw");
        assert_eq!(json["input_audio_transcription"]["model"], "whisper-1");
        assert_eq!(json["turn_detection"]["type"], "server_vad");
        assert_eq!(json["turn_detection"]["prefix_padding_ms"], 300);
        assert_eq!(json["turn_detection"]["silence_duration_ms"], 500);
        assert!((json["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_to_wire_omits_disabled_fields() {
        let session = ModelSessionConfig {
            transcription_model: None,
            ..Default::default()
        };

        let json = serde_json::to_value(session.to_wire()).unwrap();
        assert!(json.get("instructions").is_none());
        assert!(json.get("input_audio_transcription").is_none());
    }
}
