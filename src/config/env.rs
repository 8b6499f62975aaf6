use std::path::PathBuf;
use std::str::FromStr;

use super::{ServerConfig, TlsConfig};
use crate::core::realtime::{
    DEFAULT_REALTIME_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TRANSCRIPTION_MODEL, OPENAI_REALTIME_URL,
    RealtimeAudioFormat, RealtimeVoice, TurnDetectionConfig,
};

/// Every environment variable read by [`load`].
pub(super) const ENV_KEYS: &[&str] = &[
    "HOST",
    "PORT",
    "TLS_CERT_PATH",
    "TLS_KEY_PATH",
    "OPENAI_API_KEY",
    "OPENAI_REALTIME_URL",
    "OPENAI_REALTIME_MODEL",
    "PERSONA_INSTRUCTIONS",
    "PERSONA_INSTRUCTIONS_FILE",
    "REALTIME_VOICE",
    "REALTIME_AUDIO_FORMAT",
    "REALTIME_TRANSCRIPTION_MODEL",
    "VAD_THRESHOLD",
    "VAD_PREFIX_PADDING_MS",
    "VAD_SILENCE_DURATION_MS",
    "REALTIME_TEMPERATURE",
    "OPENING_PROMPT",
    "BARGE_IN_CLEAR",
];

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

/// Non-empty value of an environment variable.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(key)
        .map(|v| v.parse::<T>().map_err(|e| format!("Invalid {key} '{v}': {e}")))
        .transpose()
}

pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(super) fn parse_voice(key: &str, value: &str) -> Result<RealtimeVoice, String> {
    RealtimeVoice::parse(value).ok_or_else(|| {
        format!(
            "Invalid {key} '{value}': expected one of alloy, ash, ballad, coral, echo, sage, shimmer, verse"
        )
    })
}

pub(super) fn parse_audio_format(key: &str, value: &str) -> Result<RealtimeAudioFormat, String> {
    RealtimeAudioFormat::parse(value).ok_or_else(|| {
        format!("Invalid {key} '{value}': expected one of g711_ulaw, g711_alaw, pcm16")
    })
}

/// `none`, `off` and `disabled` turn caller transcription off.
pub(super) fn parse_transcription_model(value: &str) -> Option<String> {
    match value.to_lowercase().as_str() {
        "" | "none" | "off" | "disabled" => None,
        _ => Some(value.to_string()),
    }
}

pub(super) fn tls_from_paths(
    cert_path: Option<String>,
    key_path: Option<String>,
) -> Result<Option<TlsConfig>, String> {
    match (cert_path, key_path) {
        (Some(cert), Some(key)) => Ok(Some(TlsConfig {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        })),
        (None, None) => Ok(None),
        _ => Err("TLS requires both a certificate path and a key path".to_string()),
    }
}

/// Build a configuration from environment variables, falling back to defaults.
///
/// No validation happens here; callers validate after YAML overrides are
/// applied.
pub(super) fn load() -> Result<ServerConfig, String> {
    let vad = TurnDetectionConfig::default();

    let barge_in_clear = match env_var("BARGE_IN_CLEAR") {
        Some(v) => parse_bool(&v).ok_or_else(|| format!("Invalid BARGE_IN_CLEAR '{v}'"))?,
        None => true,
    };

    let transcription_model = match std::env::var("REALTIME_TRANSCRIPTION_MODEL") {
        Ok(v) => parse_transcription_model(v.trim()),
        Err(_) => Some(DEFAULT_TRANSCRIPTION_MODEL.to_string()),
    };

    Ok(ServerConfig {
        host: env_var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: parse_env("PORT")?.unwrap_or(DEFAULT_PORT),
        tls: tls_from_paths(env_var("TLS_CERT_PATH"), env_var("TLS_KEY_PATH"))?,
        openai_api_key: env_var("OPENAI_API_KEY"),
        realtime_url: env_var("OPENAI_REALTIME_URL")
            .unwrap_or_else(|| OPENAI_REALTIME_URL.to_string()),
        realtime_model: env_var("OPENAI_REALTIME_MODEL")
            .unwrap_or_else(|| DEFAULT_REALTIME_MODEL.to_string()),
        instructions: env_var("PERSONA_INSTRUCTIONS").unwrap_or_default(),
        instructions_file: env_var("PERSONA_INSTRUCTIONS_FILE").map(PathBuf::from),
        voice: env_var("REALTIME_VOICE")
            .map(|v| parse_voice("REALTIME_VOICE", &v))
            .transpose()?
            .unwrap_or_default(),
        audio_format: env_var("REALTIME_AUDIO_FORMAT")
            .map(|v| parse_audio_format("REALTIME_AUDIO_FORMAT", &v))
            .transpose()?
            .unwrap_or_default(),
        transcription_model,
        vad_threshold: parse_env("VAD_THRESHOLD")?.unwrap_or(vad.threshold),
        vad_prefix_padding_ms: parse_env("VAD_PREFIX_PADDING_MS")?
            .unwrap_or(vad.prefix_padding_ms),
        vad_silence_duration_ms: parse_env("VAD_SILENCE_DURATION_MS")?
            .unwrap_or(vad.silence_duration_ms),
        temperature: parse_env("REALTIME_TEMPERATURE")?.unwrap_or(DEFAULT_TEMPERATURE),
        opening_prompt: env_var("OPENING_PROMPT"),
        barge_in_clear,
    })
}
