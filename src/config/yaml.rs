use serde::Deserialize;
use std::path::PathBuf;

use super::ServerConfig;
use super::env::{parse_audio_format, parse_transcription_model, parse_voice, tls_from_paths};

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// the file override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 5000
///   tls:
///     cert_path: "/etc/callrelay/cert.pem"
///     key_path: "/etc/callrelay/key.pem"
///
/// realtime:
///   api_key: "sk-..."
///   url: "wss://api.openai.com/v1/realtime"
///   model: "gpt-4o-realtime-preview-2024-12-17"
///   voice: "alloy"
///   audio_format: "g711_ulaw"
///   transcription_model: "whisper-1"
///   temperature: 0.8
///   vad:
///     threshold: 0.5
///     prefix_padding_ms: 300
///     silence_duration_ms: 500
///
/// persona:
///   instructions: "You are a friendly receptionist."
///   instructions_file: "/etc/callrelay/persona.txt"
///   opening_prompt: "Greet the caller and ask how you can help."
///
/// call:
///   barge_in_clear: true
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub realtime: Option<RealtimeYaml>,
    pub persona: Option<PersonaYaml>,
    pub call: Option<CallYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Realtime model configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RealtimeYaml {
    pub api_key: Option<String>,
    pub url: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub audio_format: Option<String>,
    /// `none` disables caller transcription
    pub transcription_model: Option<String>,
    pub temperature: Option<f32>,
    pub vad: Option<VadYaml>,
}

/// Server VAD configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VadYaml {
    pub threshold: Option<f32>,
    pub prefix_padding_ms: Option<u32>,
    pub silence_duration_ms: Option<u32>,
}

/// Persona configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PersonaYaml {
    pub instructions: Option<String>,
    pub instructions_file: Option<String>,
    pub opening_prompt: Option<String>,
}

/// Per-call behavior from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CallYaml {
    pub barge_in_clear: Option<bool>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }

    /// Override `config` with every value present in the file.
    pub fn apply(self, config: &mut ServerConfig) -> Result<(), String> {
        if let Some(server) = self.server {
            if let Some(host) = server.host {
                config.host = host;
            }
            if let Some(port) = server.port {
                config.port = port;
            }
            if let Some(tls) = server.tls {
                config.tls = tls_from_paths(tls.cert_path, tls.key_path)?;
            }
        }

        if let Some(realtime) = self.realtime {
            if let Some(api_key) = realtime.api_key {
                config.openai_api_key = Some(api_key);
            }
            if let Some(url) = realtime.url {
                config.realtime_url = url;
            }
            if let Some(model) = realtime.model {
                config.realtime_model = model;
            }
            if let Some(voice) = realtime.voice {
                config.voice = parse_voice("realtime.voice", &voice)?;
            }
            if let Some(format) = realtime.audio_format {
                config.audio_format = parse_audio_format("realtime.audio_format", &format)?;
            }
            if let Some(model) = realtime.transcription_model {
                config.transcription_model = parse_transcription_model(model.trim());
            }
            if let Some(temperature) = realtime.temperature {
                config.temperature = temperature;
            }
            if let Some(vad) = realtime.vad {
                if let Some(threshold) = vad.threshold {
                    config.vad_threshold = threshold;
                }
                if let Some(padding) = vad.prefix_padding_ms {
                    config.vad_prefix_padding_ms = padding;
                }
                if let Some(silence) = vad.silence_duration_ms {
                    config.vad_silence_duration_ms = silence;
                }
            }
        }

        if let Some(persona) = self.persona {
            if let Some(instructions) = persona.instructions {
                config.instructions = instructions;
            }
            if let Some(path) = persona.instructions_file {
                config.instructions_file = Some(PathBuf::from(path));
            }
            if let Some(prompt) = persona.opening_prompt {
                config.opening_prompt = Some(prompt).filter(|p| !p.trim().is_empty());
            }
        }

        if let Some(call) = self.call {
            if let Some(barge_in_clear) = call.barge_in_clear {
                config.barge_in_clear = barge_in_clear;
            }
        }

        Ok(())
    }
}
