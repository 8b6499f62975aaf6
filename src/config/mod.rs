//! Configuration module for the CallRelay gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use callrelay_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use crate::core::realtime::{
    ModelSessionConfig, RealtimeAudioFormat, RealtimeEndpoint, RealtimeVoice, TurnDetectionConfig,
};

mod env;
mod validation;
mod yaml;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains all configuration needed to run the gateway:
/// - Server settings (host, port, TLS)
/// - Realtime model endpoint and credentials
/// - Per-call model session parameters (persona, voice, VAD, temperature)
/// - Call behavior (opening prompt, barge-in)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Realtime model
    pub openai_api_key: Option<String>,
    pub realtime_url: String,
    pub realtime_model: String,

    // Session parameters
    /// Persona instructions; when empty, `instructions_file` is read instead
    pub instructions: String,
    pub instructions_file: Option<PathBuf>,
    pub voice: RealtimeVoice,
    /// Shared by both directions, matching the telephony leg
    pub audio_format: RealtimeAudioFormat,
    /// `None` disables caller transcription
    pub transcription_model: Option<String>,
    pub vad_threshold: f32,
    pub vad_prefix_padding_ms: u32,
    pub vad_silence_duration_ms: u32,
    pub temperature: f32,

    // Call behavior
    /// Prompt for a synthetic opening turn so the model greets the caller
    pub opening_prompt: Option<String>,
    /// Send `clear` to the telephony leg when the caller starts talking
    pub barge_in_clear: bool,
}

/// Implement Drop to zeroize secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables only
    ///
    /// The .env file is loaded in main.rs before this is called, so its values
    /// are visible here as environment variables.
    ///
    /// # Errors
    /// Returns an error if a variable has an invalid format or validation fails.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = env::load()?;
        config.resolve_instructions()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let mut config = env::load()?;
        yaml_config.apply(&mut config)?;
        config.resolve_instructions()?;
        validation::validate(&config)?;

        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Upstream endpoint shared by every call.
    pub fn realtime_endpoint(&self) -> RealtimeEndpoint {
        RealtimeEndpoint::new(self.openai_api_key.clone().unwrap_or_default())
            .with_url(self.realtime_url.clone())
            .with_model(self.realtime_model.clone())
    }

    /// Session parameters sent to the model at the start of every call.
    pub fn model_session(&self) -> ModelSessionConfig {
        ModelSessionConfig {
            instructions: self.instructions.clone(),
            voice: self.voice,
            input_audio_format: self.audio_format,
            output_audio_format: self.audio_format,
            transcription_model: self.transcription_model.clone(),
            turn_detection: TurnDetectionConfig {
                threshold: self.vad_threshold,
                prefix_padding_ms: self.vad_prefix_padding_ms,
                silence_duration_ms: self.vad_silence_duration_ms,
            },
            temperature: self.temperature,
        }
    }

    fn resolve_instructions(&mut self) -> Result<(), String> {
        if !self.instructions.trim().is_empty() {
            return Ok(());
        }
        if let Some(path) = &self.instructions_file {
            self.instructions = std::fs::read_to_string(path).map_err(|e| {
                format!("Failed to read instructions file {}: {e}", path.display())
            })?;
        }
        Ok(())
    }
}
