//! Realtime speech model leg.
//!
//! This module owns everything that speaks the model's WebSocket protocol:
//! - Session configuration sent once per call
//! - Wire message types
//! - Classification of upstream events
//! - The per-call adapter and its sender/receiver halves
//!
//! # Audio Format
//!
//! The model is configured for G.711 μ-law in both directions, matching the
//! telephony media stream, so audio payloads pass through untouched.
//!
//! # Example
//!
//! ```rust,ignore
//! use callrelay_gateway::core::realtime::{
//!     ModelSessionConfig, RealtimeEndpoint, RealtimeModelAdapter,
//! };
//!
//! let endpoint = RealtimeEndpoint::new("sk-...");
//! let mut adapter = RealtimeModelAdapter::connect(&endpoint).await?;
//! adapter.configure_session(&ModelSessionConfig::default()).await?;
//!
//! while let Some(event) = adapter.next_event().await {
//!     println!("{:?}", event?);
//! }
//! ```

mod client;
mod config;
mod error;
mod events;
pub mod messages;

pub use client::{ModelReceiver, ModelSender, RealtimeEndpoint, RealtimeModelAdapter};
pub use config::{
    DEFAULT_REALTIME_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TRANSCRIPTION_MODEL, ModelSessionConfig,
    OPENAI_REALTIME_URL, RealtimeAudioFormat, RealtimeVoice, TurnDetectionConfig,
};
pub use error::{RealtimeError, RealtimeResult};
pub use events::{ModelEvent, classify};
