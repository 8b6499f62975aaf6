use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::bridge::CallEventCallback;
use crate::core::realtime::{ModelSessionConfig, RealtimeEndpoint};

/// Immutable state shared by every request.
///
/// Each call builds its own bridge and connections from these values; nothing
/// here is mutated after start-up.
pub struct AppState {
    pub config: ServerConfig,
    pub endpoint: Arc<RealtimeEndpoint>,
    pub session: Arc<ModelSessionConfig>,
    /// Observer attached to every call bridge
    pub call_events: Option<CallEventCallback>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Self::build(config, None)
    }

    /// Same as [`AppState::new`], with an observer for transcripts, model
    /// errors and call summaries.
    pub fn with_call_events(config: ServerConfig, callback: CallEventCallback) -> Arc<Self> {
        Self::build(config, Some(callback))
    }

    fn build(config: ServerConfig, call_events: Option<CallEventCallback>) -> Arc<Self> {
        let endpoint = Arc::new(config.realtime_endpoint());
        let session = Arc::new(config.model_session());
        Arc::new(Self {
            config,
            endpoint,
            session,
            call_events,
        })
    }
}
