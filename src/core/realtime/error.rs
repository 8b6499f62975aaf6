use thiserror::Error;

use crate::core::transport::TransportError;

/// Errors that can occur while talking to the realtime model.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// WebSocket handshake with the model failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Credentials missing or rejected during the handshake
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid endpoint or session configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Sending the session setup failed
    #[error("Session error: {0}")]
    SessionError(String),

    /// WebSocket error on an established connection
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The connection was already closed locally
    #[error("Not connected")]
    NotConnected,
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

impl From<TransportError> for RealtimeError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Closed => RealtimeError::NotConnected,
            TransportError::WebSocket(msg) => RealtimeError::WebSocketError(msg),
        }
    }
}

impl From<serde_json::Error> for RealtimeError {
    fn from(err: serde_json::Error) -> Self {
        RealtimeError::SerializationError(err.to_string())
    }
}
