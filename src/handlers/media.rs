//! Telephony media-stream WebSocket handler
//!
//! The telephony provider connects here once per call, after the call-control
//! layer has told it to open a media stream. The accepted socket is handed to
//! a fresh [`CallBridge`] for the lifetime of the call.

use axum::{
    extract::{
        Path, State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::bridge::CallBridge;
use crate::core::telephony::TelephonySocketAdapter;
use crate::state::AppState;

/// Maximum WebSocket frame size (1 MB). Media frames are a few hundred bytes.
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// Media stream WebSocket handler
///
/// # Arguments
/// * `ws` - The WebSocket upgrade request from Axum
/// * `call_id` - Call identifier from the path, supplied by the call-control layer
/// * `state` - Application state containing configuration
pub async fn media_handler(
    ws: WebSocketUpgrade,
    Path(call_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!(call_id = %call_id, "Media stream WebSocket upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_media_socket(socket, call_id, state))
}

async fn handle_media_socket(socket: WebSocket, call_id: String, state: Arc<AppState>) {
    info!(call_id = %call_id, "Media stream WebSocket connection established");

    let telephony = TelephonySocketAdapter::from_axum(socket);
    let mut bridge = CallBridge::new(
        call_id,
        telephony,
        state.endpoint.clone(),
        state.session.clone(),
    )
    .with_barge_in_clear(state.config.barge_in_clear);

    if let Some(prompt) = &state.config.opening_prompt {
        bridge = bridge.with_opening_turn(prompt.clone());
    }
    if let Some(callback) = &state.call_events {
        bridge = bridge.on_event(callback.clone());
    }

    let summary = bridge.run().await;
    debug!(
        call_id = %summary.call_id,
        session_id = %summary.session_id,
        reason = %summary.reason,
        inbound_audio_bytes = summary.inbound_audio_bytes,
        outbound_audio_bytes = summary.outbound_audio_bytes,
        "Media stream handler finished"
    );
}
