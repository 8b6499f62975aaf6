//! Media stream WebSocket route configuration
//!
//! This module configures the WebSocket endpoint the telephony provider opens
//! for each call's bidirectional audio.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::media::media_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the media stream router
///
/// # Endpoint
///
/// `GET /media/{call_id}` - WebSocket upgrade for one call's media stream
///
/// # Protocol
///
/// The provider sends JSON text frames tagged by `event`:
/// - `connected` once the socket is up
/// - `start` with the stream identifier
/// - `media` with base64 μ-law caller audio
/// - `stop` when the stream ends
///
/// The gateway sends back:
/// - `media` frames with the model's audio, addressed by `streamSid`
/// - `clear` when the caller interrupts the model
///
/// # Example
///
/// ```json
/// // Provider sends
/// {"event": "start", "start": {"streamSid": "MZ...", "callSid": "CA..."}}
/// {"event": "media", "media": {"payload": "fn5+fn5+..."}}
///
/// // Gateway responds
/// {"event": "media", "streamSid": "MZ...", "media": {"payload": "//7+/v7+..."}}
/// ```
pub fn create_media_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/media/{call_id}", get(media_handler))
        .layer(TraceLayer::new_for_http())
}
