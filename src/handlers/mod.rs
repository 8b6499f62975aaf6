//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `media` - Telephony media-stream WebSocket, one call bridge per connection

pub mod api;
pub mod media;

pub use media::media_handler;
