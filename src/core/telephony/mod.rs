//! Telephony media-stream leg.
//!
//! The provider opens a WebSocket per call and streams JSON messages tagged
//! by `event`. Audio payloads are base64 G.711 μ-law at 8kHz and are relayed
//! without decoding.

mod adapter;
pub mod messages;

pub use adapter::{TelephonyError, TelephonyReceiver, TelephonySender, TelephonySocketAdapter};
pub use messages::{MediaFormat, TelephonyMessage};
