//! Shared fixtures for bridge integration tests.
//!
//! `MockModel` is a local WebSocket server standing in for the realtime model;
//! `TelephonyHarness` drives the telephony leg over in-process channels.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::{
    self,
    handshake::server::{ErrorResponse, Request, Response},
};

use callrelay_gateway::{
    CallBridge, CallEvent, ChannelSink, ChannelSource, ModelSessionConfig, RealtimeEndpoint,
    TelephonySocketAdapter,
    core::bridge::CallEventCallback,
};

pub const TIMEOUT: Duration = Duration::from_secs(5);
pub const TEST_API_KEY: &str = "sk-test-key";

// =============================================================================
// Mock realtime model
// =============================================================================

/// Request details captured during the upgrade handshake.
#[derive(Debug, Clone)]
pub struct Handshake {
    pub uri: String,
    pub authorization: Option<String>,
    pub openai_beta: Option<String>,
}

enum ModelAction {
    Send(String),
    Close,
}

/// A single-connection realtime model stand-in.
pub struct MockModel {
    pub url: String,
    received: mpsc::UnboundedReceiver<String>,
    actions: mpsc::UnboundedSender<ModelAction>,
    handshake: Option<oneshot::Receiver<Handshake>>,
}

impl MockModel {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (received_tx, received) = mpsc::unbounded_channel();
        let (actions, mut action_rx) = mpsc::unbounded_channel();
        let (handshake_tx, handshake) = oneshot::channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                let header = |name: &str| {
                    req.headers()
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_owned)
                };
                let _ = handshake_tx.send(Handshake {
                    uri: req.uri().to_string(),
                    authorization: header("authorization"),
                    openai_beta: header("openai-beta"),
                });
                Ok(resp)
            };
            let ws = tokio_tungstenite::accept_hdr_async(stream, callback)
                .await
                .unwrap();
            let (mut ws_tx, mut ws_rx) = ws.split();
            let mut actions_open = true;

            loop {
                tokio::select! {
                    frame = ws_rx.next() => match frame {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            let _ = received_tx.send(text.as_str().to_owned());
                        }
                        Some(Ok(tungstenite::Message::Close(_))) | None | Some(Err(_)) => break,
                        Some(Ok(_)) => {}
                    },
                    action = action_rx.recv(), if actions_open => match action {
                        Some(ModelAction::Send(text)) => {
                            if ws_tx.send(tungstenite::Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        Some(ModelAction::Close) => {
                            let _ = ws_tx.send(tungstenite::Message::Close(None)).await;
                            let _ = ws_tx.close().await;
                            break;
                        }
                        None => actions_open = false,
                    },
                }
            }
            // Dropping `received_tx` tells the test the socket is gone.
        });

        Self {
            url: format!("ws://{addr}/v1/realtime"),
            received,
            actions,
            handshake: Some(handshake),
        }
    }

    /// Send a server event to the bridge.
    pub fn send(&self, event: Value) {
        let _ = self.actions.send(ModelAction::Send(event.to_string()));
    }

    /// Close the model socket from the server side.
    pub fn close(&self) {
        let _ = self.actions.send(ModelAction::Close);
    }

    /// Next client event the bridge sent, parsed as JSON.
    pub async fn recv(&mut self) -> Value {
        let text = tokio::time::timeout(TIMEOUT, self.received.recv())
            .await
            .expect("timed out waiting for a model frame")
            .expect("model socket closed");
        serde_json::from_str(&text).unwrap()
    }

    /// Next client event whose `type` is not `input_audio_buffer.append`.
    pub async fn recv_control(&mut self) -> Value {
        loop {
            let event = self.recv().await;
            if event["type"] != "input_audio_buffer.append" {
                return event;
            }
        }
    }

    /// Wait until the bridge closes the model socket.
    pub async fn expect_closed(&mut self) {
        loop {
            let next = tokio::time::timeout(TIMEOUT, self.received.recv())
                .await
                .expect("timed out waiting for model socket to close");
            if next.is_none() {
                return;
            }
        }
    }

    pub async fn handshake(&mut self) -> Handshake {
        let rx = self.handshake.take().expect("handshake already taken");
        tokio::time::timeout(TIMEOUT, rx)
            .await
            .expect("timed out waiting for handshake")
            .unwrap()
    }
}

/// A server that rejects every upgrade with `status`.
pub async fn spawn_rejecting_model(status: u16) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let callback = move |_: &Request, _: Response| -> Result<Response, ErrorResponse> {
                Err(http::Response::builder()
                    .status(status)
                    .body(Some("rejected".to_string()))
                    .unwrap())
            };
            let _ = tokio_tungstenite::accept_hdr_async(stream, callback).await;
        }
    });

    format!("ws://{addr}/v1/realtime")
}

// =============================================================================
// Telephony leg
// =============================================================================

/// The provider's side of a telephony media socket.
pub struct TelephonyHarness {
    to_bridge: Option<mpsc::Sender<String>>,
    from_bridge: mpsc::Receiver<String>,
}

pub fn telephony_pair() -> (TelephonySocketAdapter, TelephonyHarness) {
    let (to_bridge, bridge_rx) = mpsc::channel(64);
    let (bridge_tx, from_bridge) = mpsc::channel(64);
    let adapter = TelephonySocketAdapter::from_transport(
        Box::new(ChannelSink::new(bridge_tx)),
        Box::new(ChannelSource::new(bridge_rx)),
    );
    (
        adapter,
        TelephonyHarness {
            to_bridge: Some(to_bridge),
            from_bridge,
        },
    )
}

impl TelephonyHarness {
    pub async fn send(&self, message: Value) {
        if let Some(tx) = &self.to_bridge {
            let _ = tx.send(message.to_string()).await;
        }
    }

    pub async fn connected(&self) {
        self.send(serde_json::json!({"event": "connected", "protocol": "Call", "version": "1.0.0"}))
            .await;
    }

    pub async fn start(&self, stream_sid: &str) {
        self.send(serde_json::json!({
            "event": "start",
            "sequenceNumber": "1",
            "start": {
                "streamSid": stream_sid,
                "callSid": "CA123",
                "tracks": ["inbound"],
                "mediaFormat": {"encoding": "audio/x-mulaw", "sampleRate": 8000, "channels": 1}
            },
            "streamSid": stream_sid
        }))
        .await;
    }

    pub async fn media(&self, payload: &str) {
        self.send(serde_json::json!({
            "event": "media",
            "media": {"track": "inbound", "chunk": "1", "timestamp": "5", "payload": payload}
        }))
        .await;
    }

    pub async fn stop(&self) {
        self.send(serde_json::json!({"event": "stop", "stop": {"callSid": "CA123"}}))
            .await;
    }

    /// Close the provider's side of the socket.
    pub fn hang_up(&mut self) {
        self.to_bridge.take();
    }

    pub async fn recv(&mut self) -> Value {
        let text = tokio::time::timeout(TIMEOUT, self.from_bridge.recv())
            .await
            .expect("timed out waiting for a telephony frame")
            .expect("telephony socket closed");
        serde_json::from_str(&text).unwrap()
    }

    /// Wait until the bridge closes the telephony socket, returning any
    /// frames still delivered before it did.
    pub async fn expect_closed(&mut self) -> Vec<Value> {
        let mut remaining = Vec::new();
        loop {
            let next = tokio::time::timeout(TIMEOUT, self.from_bridge.recv())
                .await
                .expect("timed out waiting for telephony socket to close");
            match next {
                Some(text) => remaining.push(serde_json::from_str(&text).unwrap()),
                None => return remaining,
            }
        }
    }
}

// =============================================================================
// Bridge
// =============================================================================

pub fn endpoint(url: &str) -> Arc<RealtimeEndpoint> {
    Arc::new(RealtimeEndpoint::new(TEST_API_KEY).with_url(url))
}

pub fn bridge(call_id: &str, url: &str, telephony: TelephonySocketAdapter) -> CallBridge {
    CallBridge::new(
        call_id,
        telephony,
        endpoint(url),
        Arc::new(ModelSessionConfig::default()),
    )
}

/// Callback forwarding every call event into a channel.
pub fn event_collector() -> (CallEventCallback, mpsc::UnboundedReceiver<CallEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let callback: CallEventCallback = Arc::new(move |event| {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(event);
        })
    });
    (callback, rx)
}

pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<CallEvent>) -> CallEvent {
    tokio::time::timeout(TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for a call event")
        .expect("event channel closed")
}

pub fn audio_delta(payload: &str) -> Value {
    serde_json::json!({
        "type": "response.audio.delta",
        "event_id": "evt_1",
        "response_id": "resp_1",
        "item_id": "item_1",
        "output_index": 0,
        "content_index": 0,
        "delta": payload
    })
}

pub fn user_transcript(text: &str) -> Value {
    serde_json::json!({
        "type": "conversation.item.input_audio_transcription.completed",
        "item_id": "item_1",
        "content_index": 0,
        "transcript": text
    })
}
