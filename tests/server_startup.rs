//! Server Startup Tests
//!
//! Tests for router construction and the media stream endpoint served over a
//! real listener, with a local mock standing in for the realtime model.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{body::Body, http::Request};
use futures_util::{SinkExt, StreamExt};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tower::util::ServiceExt;

use callrelay_gateway::{
    CallEvent, RealtimeAudioFormat, RealtimeVoice, ServerConfig, TerminationReason,
    core::bridge::CallEventCallback, routes, state::AppState,
};
use common::{MockModel, TIMEOUT, audio_delta};

/// Helper function to create a minimal test configuration
fn create_test_config(realtime_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        openai_api_key: Some("sk-test-key".to_string()),
        realtime_url: realtime_url.to_string(),
        realtime_model: "gpt-4o-realtime-preview-2024-12-17".to_string(),
        instructions: "You are a helpful receptionist.".to_string(),
        instructions_file: None,
        voice: RealtimeVoice::Shimmer,
        audio_format: RealtimeAudioFormat::G711Ulaw,
        transcription_model: None,
        vad_threshold: 0.5,
        vad_prefix_padding_ms: 300,
        vad_silence_duration_ms: 500,
        temperature: 0.8,
        opening_prompt: None,
        barge_in_clear: true,
    }
}

/// Serve the full router on an ephemeral port.
async fn serve(state: Arc<AppState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = routes::create_router(state);
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

#[tokio::test]
async fn test_health_routes() {
    let app = routes::create_router(AppState::new(create_test_config("ws://127.0.0.1:1")));

    for path in ["/", "/health"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "GET {path}");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "callrelay-gateway");
    }
}

#[tokio::test]
async fn test_media_route_requires_upgrade() {
    let app = routes::create_router(AppState::new(create_test_config("ws://127.0.0.1:1")));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/media/call-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = routes::create_router(AppState::new(create_test_config("ws://127.0.0.1:1")));

    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_app_state_derives_call_settings() {
    let mut config = create_test_config("ws://127.0.0.1:1");
    config.opening_prompt = Some("Say hello".to_string());
    let state = AppState::new(config);

    assert_eq!(state.session.voice, RealtimeVoice::Shimmer);
    assert_eq!(state.session.instructions, "You are a helpful receptionist.");
    assert!(state.session.transcription_model.is_none());
    assert!(state.endpoint.validate().is_ok());
    assert!(state.call_events.is_none());
}

#[tokio::test]
async fn test_media_stream_end_to_end() {
    let mut model = MockModel::spawn().await;

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let callback: CallEventCallback = Arc::new(move |event| {
        let tx = events_tx.clone();
        Box::pin(async move {
            let _ = tx.send(event);
        })
    });
    let state = AppState::with_call_events(create_test_config(&model.url), callback);
    let addr = serve(state).await;

    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/media/call-42"))
        .await
        .unwrap();
    let (mut phone_tx, mut phone_rx) = ws.split();

    let update = model.recv().await;
    assert_eq!(update["type"], "session.update");
    assert_eq!(update["session"]["voice"], "shimmer");
    assert_eq!(update["session"]["instructions"], "You are a helpful receptionist.");
    assert!(update["session"].get("input_audio_transcription").is_none());

    for frame in [
        json!({"event": "connected", "protocol": "Call", "version": "1.0.0"}),
        json!({"event": "start", "start": {"streamSid": "MZ42", "callSid": "CA42"}, "streamSid": "MZ42"}),
        json!({"event": "media", "media": {"payload": "fn5+fg=="}}),
    ] {
        phone_tx
            .send(Message::Text(frame.to_string().into()))
            .await
            .unwrap();
    }

    assert_eq!(
        model.recv().await,
        json!({"type": "input_audio_buffer.append", "audio": "fn5+fg=="})
    );

    model.send(audio_delta("//7+/g=="));
    let reply = tokio::time::timeout(TIMEOUT, phone_rx.next())
        .await
        .expect("timed out waiting for model audio")
        .unwrap()
        .unwrap();
    let reply: Value = serde_json::from_str(reply.to_text().unwrap()).unwrap();
    assert_eq!(
        reply,
        json!({"event": "media", "streamSid": "MZ42", "media": {"payload": "//7+/g=="}})
    );

    phone_tx
        .send(Message::Text(json!({"event": "stop"}).to_string().into()))
        .await
        .unwrap();

    model.expect_closed().await;

    let summary = loop {
        let event = tokio::time::timeout(TIMEOUT, events.recv())
            .await
            .expect("timed out waiting for call summary")
            .unwrap();
        if let CallEvent::Closed(summary) = event {
            break summary;
        }
    };
    assert_eq!(summary.call_id, "call-42");
    assert_eq!(summary.stream_id.as_deref(), Some("MZ42"));
    assert_eq!(summary.reason, TerminationReason::TelephonyStopped);
    assert_eq!(summary.inbound_frames, 1);
    assert_eq!(summary.outbound_frames, 1);

    // The gateway closes the provider's socket once the call ends.
    let closed = tokio::time::timeout(TIMEOUT, async {
        while let Some(Ok(message)) = phone_rx.next().await {
            if message.is_close() {
                break;
            }
        }
    })
    .await;
    assert!(closed.is_ok());
}
