//! Upstream connection to the realtime speech model.
//!
//! A [`RealtimeModelAdapter`] owns one model socket for one call. After the
//! session is configured it is split into a [`ModelSender`] (used by the
//! inbound pump) and a [`ModelReceiver`] (used by the outbound pump).

use futures_util::StreamExt;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode, header};
use url::Url;
use zeroize::Zeroize;

use super::config::{DEFAULT_REALTIME_MODEL, ModelSessionConfig, OPENAI_REALTIME_URL};
use super::error::{RealtimeError, RealtimeResult};
use super::events::{ModelEvent, classify};
use super::messages::{ClientEvent, ConversationItem};
use crate::core::audio::AudioFrame;
use crate::core::transport::{BoxedFrameSink, BoxedFrameSource};

// =============================================================================
// Endpoint
// =============================================================================

/// Where and how to reach the realtime model.
#[derive(Clone)]
pub struct RealtimeEndpoint {
    /// Base WebSocket URL, without the model query parameter
    pub url: String,
    /// Model identifier
    pub model: String,
    /// API key sent as a bearer token
    pub api_key: String,
}

impl RealtimeEndpoint {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            url: OPENAI_REALTIME_URL.to_string(),
            model: DEFAULT_REALTIME_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Check that the endpoint can be used for a handshake.
    pub fn validate(&self) -> RealtimeResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "API key is required".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "Model is required".to_string(),
            ));
        }
        self.ws_url().map(|_| ())
    }

    /// Full WebSocket URL including the `model` query parameter.
    pub fn ws_url(&self) -> RealtimeResult<Url> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| RealtimeError::InvalidConfiguration(format!("Invalid URL: {e}")))?;

        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(RealtimeError::InvalidConfiguration(format!(
                    "Unsupported URL scheme: {other}"
                )));
            }
        }

        if !url.query_pairs().any(|(key, _)| key == "model") {
            url.query_pairs_mut().append_pair("model", &self.model);
        }
        Ok(url)
    }
}

impl std::fmt::Debug for RealtimeEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEndpoint")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl Drop for RealtimeEndpoint {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

fn map_handshake_error(err: tungstenite::Error) -> RealtimeError {
    match err {
        tungstenite::Error::Http(response) => {
            let status = response.status();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                RealtimeError::AuthenticationFailed(format!("Handshake rejected with {status}"))
            } else {
                RealtimeError::ConnectionFailed(format!("Handshake rejected with {status}"))
            }
        }
        other => RealtimeError::ConnectionFailed(other.to_string()),
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// One call's connection to the realtime model.
pub struct RealtimeModelAdapter {
    sender: ModelSender,
    receiver: ModelReceiver,
}

impl RealtimeModelAdapter {
    /// Open the upstream socket.
    ///
    /// Fails with [`RealtimeError::AuthenticationFailed`] when the handshake
    /// is rejected with 401/403 and [`RealtimeError::ConnectionFailed`] for
    /// any other handshake failure.
    pub async fn connect(endpoint: &RealtimeEndpoint) -> RealtimeResult<Self> {
        endpoint.validate()?;
        let url = endpoint.ws_url()?;

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| RealtimeError::InvalidConfiguration(e.to_string()))?;

        let bearer = HeaderValue::from_str(&format!("Bearer {}", endpoint.api_key))
            .map_err(|_| RealtimeError::InvalidConfiguration("Invalid API key".to_string()))?;
        let headers = request.headers_mut();
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert("OpenAI-Beta", HeaderValue::from_static("realtime=v1"));

        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(map_handshake_error)?;

        tracing::info!(model = %endpoint.model, "Connected to realtime model");

        let (ws_sink, ws_stream) = ws_stream.split();
        Ok(Self::from_transport(Box::new(ws_sink), Box::new(ws_stream)))
    }

    /// Wrap an already-open transport.
    pub fn from_transport(sink: BoxedFrameSink, source: BoxedFrameSource) -> Self {
        Self {
            sender: ModelSender { sink, closed: false },
            receiver: ModelReceiver { source },
        }
    }

    /// Send the one `session.update` for this call.
    pub async fn configure_session(&mut self, session: &ModelSessionConfig) -> RealtimeResult<()> {
        self.sender
            .send(&ClientEvent::SessionUpdate {
                session: session.to_wire(),
            })
            .await
            .map_err(|e| RealtimeError::SessionError(e.to_string()))?;

        tracing::debug!(
            voice = %session.voice,
            format = %session.input_audio_format,
            "Model session configured"
        );
        Ok(())
    }

    /// Inject a user-role opening turn and request a response, so the model
    /// speaks before the caller does.
    pub async fn prime_opening_turn(&mut self, text: &str) -> RealtimeResult<()> {
        self.sender
            .send(&ClientEvent::ConversationItemCreate {
                item: ConversationItem::user_text(text),
            })
            .await
            .map_err(|e| RealtimeError::SessionError(e.to_string()))?;
        self.sender
            .send(&ClientEvent::ResponseCreate)
            .await
            .map_err(|e| RealtimeError::SessionError(e.to_string()))?;

        tracing::debug!("Opening turn requested");
        Ok(())
    }

    pub async fn send_inbound_audio(&mut self, frame: &AudioFrame) -> RealtimeResult<()> {
        self.sender.send_inbound_audio(frame).await
    }

    pub async fn next_event(&mut self) -> Option<RealtimeResult<ModelEvent>> {
        self.receiver.next_event().await
    }

    pub async fn close(&mut self) -> RealtimeResult<()> {
        self.sender.close().await
    }

    /// Split into independently owned halves for the two pumps.
    pub fn split(self) -> (ModelSender, ModelReceiver) {
        (self.sender, self.receiver)
    }
}

// =============================================================================
// Halves
// =============================================================================

/// Outbound half of the model connection.
pub struct ModelSender {
    sink: BoxedFrameSink,
    closed: bool,
}

impl ModelSender {
    async fn send(&mut self, event: &ClientEvent) -> RealtimeResult<()> {
        if self.closed {
            return Err(RealtimeError::NotConnected);
        }
        let text = serde_json::to_string(event)?;
        self.sink.send_text(text).await?;
        Ok(())
    }

    /// Forward one caller frame as `input_audio_buffer.append`.
    ///
    /// Returns once the frame is handed to the socket; there is no
    /// acknowledgment from the model.
    pub async fn send_inbound_audio(&mut self, frame: &AudioFrame) -> RealtimeResult<()> {
        self.send(&ClientEvent::InputAudioBufferAppend {
            audio: frame.payload().to_owned(),
        })
        .await
    }

    /// Release the socket. Later calls return `Ok(())` without doing anything.
    pub async fn close(&mut self) -> RealtimeResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.sink.close().await?;
        Ok(())
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Inbound half of the model connection.
pub struct ModelReceiver {
    source: BoxedFrameSource,
}

impl ModelReceiver {
    /// Wait for the next classified event.
    ///
    /// Frames that cannot be decoded are logged and skipped. Returns `None`
    /// once the model closes the connection.
    pub async fn next_event(&mut self) -> Option<RealtimeResult<ModelEvent>> {
        loop {
            let text = match self.source.next_text().await? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };

            match classify(&text) {
                Ok(event) => return Some(Ok(event)),
                Err(e) => {
                    tracing::warn!(error = %e, len = text.len(), "Skipping malformed model frame");
                }
            }
        }
    }
}
