//! Classification of upstream model messages.
//!
//! [`classify`] turns one raw text frame from the model into a [`ModelEvent`]
//! holding only what the bridge needs. It keeps no state between calls.

use serde_json::Value;

use super::messages::{EventEnvelope, ServerEvent};

/// Event kinds the bridge reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// A chunk of synthesized audio, wire-encoded
    AudioDelta { payload: String },
    /// Caller speech transcribed by the model
    TranscriptionCompleted { text: String },
    /// A response finished; carries the assistant transcript when present
    ResponseDone { transcript: Option<String> },
    /// Server VAD detected the caller talking
    SpeechStarted,
    /// The model reported an error
    Error { detail: String },
    /// Any other event, identified by its `type`
    Other { kind: String },
}

impl ModelEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &str {
        match self {
            ModelEvent::AudioDelta { .. } => "audio_delta",
            ModelEvent::TranscriptionCompleted { .. } => "transcription_completed",
            ModelEvent::ResponseDone { .. } => "response_done",
            ModelEvent::SpeechStarted => "speech_started",
            ModelEvent::Error { .. } => "error",
            ModelEvent::Other { kind } => kind,
        }
    }
}

/// Decode one upstream text frame.
///
/// Fails only when the frame is not a JSON object with a `type` field the
/// protocol could carry. Unknown event types are not errors. An `error`
/// event is always reported as [`ModelEvent::Error`], even when its body
/// does not have the documented shape.
pub fn classify(text: &str) -> Result<ModelEvent, serde_json::Error> {
    let server_event = match serde_json::from_str::<ServerEvent>(text) {
        Ok(event) => event,
        Err(e) => return loose_error(text).ok_or(e),
    };

    let event = match server_event {
        ServerEvent::AudioDelta { delta } => ModelEvent::AudioDelta { payload: delta },
        ServerEvent::TranscriptionCompleted { transcript } => {
            ModelEvent::TranscriptionCompleted { text: transcript }
        }
        ServerEvent::ResponseDone { response } => ModelEvent::ResponseDone {
            transcript: response.first_transcript().map(str::to_owned),
        },
        ServerEvent::SpeechStarted { .. } => ModelEvent::SpeechStarted,
        ServerEvent::Error { error } => ModelEvent::Error {
            detail: error.to_string(),
        },
        ServerEvent::SessionCreated { session } => {
            tracing::debug!(session_id = ?session.id, model = ?session.model, "Model session created");
            ModelEvent::Other {
                kind: "session.created".to_string(),
            }
        }
        ServerEvent::SessionUpdated { .. } => ModelEvent::Other {
            kind: "session.updated".to_string(),
        },
        ServerEvent::Unknown => {
            let envelope: EventEnvelope = serde_json::from_str(text)?;
            ModelEvent::Other {
                kind: envelope.kind,
            }
        }
    };

    Ok(event)
}

/// Recover an `error` event whose body did not match [`ServerEvent`].
fn loose_error(text: &str) -> Option<ModelEvent> {
    let value: Value = serde_json::from_str(text).ok()?;
    if value.get("type")?.as_str()? != "error" {
        return None;
    }

    let detail = match value.get("error") {
        None | Some(Value::Null) => "unspecified error".to_string(),
        Some(Value::String(message)) => message.clone(),
        Some(error) => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| error.to_string()),
    };

    Some(ModelEvent::Error { detail })
}
