use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::events::{CallEvent, CallEventCallback, CallSummary, TranscriptRole};
use super::state::{BridgeState, CallError, Peer, StreamIdCell, TerminationReason};
use crate::core::audio::AudioFrame;
use crate::core::realtime::{
    ModelEvent, ModelReceiver, ModelSender, ModelSessionConfig, RealtimeEndpoint,
    RealtimeModelAdapter, RealtimeResult,
};
use crate::core::telephony::{
    TelephonyError, TelephonyMessage, TelephonyReceiver, TelephonySender, TelephonySocketAdapter,
};

// =============================================================================
// Handle
// =============================================================================

/// Observes and stops a bridge from outside its task.
#[derive(Clone)]
pub struct BridgeHandle {
    cancel: CancellationToken,
    state: watch::Receiver<BridgeState>,
}

impl BridgeHandle {
    /// Ask the bridge to tear down. Calling this more than once, or after the
    /// bridge already closed, has no further effect.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn state(&self) -> BridgeState {
        *self.state.borrow()
    }

    /// Wait until the bridge reaches [`BridgeState::Closed`].
    pub async fn wait_closed(&self) {
        let mut state = self.state.clone();
        // An error means the bridge was dropped without running.
        let _ = state.wait_for(|s| *s == BridgeState::Closed).await;
    }
}

// =============================================================================
// Bridge
// =============================================================================

/// Relays one phone call between the telephony leg and the realtime model.
///
/// The bridge connects and configures the model, then runs two pumps:
/// telephony → model (caller audio, stream start/stop) and model → telephony
/// (synthesized audio, transcripts, errors). When either pump ends the other
/// is cancelled and both sockets are closed.
pub struct CallBridge {
    call_id: String,
    session_id: String,
    telephony: TelephonySocketAdapter,
    endpoint: Arc<RealtimeEndpoint>,
    model: Option<RealtimeModelAdapter>,
    session: Arc<ModelSessionConfig>,
    opening_turn: Option<String>,
    barge_in_clear: bool,
    callback: Option<CallEventCallback>,
    cancel: CancellationToken,
    state_tx: watch::Sender<BridgeState>,
}

impl CallBridge {
    pub fn new(
        call_id: impl Into<String>,
        telephony: TelephonySocketAdapter,
        endpoint: Arc<RealtimeEndpoint>,
        session: Arc<ModelSessionConfig>,
    ) -> Self {
        let (state_tx, _) = watch::channel(BridgeState::Connecting);
        Self {
            call_id: call_id.into(),
            session_id: Uuid::new_v4().to_string(),
            telephony,
            endpoint,
            model: None,
            session,
            opening_turn: None,
            barge_in_clear: true,
            callback: None,
            cancel: CancellationToken::new(),
            state_tx,
        }
    }

    /// Have the model speak first, prompted by `text`. Empty text disables it.
    pub fn with_opening_turn(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.opening_turn = (!text.trim().is_empty()).then_some(text);
        self
    }

    /// Use an already open model connection instead of dialing the endpoint.
    ///
    /// The bridge still passes through `Connecting` and configures the
    /// session on the given connection before streaming.
    pub fn with_model(mut self, model: RealtimeModelAdapter) -> Self {
        self.model = Some(model);
        self
    }

    /// Send `clear` to the telephony leg when the caller starts talking.
    pub fn with_barge_in_clear(mut self, enabled: bool) -> Self {
        self.barge_in_clear = enabled;
        self
    }

    pub fn on_event(mut self, callback: CallEventCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn handle(&self) -> BridgeHandle {
        BridgeHandle {
            cancel: self.cancel.clone(),
            state: self.state_tx.subscribe(),
        }
    }

    /// Run the call to completion.
    ///
    /// Never fails: every outcome, including connect and configuration
    /// failures, is reported in the returned summary.
    pub async fn run(self) -> CallSummary {
        let CallBridge {
            call_id,
            session_id,
            telephony,
            endpoint,
            model,
            session,
            opening_turn,
            barge_in_clear,
            callback,
            cancel,
            state_tx,
        } = self;

        let lifecycle = Lifecycle {
            call_id,
            session_id,
            state_tx,
            callback,
        };
        let (telephony_tx, telephony_rx) = telephony.split();
        tracing::info!(
            call_id = %lifecycle.call_id,
            session_id = %lifecycle.session_id,
            "Call bridge starting"
        );

        lifecycle.set_state(BridgeState::Connecting);
        let connected = match model {
            Some(model) => Some(Ok(model)),
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = RealtimeModelAdapter::connect(&endpoint) => Some(result),
            },
        };
        let mut model = match connected {
            Some(Ok(model)) => model,
            Some(Err(e)) => {
                tracing::error!(call_id = %lifecycle.call_id, error = %e, "Failed to connect to realtime model");
                let reason = TerminationReason::Failed(CallError::UpstreamConnect(e.to_string()));
                return lifecycle
                    .teardown(None, Some(telephony_tx), reason, None, Totals::default())
                    .await;
            }
            None => {
                return lifecycle
                    .teardown(
                        None,
                        Some(telephony_tx),
                        TerminationReason::Shutdown,
                        None,
                        Totals::default(),
                    )
                    .await;
            }
        };

        lifecycle.set_state(BridgeState::Configuring);
        let configured = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = configure(&mut model, &session, opening_turn.as_deref()) => Some(result),
        };
        let (model_tx, model_rx) = model.split();
        match configured {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                tracing::error!(call_id = %lifecycle.call_id, error = %e, "Failed to configure model session");
                let reason = TerminationReason::Failed(CallError::UpstreamConfig(e.to_string()));
                return lifecycle
                    .teardown(
                        Some(model_tx),
                        Some(telephony_tx),
                        reason,
                        None,
                        Totals::default(),
                    )
                    .await;
            }
            None => {
                return lifecycle
                    .teardown(
                        Some(model_tx),
                        Some(telephony_tx),
                        TerminationReason::Shutdown,
                        None,
                        Totals::default(),
                    )
                    .await;
            }
        }

        lifecycle.set_state(BridgeState::Streaming);
        let stream_id = Arc::new(StreamIdCell::new());

        let inbound = tokio::spawn(inbound_pump(
            lifecycle.call_id.clone(),
            telephony_rx,
            model_tx,
            stream_id.clone(),
            cancel.clone(),
        ));
        let outbound = tokio::spawn(outbound_pump(
            lifecycle.call_id.clone(),
            model_rx,
            telephony_tx,
            stream_id.clone(),
            cancel.clone(),
            barge_in_clear,
            lifecycle.callback.clone(),
        ));
        let (inbound, outbound) = tokio::join!(inbound, outbound);

        let mut totals = Totals::default();
        let (inbound_end, model_tx) = match inbound {
            Ok(outcome) => {
                totals.inbound = outcome.stats;
                (outcome.end, Some(outcome.sender))
            }
            Err(e) => (
                PumpEnd::Failed(CallError::Transport {
                    peer: Peer::Telephony,
                    detail: format!("inbound pump aborted: {e}"),
                }),
                None,
            ),
        };
        let (outbound_end, telephony_tx) = match outbound {
            Ok(outcome) => {
                totals.outbound = outcome.stats;
                totals.dropped = outcome.dropped;
                (outcome.end, Some(outcome.sender))
            }
            Err(e) => (
                PumpEnd::Failed(CallError::Transport {
                    peer: Peer::Model,
                    detail: format!("outbound pump aborted: {e}"),
                }),
                None,
            ),
        };

        let reason = resolve_reason(inbound_end, outbound_end);
        let stream_id = stream_id.get().map(str::to_owned);
        lifecycle
            .teardown(model_tx, telephony_tx, reason, stream_id, totals)
            .await
    }
}

async fn configure(
    model: &mut RealtimeModelAdapter,
    session: &ModelSessionConfig,
    opening_turn: Option<&str>,
) -> RealtimeResult<()> {
    model.configure_session(session).await?;
    if let Some(text) = opening_turn {
        model.prime_opening_turn(text).await?;
    }
    Ok(())
}

// =============================================================================
// Lifecycle
// =============================================================================

struct Lifecycle {
    call_id: String,
    session_id: String,
    state_tx: watch::Sender<BridgeState>,
    callback: Option<CallEventCallback>,
}

impl Lifecycle {
    fn set_state(&self, state: BridgeState) {
        self.state_tx.send_replace(state);
        tracing::info!(call_id = %self.call_id, state = %state, "Bridge state changed");
    }

    /// Close whatever is still open and publish the summary.
    ///
    /// Close failures are logged and never stop the other side from closing.
    async fn teardown(
        &self,
        model: Option<ModelSender>,
        telephony: Option<TelephonySender>,
        reason: TerminationReason,
        stream_id: Option<String>,
        totals: Totals,
    ) -> CallSummary {
        self.set_state(BridgeState::Closing);

        if let Some(mut model) = model {
            if let Err(e) = model.close().await {
                tracing::debug!(call_id = %self.call_id, error = %e, "Model socket close reported an error");
            }
        }
        if let Some(mut telephony) = telephony {
            if let Err(e) = telephony.close().await {
                tracing::debug!(call_id = %self.call_id, error = %e, "Telephony socket close reported an error");
            }
        }

        self.set_state(BridgeState::Closed);

        let summary = CallSummary {
            call_id: self.call_id.clone(),
            session_id: self.session_id.clone(),
            stream_id,
            reason,
            inbound_frames: totals.inbound.frames,
            outbound_frames: totals.outbound.frames,
            dropped_frames: totals.dropped,
            inbound_audio_bytes: totals.inbound.bytes,
            outbound_audio_bytes: totals.outbound.bytes,
        };

        if summary.reason.is_failure() {
            tracing::warn!(
                call_id = %summary.call_id,
                session_id = %summary.session_id,
                reason = %summary.reason,
                stream_id = ?summary.stream_id,
                "Call bridge closed after failure"
            );
        } else {
            tracing::info!(
                call_id = %summary.call_id,
                session_id = %summary.session_id,
                reason = %summary.reason,
                stream_id = ?summary.stream_id,
                inbound_frames = summary.inbound_frames,
                outbound_frames = summary.outbound_frames,
                dropped_frames = summary.dropped_frames,
                "Call bridge closed"
            );
        }

        emit(&self.callback, CallEvent::Closed(summary.clone())).await;
        summary
    }
}

async fn emit(callback: &Option<CallEventCallback>, event: CallEvent) {
    if let Some(cb) = callback {
        cb(event).await;
    }
}

// =============================================================================
// Pumps
// =============================================================================

#[derive(Debug, Default, Clone, Copy)]
struct DirectionStats {
    frames: u64,
    bytes: u64,
}

impl DirectionStats {
    fn record(&mut self, frame: &AudioFrame) {
        self.frames += 1;
        self.bytes += frame.estimated_audio_bytes() as u64;
    }
}

#[derive(Debug, Default)]
struct Totals {
    inbound: DirectionStats,
    outbound: DirectionStats,
    dropped: u64,
}

#[derive(Debug)]
enum PumpEnd {
    /// Telephony sent `stop`
    Stopped,
    /// This pump's source closed
    PeerClosed,
    /// The other pump or an external shutdown stopped this one
    Cancelled,
    Failed(CallError),
}

impl PumpEnd {
    fn into_reason(self, source: Peer) -> Option<TerminationReason> {
        match self {
            PumpEnd::Stopped => Some(TerminationReason::TelephonyStopped),
            PumpEnd::PeerClosed => Some(TerminationReason::PeerClosed(source)),
            PumpEnd::Cancelled => None,
            PumpEnd::Failed(err) => Some(TerminationReason::Failed(err)),
        }
    }
}

/// Pick the reason reported for the call. Failures win over normal endings;
/// two cancelled pumps mean an external shutdown.
fn resolve_reason(inbound: PumpEnd, outbound: PumpEnd) -> TerminationReason {
    let inbound = inbound.into_reason(Peer::Telephony);
    let outbound = outbound.into_reason(Peer::Model);

    match (inbound, outbound) {
        (Some(TerminationReason::Failed(err)), _) | (_, Some(TerminationReason::Failed(err))) => {
            TerminationReason::Failed(err)
        }
        (Some(reason), _) | (None, Some(reason)) => reason,
        (None, None) => TerminationReason::Shutdown,
    }
}

struct InboundOutcome {
    end: PumpEnd,
    sender: ModelSender,
    stats: DirectionStats,
}

struct OutboundOutcome {
    end: PumpEnd,
    sender: TelephonySender,
    stats: DirectionStats,
    dropped: u64,
}

/// Telephony → model.
async fn inbound_pump(
    call_id: String,
    mut telephony: TelephonyReceiver,
    mut model: ModelSender,
    stream_id: Arc<StreamIdCell>,
    cancel: CancellationToken,
) -> InboundOutcome {
    let _guard = cancel.clone().drop_guard();
    let mut stats = DirectionStats::default();

    let end = loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break PumpEnd::Cancelled,
            next = telephony.next_message() => next,
        };

        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                tracing::error!(call_id = %call_id, error = %e, "Telephony socket failed");
                break PumpEnd::Failed(CallError::Transport {
                    peer: Peer::Telephony,
                    detail: e.to_string(),
                });
            }
            None => {
                tracing::info!(call_id = %call_id, "Telephony socket closed");
                break PumpEnd::PeerClosed;
            }
        };

        match message {
            TelephonyMessage::Start {
                stream_id: id,
                call_sid,
                media_format,
            } => match stream_id.set(id) {
                Ok(()) => {
                    tracing::info!(
                        call_id = %call_id,
                        stream_id = stream_id.get().unwrap_or_default(),
                        call_sid = ?call_sid,
                        media_format = ?media_format,
                        "Telephony stream started"
                    );
                }
                Err(rejected) => {
                    tracing::warn!(
                        call_id = %call_id,
                        stream_id = stream_id.get().unwrap_or_default(),
                        rejected = %rejected,
                        "Ignoring duplicate start message"
                    );
                }
            },
            TelephonyMessage::Media(frame) => {
                let sent = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break PumpEnd::Cancelled,
                    sent = model.send_inbound_audio(&frame) => sent,
                };
                if let Err(e) = sent {
                    tracing::error!(call_id = %call_id, error = %e, "Failed to forward caller audio");
                    break PumpEnd::Failed(CallError::Transport {
                        peer: Peer::Model,
                        detail: e.to_string(),
                    });
                }
                stats.record(&frame);
                tracing::trace!(len = frame.payload().len(), "Forwarded caller audio");
            }
            TelephonyMessage::Stop => {
                tracing::info!(call_id = %call_id, "Telephony stream stopped");
                break PumpEnd::Stopped;
            }
            TelephonyMessage::Other(kind) => {
                tracing::debug!(event = %kind, "Ignoring telephony message");
            }
        }
    };

    InboundOutcome {
        end,
        sender: model,
        stats,
    }
}

/// Model → telephony.
async fn outbound_pump(
    call_id: String,
    mut model: ModelReceiver,
    mut telephony: TelephonySender,
    stream_id: Arc<StreamIdCell>,
    cancel: CancellationToken,
    barge_in_clear: bool,
    callback: Option<CallEventCallback>,
) -> OutboundOutcome {
    let _guard = cancel.clone().drop_guard();
    let mut stats = DirectionStats::default();
    let mut dropped = 0u64;

    let end = loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break PumpEnd::Cancelled,
            next = model.next_event() => next,
        };

        let event = match next {
            Some(Ok(event)) => event,
            Some(Err(e)) => {
                tracing::error!(call_id = %call_id, error = %e, "Realtime model socket failed");
                break PumpEnd::Failed(CallError::Transport {
                    peer: Peer::Model,
                    detail: e.to_string(),
                });
            }
            None => {
                tracing::info!(call_id = %call_id, "Realtime model socket closed");
                break PumpEnd::PeerClosed;
            }
        };

        match event {
            ModelEvent::AudioDelta { payload } if payload.is_empty() => {
                tracing::debug!(call_id = %call_id, "Skipping empty model audio delta");
            }
            ModelEvent::AudioDelta { payload } => {
                let frame = AudioFrame::outbound(payload);
                let sent = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break PumpEnd::Cancelled,
                    sent = telephony.send_audio(stream_id.get(), &frame) => sent,
                };
                match sent {
                    Ok(()) => {
                        stats.record(&frame);
                        tracing::trace!(len = frame.payload().len(), "Forwarded model audio");
                    }
                    Err(TelephonyError::NoStreamId) => dropped += 1,
                    Err(e) => {
                        tracing::error!(call_id = %call_id, error = %e, "Failed to send audio to telephony");
                        break PumpEnd::Failed(CallError::Transport {
                            peer: Peer::Telephony,
                            detail: e.to_string(),
                        });
                    }
                }
            }
            ModelEvent::SpeechStarted => {
                let id = stream_id.get().filter(|_| barge_in_clear);
                if id.is_some() {
                    let sent = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break PumpEnd::Cancelled,
                        sent = telephony.send_clear(id) => sent,
                    };
                    if let Err(e) = sent {
                        tracing::error!(call_id = %call_id, error = %e, "Failed to send clear to telephony");
                        break PumpEnd::Failed(CallError::Transport {
                            peer: Peer::Telephony,
                            detail: e.to_string(),
                        });
                    }
                    tracing::debug!("Caller started speaking, cleared queued audio");
                }
            }
            ModelEvent::TranscriptionCompleted { text } => {
                tracing::info!(call_id = %call_id, role = "user", transcript = %text, "Transcript");
                let event = CallEvent::Transcript {
                    role: TranscriptRole::User,
                    text,
                };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break PumpEnd::Cancelled,
                    _ = emit(&callback, event) => {}
                }
            }
            ModelEvent::ResponseDone { transcript } => match transcript {
                Some(text) => {
                    tracing::info!(call_id = %call_id, role = "assistant", transcript = %text, "Transcript");
                    let event = CallEvent::Transcript {
                        role: TranscriptRole::Assistant,
                        text,
                    };
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break PumpEnd::Cancelled,
                        _ = emit(&callback, event) => {}
                    }
                }
                None => tracing::debug!("Response done without transcript"),
            },
            ModelEvent::Error { detail } => {
                tracing::error!(call_id = %call_id, detail = %detail, "Realtime model reported an error");
                let event = CallEvent::ModelError {
                    detail: detail.clone(),
                };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {}
                    _ = emit(&callback, event) => {}
                }
                break PumpEnd::Failed(CallError::UpstreamProtocol(detail));
            }
            ModelEvent::Other { kind } => {
                tracing::trace!(event = %kind, "Ignoring model event");
            }
        }
    };

    OutboundOutcome {
        end,
        sender: telephony,
        stats,
        dropped,
    }
}
