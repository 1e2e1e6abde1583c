use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, Instant, Sleep};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::SessionConfig;
use super::responder::{Responder, TurnOutcome};
use super::segmenter::TurnSegmenter;
use super::state::{CloseReason, SessionState};
use crate::audio::AudioFormat;
use crate::dialogue::{OracleFactory, ScenarioCatalog};
use crate::media::{InboundEvent, InboundStream, MediaPayload, MediaSink, StartMetadata};
use crate::registry::SessionRegistry;
use crate::stt::{Transcriber, TranscriptEvent, TranscriptionHandle};
use crate::transcript::{CallMetadata, Speaker, TranscriptRecorder, TranscriptStore};
use crate::tts::Synthesizer;

/// Everything a call session needs from the outside world
///
/// Cheap to clone; one instance is shared by every session of the process.
#[derive(Clone)]
pub struct CallServices {
    pub transcriber: Arc<dyn Transcriber>,
    pub oracles: Arc<dyn OracleFactory>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub store: Arc<dyn TranscriptStore>,
    pub registry: Arc<SessionRegistry>,
    pub scenarios: Arc<ScenarioCatalog>,
    pub config: SessionConfig,
}

type Resolution = BoxFuture<'static, (Responder, TurnOutcome)>;

/// One accepted media stream, from transport connect to teardown
pub struct CallSession {
    services: CallServices,
    stream_key: String,
    recorder: TranscriptRecorder,
    state: Arc<watch::Sender<SessionState>>,
}

impl CallSession {
    pub fn new(services: CallServices) -> Self {
        let (state, _rx) = watch::channel(SessionState::AwaitingStart);

        Self {
            services,
            stream_key: Uuid::new_v4().to_string(),
            recorder: TranscriptRecorder::start("awaiting start"),
            state: Arc::new(state),
        }
    }

    /// Key the transcription stream is opened under
    pub fn stream_key(&self) -> &str {
        &self.stream_key
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Drive the session until it closes; teardown has run when this returns
    pub async fn run(self, inbound: InboundStream, sink: Box<dyn MediaSink>) -> CloseReason {
        info!("Media stream accepted (stream key {})", self.stream_key);

        let opened = self
            .services
            .transcriber
            .open(&self.stream_key, AudioFormat::TELEPHONY)
            .await;

        let stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                error!("Failed to open transcription stream: {:#}", e);
                let reason = CloseReason::TranscriptionFailed(format!("{:#}", e));
                let mut live = LiveSession::new(self, inbound, sink, None, None);
                live.close(&reason).await;
                return reason;
            }
        };

        let mut live = LiveSession::new(
            self,
            inbound,
            sink,
            Some(stream.handle),
            Some(stream.events),
        );
        let reason = live.drive().await;
        live.close(&reason).await;
        reason
    }
}

/// Mutable state of a running session, owned by the session task
struct LiveSession {
    services: CallServices,
    recorder: TranscriptRecorder,
    state: Arc<watch::Sender<SessionState>>,

    inbound: InboundStream,
    idle: Pin<Box<Sleep>>,
    transcription: Option<Box<dyn TranscriptionHandle>>,
    events: Option<mpsc::Receiver<TranscriptEvent>>,
    segmenter: TurnSegmenter,

    call: CallMetadata,
    /// Outbound sink until `start` hands it to the responder
    sink: Option<Box<dyn MediaSink>>,
    /// Idle responder; `None` before `start` and while a turn is in flight
    responder: Option<Responder>,
    in_flight: Option<Resolution>,
    closed: bool,
}

impl LiveSession {
    fn new(
        session: CallSession,
        inbound: InboundStream,
        sink: Box<dyn MediaSink>,
        transcription: Option<Box<dyn TranscriptionHandle>>,
        events: Option<mpsc::Receiver<TranscriptEvent>>,
    ) -> Self {
        let CallSession {
            services,
            recorder,
            state,
            ..
        } = session;

        Self {
            idle: Box::pin(sleep(services.config.receive_timeout)),
            segmenter: TurnSegmenter::new(services.config.debounce),
            services,
            recorder,
            state,
            inbound,
            transcription,
            events,
            call: CallMetadata::default(),
            sink: Some(sink),
            responder: None,
            in_flight: None,
            closed: false,
        }
    }

    async fn drive(&mut self) -> CloseReason {
        loop {
            tokio::select! {
                message = self.inbound.next() => {
                    let deadline = Instant::now() + self.services.config.receive_timeout;
                    self.idle.as_mut().reset(deadline);

                    match message {
                        None => break CloseReason::TransportClosed,
                        Some(Err(e)) => break CloseReason::TransportError(format!("{:#}", e)),
                        Some(Ok(event)) => {
                            if let Err(reason) = self.on_inbound(event).await {
                                break reason;
                            }
                        }
                    }
                }

                () = self.idle.as_mut() => {
                    warn!(
                        "No transport activity for {:?}, ending call",
                        self.services.config.receive_timeout
                    );
                    break CloseReason::ReceiveTimeout;
                }

                event = next_event(&mut self.events) => {
                    match event {
                        Some(TranscriptEvent::Text { text, is_final: true }) => {
                            debug!("Agent said (final): {}", text);
                            self.segmenter.push(text);
                        }
                        Some(TranscriptEvent::Text { text, is_final: false }) => {
                            debug!("Agent said (interim): {}", text);
                        }
                        Some(TranscriptEvent::Failed(e)) => {
                            break CloseReason::TranscriptionFailed(e);
                        }
                        None => {
                            break CloseReason::TranscriptionFailed(
                                "transcription stream ended".to_string(),
                            );
                        }
                    }
                }

                () = self.segmenter.expired(), if self.in_flight.is_none() => {
                    self.on_turn_end().await;
                }

                (responder, outcome) = next_resolution(&mut self.in_flight) => {
                    match outcome {
                        TurnOutcome::Continue => {
                            self.responder = Some(responder);
                            self.state.send_replace(SessionState::Active);
                        }
                        TurnOutcome::Hangup => break CloseReason::Hangup,
                        TurnOutcome::TransportClosed => break CloseReason::TransportClosed,
                    }
                }
            }
        }
    }

    async fn on_inbound(&mut self, event: InboundEvent) -> Result<(), CloseReason> {
        match event {
            InboundEvent::Connected => {
                info!("Media stream connected");
            }
            InboundEvent::Start { start } => self.on_start(start).await,
            InboundEvent::Media { media } => self.on_media(&media).await?,
            InboundEvent::Mark { mark } => {
                debug!("Mark received: {}", mark.name);
            }
            InboundEvent::Stop => {
                info!("Media stream stopped");
                return Err(CloseReason::StreamStopped);
            }
            InboundEvent::Unknown => {
                debug!("Ignoring unknown media stream event");
            }
        }
        Ok(())
    }

    async fn on_start(&mut self, start: StartMetadata) {
        let Some(sink) = self.sink.take() else {
            warn!("Duplicate start event for stream {} ignored", start.stream_sid);
            return;
        };

        let requested = start
            .scenario()
            .unwrap_or(self.services.config.default_scenario.as_str());
        let scenario = self.services.scenarios.resolve(requested).clone();

        self.call = CallMetadata {
            call_sid: start.call_sid.clone(),
            stream_sid: start.stream_sid.clone(),
            scenario: scenario.name.clone(),
        };
        self.recorder.relabel(&scenario.name);

        info!(
            "Stream started: streamSid={} callSid={} scenario={}",
            self.call.stream_sid, self.call.call_sid, self.call.scenario
        );

        if !self.call.call_sid.is_empty() {
            let registry = &self.services.registry;
            registry.register(&self.call.call_sid).await;
            registry
                .attach_transcript(&self.call.call_sid, self.recorder.clone())
                .await;
        }

        self.responder = Some(Responder::new(
            self.services.oracles.create(&scenario),
            Arc::clone(&self.services.synthesizer),
            sink,
            self.recorder.clone(),
            Arc::clone(&self.state),
            self.services.config.clone(),
            scenario.name,
            start.stream_sid,
        ));
        self.state.send_replace(SessionState::Active);
    }

    async fn on_media(&mut self, media: &MediaPayload) -> Result<(), CloseReason> {
        if media.payload.is_empty() {
            return Ok(());
        }

        let audio = media
            .decode()
            .map_err(|e| CloseReason::InvalidMedia(e.to_string()))?;

        if let Some(handle) = self.transcription.as_mut() {
            handle
                .feed(&audio)
                .await
                .map_err(|e| CloseReason::TranscriptionFailed(format!("{:#}", e)))?;
        }
        Ok(())
    }

    /// The silence timer fired: hand the buffered turn to the responder
    async fn on_turn_end(&mut self) {
        let Some(turn) = self.segmenter.flush() else {
            return;
        };
        if turn.trim().is_empty() {
            return;
        }

        self.recorder.append(Speaker::Agent, &turn).await;

        match self.responder.take() {
            Some(responder) => {
                self.in_flight = Some(responder.resolve(turn).boxed());
            }
            None => warn!("Call not started yet, not answering"),
        }
    }

    /// Tear the session down; every step runs even if an earlier one failed
    ///
    /// Only the first call has any effect.
    async fn close(&mut self, reason: &CloseReason) {
        if self.closed {
            debug!("Session already closed, ignoring {}", reason);
            return;
        }
        self.closed = true;

        info!("Closing call session: {}", reason);
        if *self.state.borrow() != SessionState::Ending {
            self.state.send_replace(SessionState::Ending);
        }

        self.segmenter.cancel();
        if self.segmenter.pending() > 0 {
            debug!(
                "Discarding {} unanswered fragments",
                self.segmenter.pending()
            );
        }
        self.in_flight = None;
        self.responder = None;

        if let Some(mut handle) = self.transcription.take() {
            if let Err(e) = handle.close().await {
                warn!("Failed to close transcription stream: {:#}", e);
            }
        }
        self.events = None;

        let transcript = self.recorder.snapshot(&self.call).await;
        match self.services.store.save(&transcript).await {
            Ok(location) => info!("Call complete. Transcript: {}", location),
            Err(e) => error!("Failed to save transcript: {:#}", e),
        }

        if !self.call.call_sid.is_empty() {
            self.services.registry.complete(&self.call.call_sid).await;
        }

        self.state.send_replace(SessionState::Closed);
    }
}

async fn next_event(events: &mut Option<mpsc::Receiver<TranscriptEvent>>) -> Option<TranscriptEvent> {
    match events.as_mut() {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn next_resolution(slot: &mut Option<Resolution>) -> (Responder, TurnOutcome) {
    match slot.as_mut() {
        Some(resolution) => {
            let resolved = resolution.await;
            *slot = None;
            resolved
        }
        None => std::future::pending().await,
    }
}
