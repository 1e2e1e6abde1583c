#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use callprobe::dialogue::{DialogueOracle, OracleFactory, Scenario, ScenarioCatalog};
use callprobe::media::{InboundEvent, MediaSink, OutboundEvent, StartMetadata};
use callprobe::registry::SessionRegistry;
use callprobe::session::{CallServices, CallSession, CloseReason, SessionConfig};
use callprobe::stt::{Transcriber, TranscriptEvent, TranscriptionHandle, TranscriptionStream};
use callprobe::transcript::{CallTranscript, TranscriptStore};
use callprobe::tts::{AudioChunkStream, Synthesizer};
use callprobe::AudioFormat;
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// ============================================================================
// Transcription
// ============================================================================

#[derive(Debug, Default)]
pub struct SttLog {
    pub opened: Vec<String>,
    pub fed: Vec<Vec<u8>>,
    pub closed: usize,
}

pub struct FakeTranscriber {
    events: Mutex<Option<mpsc::Receiver<TranscriptEvent>>>,
    pub log: Arc<Mutex<SttLog>>,
    fail_open: bool,
}

impl FakeTranscriber {
    pub fn new() -> (Self, mpsc::Sender<TranscriptEvent>) {
        let (tx, rx) = mpsc::channel(32);
        let transcriber = Self {
            events: Mutex::new(Some(rx)),
            log: Arc::new(Mutex::new(SttLog::default())),
            fail_open: false,
        };
        (transcriber, tx)
    }

    pub fn failing() -> Self {
        let (mut transcriber, _tx) = Self::new();
        transcriber.fail_open = true;
        transcriber
    }
}

#[async_trait::async_trait]
impl Transcriber for FakeTranscriber {
    async fn open(&self, stream_key: &str, _format: AudioFormat) -> Result<TranscriptionStream> {
        if self.fail_open {
            bail!("transcription service unavailable");
        }

        let events = self
            .events
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| anyhow!("stream already opened"))?;
        self.log.lock().unwrap().opened.push(stream_key.to_string());

        Ok(TranscriptionStream {
            handle: Box::new(FakeHandle {
                log: Arc::clone(&self.log),
            }),
            events,
        })
    }
}

struct FakeHandle {
    log: Arc<Mutex<SttLog>>,
}

#[async_trait::async_trait]
impl TranscriptionHandle for FakeHandle {
    async fn feed(&mut self, audio: &[u8]) -> Result<()> {
        self.log.lock().unwrap().fed.push(audio.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.log.lock().unwrap().closed += 1;
        Ok(())
    }
}

// ============================================================================
// Dialogue
// ============================================================================

#[derive(Debug, Default)]
pub struct OracleLog {
    pub scenarios: Vec<String>,
    pub openings: usize,
    pub replies: Vec<String>,
    pub checks: Vec<String>,
}

/// Oracle behaviour shared by every oracle a factory creates
#[derive(Debug, Default)]
pub struct OracleScript {
    /// Agent lines the conclusion check answers "yes" to
    pub conclude_on: Vec<String>,
    /// Number of upcoming generations that fail
    pub generation_failures: AtomicUsize,
    pub classifier_fails: bool,
}

#[derive(Clone, Default)]
pub struct FakeOracleFactory {
    pub script: Arc<OracleScript>,
    pub log: Arc<Mutex<OracleLog>>,
}

impl FakeOracleFactory {
    pub fn new(script: OracleScript) -> Self {
        Self {
            script: Arc::new(script),
            log: Arc::new(Mutex::new(OracleLog::default())),
        }
    }
}

impl OracleFactory for FakeOracleFactory {
    fn create(&self, scenario: &Scenario) -> Box<dyn DialogueOracle> {
        self.log.lock().unwrap().scenarios.push(scenario.name.clone());
        Box::new(FakeOracle {
            script: Arc::clone(&self.script),
            log: Arc::clone(&self.log),
        })
    }
}

struct FakeOracle {
    script: Arc<OracleScript>,
    log: Arc<Mutex<OracleLog>>,
}

impl FakeOracle {
    fn take_failure(&self) -> bool {
        self.script
            .generation_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait::async_trait]
impl DialogueOracle for FakeOracle {
    async fn opening_line(&mut self) -> Result<String> {
        if self.take_failure() {
            bail!("model unavailable");
        }
        self.log.lock().unwrap().openings += 1;
        Ok("Hi, I'd like to book an appointment.".to_string())
    }

    async fn reply(&mut self, agent_text: &str) -> Result<String> {
        if self.take_failure() {
            bail!("model unavailable");
        }
        let mut log = self.log.lock().unwrap();
        log.replies.push(agent_text.to_string());
        Ok(format!("Patient reply {}", log.replies.len()))
    }

    async fn is_concluding(&mut self, agent_text: &str) -> Result<bool> {
        self.log.lock().unwrap().checks.push(agent_text.to_string());
        if self.script.classifier_fails {
            bail!("classifier unavailable");
        }
        Ok(self.script.conclude_on.iter().any(|t| t == agent_text))
    }
}

// ============================================================================
// Synthesis
// ============================================================================

#[derive(Clone)]
pub struct FakeSynthesizer {
    /// Sizes of the chunks each synthesis yields
    pub chunk_sizes: Vec<usize>,
    /// Delay before each chunk
    pub chunk_delay: Duration,
    pub fail: bool,
    pub spoken: Arc<Mutex<Vec<String>>>,
}

impl FakeSynthesizer {
    pub fn new(chunk_sizes: Vec<usize>) -> Self {
        Self {
            chunk_sizes,
            chunk_delay: Duration::ZERO,
            fail: false,
            spoken: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait::async_trait]
impl Synthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioChunkStream> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.fail {
            bail!("voice service unavailable");
        }

        let delay = self.chunk_delay;
        let chunks = self.chunk_sizes.clone();
        Ok(futures::stream::iter(chunks)
            .then(move |size| async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok::<_, anyhow::Error>(vec![0xFF; size])
            })
            .boxed())
    }
}

// ============================================================================
// Transport and persistence
// ============================================================================

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Arc<Mutex<Vec<OutboundEvent>>>,
    /// Fail every send after this many succeeded
    pub fail_after: Option<usize>,
}

#[async_trait::async_trait]
impl MediaSink for RecordingSink {
    async fn send(&mut self, event: OutboundEvent) -> Result<()> {
        let mut events = self.events.lock().unwrap();
        if let Some(limit) = self.fail_after {
            if events.len() >= limit {
                bail!("socket closed");
            }
        }
        events.push(event);
        Ok(())
    }
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<OutboundEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn marks(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|e| e.mark_name().map(str::to_string))
            .collect()
    }

    /// Decoded sizes of the media frames sent so far
    pub fn frame_sizes(&self) -> Vec<usize> {
        self.sent()
            .iter()
            .filter_map(|e| match e {
                OutboundEvent::Media { media, .. } => Some(media.decode().unwrap().len()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    pub saved: Arc<Mutex<Vec<CallTranscript>>>,
}

#[async_trait::async_trait]
impl TranscriptStore for MemoryStore {
    async fn save(&self, transcript: &CallTranscript) -> Result<String> {
        let mut saved = self.saved.lock().unwrap();
        saved.push(transcript.clone());
        Ok(format!("memory://{}", saved.len()))
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub services: CallServices,
    pub stt: Arc<Mutex<SttLog>>,
    pub stt_tx: mpsc::Sender<TranscriptEvent>,
    pub oracle: FakeOracleFactory,
    pub synthesizer: FakeSynthesizer,
    pub sink: RecordingSink,
    pub store: MemoryStore,
    pub registry: Arc<SessionRegistry>,
}

impl Harness {
    pub fn new(config: SessionConfig) -> Self {
        Self::with(config, OracleScript::default(), FakeSynthesizer::new(vec![1000, 500]))
    }

    pub fn with(config: SessionConfig, script: OracleScript, synthesizer: FakeSynthesizer) -> Self {
        let (transcriber, stt_tx) = FakeTranscriber::new();
        let stt = Arc::clone(&transcriber.log);
        let oracle = FakeOracleFactory::new(script);
        let store = MemoryStore::default();
        let registry = Arc::new(SessionRegistry::new());

        let services = CallServices {
            transcriber: Arc::new(transcriber),
            oracles: Arc::new(oracle.clone()),
            synthesizer: Arc::new(synthesizer.clone()),
            store: Arc::new(store.clone()),
            registry: Arc::clone(&registry),
            scenarios: Arc::new(ScenarioCatalog::builtin()),
            config,
        };

        Self {
            services,
            stt,
            stt_tx,
            oracle,
            synthesizer,
            sink: RecordingSink::default(),
            store,
            registry,
        }
    }

    /// Start the session on its own task
    pub fn spawn(&self) -> (UnboundedSender<Result<InboundEvent>>, JoinHandle<CloseReason>) {
        self.spawn_session(CallSession::new(self.services.clone()))
    }

    pub fn spawn_session(
        &self,
        session: CallSession,
    ) -> (UnboundedSender<Result<InboundEvent>>, JoinHandle<CloseReason>) {
        let (tx, rx) = unbounded();
        let sink = Box::new(self.sink.clone());
        let handle = tokio::spawn(session.run(rx.boxed(), sink));
        (tx, handle)
    }

    /// Deliver a final transcript fragment
    pub async fn agent_says(&self, text: &str) {
        self.stt_tx
            .send(TranscriptEvent::final_text(text))
            .await
            .unwrap();
    }

    pub fn saved(&self) -> Vec<CallTranscript> {
        self.store.saved.lock().unwrap().clone()
    }
}

pub fn start_event(call_sid: &str, scenario: Option<&str>) -> InboundEvent {
    let mut custom_parameters = HashMap::new();
    if let Some(name) = scenario {
        custom_parameters.insert("scenario".to_string(), name.to_string());
    }

    InboundEvent::Start {
        start: StartMetadata {
            stream_sid: "MZ-test".to_string(),
            call_sid: call_sid.to_string(),
            custom_parameters,
        },
    }
}

/// Let the session task catch up
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// Longer than the default debounce
pub async fn pause() {
    tokio::time::sleep(Duration::from_secs(3)).await;
}
