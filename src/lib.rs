pub mod audio;
pub mod config;
pub mod dialogue;
pub mod http;
pub mod media;
pub mod registry;
pub mod runner;
pub mod session;
pub mod stt;
pub mod telephony;
pub mod transcript;
pub mod tts;

pub use audio::{AudioEncoding, AudioFormat, CodecError, FrameChunker};
pub use config::Config;
pub use dialogue::{ChatOracleFactory, DialogueOracle, OracleFactory, Scenario, ScenarioCatalog};
pub use http::{create_router, AppState};
pub use media::{InboundEvent, InboundStream, MediaSink, OutboundEvent};
pub use registry::{CompletionSignal, SessionRegistry};
pub use runner::{CallResult, CallRunner, RunnerSettings};
pub use session::{CallServices, CallSession, CloseReason, SessionConfig, SessionState};
pub use stt::{NatsTranscriber, Transcriber, TranscriptEvent, TranscriptionHandle};
pub use telephony::{CallPlacer, TwilioClient};
pub use transcript::{CallTranscript, JsonTranscriptStore, Speaker, TranscriptRecorder, Turn};
pub use tts::{ElevenLabsSynthesizer, Synthesizer};
