//! Per-call session orchestration
//!
//! A `CallSession` owns one media stream end to end:
//! - Forwarding inbound audio to the transcription stream
//! - Segmenting final transcript fragments into agent turns
//! - Resolving each turn into a spoken patient reply or a goodbye
//! - Tearing everything down exactly once and signalling completion

mod config;
mod responder;
mod segmenter;
mod session;
mod state;

pub use config::SessionConfig;
pub use responder::{Responder, SpeakError, TurnOutcome};
pub use segmenter::TurnSegmenter;
pub use session::{CallServices, CallSession};
pub use state::{CloseReason, SessionState};
