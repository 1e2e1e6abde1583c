//! Streaming speech-to-text
//!
//! A `Transcriber` opens one stream per call. The session feeds it raw
//! inbound audio and reads `TranscriptEvent`s back, in the order the audio
//! was processed.

pub mod messages;
pub mod nats;

pub use messages::{AudioFrameMessage, TranscriptMessage};
pub use nats::NatsTranscriber;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::audio::AudioFormat;

/// Result delivered by a transcription stream
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEvent {
    /// Recognized text; only final results close out a fragment
    Text { text: String, is_final: bool },
    /// The stream can no longer transcribe
    Failed(String),
}

impl TranscriptEvent {
    pub fn interim(text: impl Into<String>) -> Self {
        TranscriptEvent::Text {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        TranscriptEvent::Text {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Write side of an open transcription stream
#[async_trait::async_trait]
pub trait TranscriptionHandle: Send {
    /// Feed raw audio in the format the stream was opened with
    async fn feed(&mut self, audio: &[u8]) -> Result<()>;

    /// Flush and close the stream
    async fn close(&mut self) -> Result<()>;
}

/// An open stream: the handle to feed it and the events it produces
pub struct TranscriptionStream {
    pub handle: Box<dyn TranscriptionHandle>,
    pub events: mpsc::Receiver<TranscriptEvent>,
}

#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Open a stream keyed by `stream_key` for audio in `format`
    async fn open(&self, stream_key: &str, format: AudioFormat) -> Result<TranscriptionStream>;
}
