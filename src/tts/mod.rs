//! Streaming text-to-speech
//!
//! Synthesizers return audio already in the phone line encoding (8kHz
//! mu-law), chunked however the engine likes.

pub mod elevenlabs;

pub use elevenlabs::ElevenLabsSynthesizer;

use anyhow::Result;
use futures::stream::BoxStream;

/// Lazy, finite stream of encoded audio chunks
pub type AudioChunkStream = BoxStream<'static, Result<Vec<u8>>>;

#[async_trait::async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioChunkStream>;
}
