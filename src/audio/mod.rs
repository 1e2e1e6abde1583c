pub mod codec;

pub use codec::{chunk, linear_to_ulaw, ulaw_to_linear, CodecError, FrameChunker};

use serde::{Deserialize, Serialize};

/// Encoding of an audio stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    /// G.711 mu-law, one byte per sample
    Mulaw,
    /// Signed 16-bit little-endian PCM
    Linear16,
}

impl AudioEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioEncoding::Mulaw => "mulaw",
            AudioEncoding::Linear16 => "linear16",
        }
    }
}

/// Audio stream format handed to the transcription service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub encoding: AudioEncoding,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
}

impl AudioFormat {
    /// Phone line audio: 8kHz mono mu-law
    pub const TELEPHONY: AudioFormat = AudioFormat {
        encoding: AudioEncoding::Mulaw,
        sample_rate: 8000,
        channels: 1,
    };

    /// Bytes per `duration_ms` of audio in this format
    pub fn bytes_for_ms(&self, duration_ms: u64) -> usize {
        let bytes_per_sample = match self.encoding {
            AudioEncoding::Mulaw => 1,
            AudioEncoding::Linear16 => 2,
        };
        (self.sample_rate as u64 * duration_ms / 1000) as usize
            * bytes_per_sample
            * self.channels as usize
    }
}
