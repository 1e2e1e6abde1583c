// G.711 mu-law frame codec
//
// The media stream carries 8kHz mono mu-law. These helpers convert between
// mu-law and signed little-endian linear PCM, and cut audio into the fixed
// size frames the stream expects on the way out.

use thiserror::Error;

const BIAS: i32 = 0x84;
const CLIP: i32 = 32635;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid audio data: {0}")]
    InvalidAudioData(String),

    #[error("Unsupported sample width: {0} bytes (expected 1, 2 or 4)")]
    UnsupportedSampleWidth(usize),
}

/// Decode mu-law bytes into linear PCM with `sample_width` bytes per sample
pub fn ulaw_to_linear(ulaw: &[u8], sample_width: usize) -> Result<Vec<u8>, CodecError> {
    check_width(sample_width)?;

    let mut out = Vec::with_capacity(ulaw.len() * sample_width);
    for &byte in ulaw {
        write_sample(&mut out, decode_sample(byte), sample_width);
    }
    Ok(out)
}

/// Encode linear PCM (`sample_width` bytes per sample) into mu-law bytes
pub fn linear_to_ulaw(pcm: &[u8], sample_width: usize) -> Result<Vec<u8>, CodecError> {
    check_width(sample_width)?;

    if pcm.len() % sample_width != 0 {
        return Err(CodecError::InvalidAudioData(format!(
            "{} bytes is not a whole number of {}-byte samples",
            pcm.len(),
            sample_width
        )));
    }

    Ok(pcm
        .chunks_exact(sample_width)
        .map(|sample| encode_sample(read_sample(sample)))
        .collect())
}

/// Split audio into `size`-byte chunks; the last chunk may be shorter
pub fn chunk(audio: &[u8], size: usize) -> Result<Vec<&[u8]>, CodecError> {
    if size == 0 {
        return Err(CodecError::InvalidAudioData(
            "chunk size must be non-zero".to_string(),
        ));
    }
    Ok(audio.chunks(size).collect())
}

/// Encode one 16-bit sample
pub fn encode_sample(sample: i16) -> u8 {
    let mut magnitude = sample as i32;
    let sign = if magnitude < 0 {
        magnitude = -magnitude;
        0x80
    } else {
        0x00
    };

    let magnitude = magnitude.min(CLIP) + BIAS;

    let mut exponent = 7;
    let mut mask = 0x4000;
    while exponent > 0 && magnitude & mask == 0 {
        exponent -= 1;
        mask >>= 1;
    }

    let mantissa = (magnitude >> (exponent + 3)) & 0x0F;
    !(sign | (exponent << 4) | mantissa) as u8
}

/// Decode one mu-law byte to a 16-bit sample
pub fn decode_sample(byte: u8) -> i16 {
    let byte = !byte;
    let exponent = (byte >> 4) & 0x07;
    let mantissa = (byte & 0x0F) as i32;

    let magnitude = (((mantissa << 3) + BIAS) << exponent) - BIAS;
    if byte & 0x80 != 0 {
        -magnitude as i16
    } else {
        magnitude as i16
    }
}

fn check_width(sample_width: usize) -> Result<(), CodecError> {
    match sample_width {
        1 | 2 | 4 => Ok(()),
        other => Err(CodecError::UnsupportedSampleWidth(other)),
    }
}

fn read_sample(bytes: &[u8]) -> i16 {
    match bytes.len() {
        1 => ((bytes[0] as i8) as i16) << 8,
        2 => i16::from_le_bytes([bytes[0], bytes[1]]),
        _ => (i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) >> 16) as i16,
    }
}

fn write_sample(out: &mut Vec<u8>, sample: i16, sample_width: usize) {
    match sample_width {
        1 => out.push(((sample >> 8) as i8) as u8),
        2 => out.extend_from_slice(&sample.to_le_bytes()),
        _ => out.extend_from_slice(&((sample as i32) << 16).to_le_bytes()),
    }
}

/// Rolling re-chunker for outbound audio
///
/// Synthesizer chunks arrive at arbitrary sizes. Frames are released as soon
/// as a full frame is buffered so playback starts early; whatever is left
/// over is released by `finish`.
#[derive(Debug)]
pub struct FrameChunker {
    frame_bytes: usize,
    buffer: Vec<u8>,
}

impl FrameChunker {
    pub fn new(frame_bytes: usize) -> Self {
        Self {
            frame_bytes: frame_bytes.max(1),
            buffer: Vec::with_capacity(frame_bytes * 2),
        }
    }

    /// Buffer `audio` and return every complete frame now available
    pub fn push(&mut self, audio: &[u8]) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(audio);

        let mut frames = Vec::new();
        while self.buffer.len() >= self.frame_bytes {
            frames.push(self.buffer.drain(..self.frame_bytes).collect());
        }
        frames
    }

    /// Take the undersized remainder, if any
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
