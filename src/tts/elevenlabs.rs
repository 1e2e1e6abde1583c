use anyhow::{Context, Result};
use futures::stream::{StreamExt, TryStreamExt};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::{AudioChunkStream, Synthesizer};
use crate::config::SynthesisConfig;

const STREAM_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

/// ElevenLabs streaming TTS, requesting mu-law output so no local
/// conversion is needed before the audio goes back on the line
pub struct ElevenLabsSynthesizer {
    http: reqwest::Client,
    config: SynthesisConfig,
}

impl ElevenLabsSynthesizer {
    pub fn new(config: SynthesisConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, config })
    }
}

#[async_trait::async_trait]
impl Synthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioChunkStream> {
        let url = format!("{}/{}/stream", STREAM_URL, self.config.voice_id);

        let request = SynthesisRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
                style: 0.0,
                use_speaker_boost: true,
            },
        };

        let response = self
            .http
            .post(&url)
            .header("xi-api-key", &self.config.api_key)
            .query(&[("output_format", self.config.output_format.as_str())])
            .json(&request)
            .send()
            .await
            .context("Failed to reach TTS service")?
            .error_for_status()
            .context("TTS request rejected")?;

        debug!("TTS streaming started for: {:.40}", text);

        Ok(response
            .bytes_stream()
            .map_ok(|chunk| chunk.to_vec())
            .map_err(anyhow::Error::from)
            .boxed())
    }
}
