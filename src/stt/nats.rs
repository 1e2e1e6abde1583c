use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine;
use futures::stream::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::messages::{AudioFrameMessage, TranscriptMessage};
use super::{TranscriptEvent, Transcriber, TranscriptionHandle, TranscriptionStream};
use crate::audio::AudioFormat;

/// Transcription over NATS
///
/// Audio frames go out on `audio.frame.call-{key}`; the STT service answers
/// on `stt.text.partial` / `stt.text.final`, tagged with the same key.
#[derive(Clone)]
pub struct NatsTranscriber {
    client: Client,
}

impl NatsTranscriber {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Transcriber for NatsTranscriber {
    async fn open(&self, stream_key: &str, format: AudioFormat) -> Result<TranscriptionStream> {
        // Results for every stream share these subjects; filter on session_id
        let subject = "stt.text.>".to_string();

        let mut subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .context("Failed to subscribe to transcripts")?;

        info!("Subscribed to {} for stream {}", subject, stream_key);

        let (event_tx, event_rx) = mpsc::channel(100);
        let session_id = stream_key.to_string();

        let listener = tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                let transcript = match serde_json::from_slice::<TranscriptMessage>(&msg.payload) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!("Failed to parse transcript message: {}", e);
                        continue;
                    }
                };

                if transcript.session_id != session_id {
                    continue;
                }

                let text = transcript.text.trim();
                if text.is_empty() {
                    continue;
                }

                let event = TranscriptEvent::Text {
                    text: text.to_string(),
                    is_final: !transcript.partial,
                };
                if event_tx.send(event).await.is_err() {
                    break;
                }
            }

            debug!("Transcript listener for {} stopped", session_id);
        });

        Ok(TranscriptionStream {
            handle: Box::new(NatsTranscriptionHandle {
                client: self.client.clone(),
                session_id: stream_key.to_string(),
                format,
                sequence: 0,
                listener: Some(listener),
            }),
            events: event_rx,
        })
    }
}

struct NatsTranscriptionHandle {
    client: Client,
    session_id: String,
    format: AudioFormat,
    sequence: u32,
    listener: Option<JoinHandle<()>>,
}

impl NatsTranscriptionHandle {
    async fn publish_frame(&mut self, audio: &[u8], is_final: bool) -> Result<()> {
        let subject = format!("audio.frame.call-{}", self.session_id);

        let message = AudioFrameMessage {
            session_id: self.session_id.clone(),
            sequence: self.sequence,
            audio: base64::engine::general_purpose::STANDARD.encode(audio),
            encoding: self.format.encoding.as_str().to_string(),
            sample_rate: self.format.sample_rate,
            channels: self.format.channels,
            timestamp: chrono::Utc::now().to_rfc3339(),
            final_frame: is_final,
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject, payload.into())
            .await
            .context("Failed to publish audio frame")?;

        self.sequence = self.sequence.wrapping_add(1);
        Ok(())
    }
}

#[async_trait::async_trait]
impl TranscriptionHandle for NatsTranscriptionHandle {
    async fn feed(&mut self, audio: &[u8]) -> Result<()> {
        self.publish_frame(audio, false).await
    }

    async fn close(&mut self) -> Result<()> {
        let Some(listener) = self.listener.take() else {
            return Ok(());
        };

        info!("Closing transcription stream {}", self.session_id);

        let result = self.publish_frame(&[], true).await;
        if let Err(e) = &result {
            error!("Failed to publish final frame marker: {}", e);
        }

        listener.abort();
        result
    }
}

impl Drop for NatsTranscriptionHandle {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}
