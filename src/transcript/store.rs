use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;

use super::recorder::CallTranscript;

/// Persists finished call transcripts
#[async_trait::async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Save the transcript and return where it went
    async fn save(&self, transcript: &CallTranscript) -> Result<String>;
}

/// Writes one pretty-printed JSON file per call
#[derive(Debug, Clone)]
pub struct JsonTranscriptStore {
    output_dir: PathBuf,
}

impl JsonTranscriptStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn file_name(transcript: &CallTranscript) -> String {
        let scenario = if transcript.scenario.is_empty() {
            "unknown"
        } else {
            transcript.scenario.as_str()
        };
        format!("{}_{}.json", scenario, Utc::now().format("%Y%m%dT%H%M%SZ"))
    }
}

#[async_trait::async_trait]
impl TranscriptStore for JsonTranscriptStore {
    async fn save(&self, transcript: &CallTranscript) -> Result<String> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create transcript dir: {:?}", self.output_dir))?;

        let path = self.output_dir.join(Self::file_name(transcript));
        let json = serde_json::to_string_pretty(transcript)?;

        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write transcript: {:?}", path))?;

        info!(
            "Transcript saved: {} ({} turns, {:.1}s)",
            path.display(),
            transcript.metadata.total_turns,
            transcript.duration_seconds
        );

        Ok(path.display().to_string())
    }
}
