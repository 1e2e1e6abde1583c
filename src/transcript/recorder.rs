use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;

/// Who said a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The voice agent under test
    Agent,
    /// The simulated caller
    Patient,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Agent => write!(f, "AGENT"),
            Speaker::Patient => write!(f, "PATIENT"),
        }
    }
}

/// A single logged utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,

    pub text: String,

    /// Seconds since the session started (two decimals)
    #[serde(rename = "timestamp")]
    pub offset_secs: f64,
}

/// Identifiers attached to a transcript once the call is known
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallMetadata {
    pub call_sid: String,
    pub stream_sid: String,
    pub scenario: String,
}

/// A finished call's transcript, ready to persist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallTranscript {
    pub call_id: String,
    pub scenario: String,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: f64,
    pub transcript: Vec<Turn>,
    pub metadata: TranscriptMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    pub stream_sid: String,
    pub total_turns: usize,
}

/// Append-only turn log for one call
///
/// Clones share the same log, so the session, its responder and the registry
/// all see the same turns.
#[derive(Debug, Clone)]
pub struct TranscriptRecorder {
    started_at: Instant,
    label: Arc<std::sync::Mutex<String>>,
    turns: Arc<Mutex<Vec<Turn>>>,
}

impl TranscriptRecorder {
    /// Start a new log; offsets are measured from now
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            started_at: Instant::now(),
            label: Arc::new(std::sync::Mutex::new(label.into())),
            turns: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Change the label used in log lines (the scenario, once known)
    pub fn relabel(&self, label: impl Into<String>) {
        if let Ok(mut current) = self.label.lock() {
            *current = label.into();
        }
    }

    pub async fn append(&self, speaker: Speaker, text: &str) {
        let offset_secs = (self.elapsed_secs() * 100.0).round() / 100.0;

        let label = self
            .label
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default();
        info!("[{}] {}: {}", label, speaker, text);

        let mut turns = self.turns.lock().await;
        turns.push(Turn {
            speaker,
            text: text.to_string(),
            offset_secs,
        });
    }

    pub async fn turns(&self) -> Vec<Turn> {
        self.turns.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.turns.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.turns.lock().await.is_empty()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    /// Build the persistable transcript for this call
    pub async fn snapshot(&self, call: &CallMetadata) -> CallTranscript {
        let transcript = self.turns().await;

        CallTranscript {
            call_id: call.call_sid.clone(),
            scenario: call.scenario.clone(),
            timestamp: Utc::now(),
            duration_seconds: (self.elapsed_secs() * 10.0).round() / 10.0,
            metadata: TranscriptMetadata {
                stream_sid: call.stream_sid.clone(),
                total_turns: transcript.len(),
            },
            transcript,
        }
    }
}

impl CallTranscript {
    /// Plain-text rendering, one line per turn
    pub fn to_readable_text(&self) -> String {
        let mut lines = vec![format!("=== Scenario: {} ===", self.scenario)];
        for turn in &self.transcript {
            lines.push(format!(
                "[{:6.1}s] {}: {}",
                turn.offset_secs, turn.speaker, turn.text
            ));
        }
        lines.join("\n")
    }
}
