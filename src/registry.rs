//! Process-wide call registry
//!
//! Maps a call SID to its completion signal and its turn log. The media
//! stream handler raises the signal when a session closes; the call runner
//! (or anything else) waits on it with a bounded timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::debug;

use crate::transcript::TranscriptRecorder;

/// One-shot "call finished" flag
///
/// Once raised it stays raised. Waiters can live on any task or runtime.
#[derive(Debug, Clone)]
pub struct CompletionSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl CompletionSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Raise the signal; returns `true` only for the first raise
    pub fn raise(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub fn is_raised(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until raised or until `timeout` elapses; `true` if raised
    pub async fn wait(&self, timeout: Duration) -> bool {
        let mut rx = self.tx.subscribe();
        let outcome = tokio::time::timeout(timeout, rx.wait_for(|raised| *raised)).await;
        matches!(outcome, Ok(Ok(_)))
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// Active calls (call_sid → completion signal)
    signals: RwLock<HashMap<String, CompletionSignal>>,

    /// Turn logs (call_sid → recorder), kept after release
    transcripts: RwLock<HashMap<String, TranscriptRecorder>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the signal for `call_sid`, creating it if absent
    pub async fn register(&self, call_sid: &str) -> CompletionSignal {
        let mut signals = self.signals.write().await;
        signals
            .entry(call_sid.to_string())
            .or_insert_with(CompletionSignal::new)
            .clone()
    }

    pub async fn get(&self, call_sid: &str) -> Option<CompletionSignal> {
        self.signals.read().await.get(call_sid).cloned()
    }

    /// Wait for `call_sid` to complete
    ///
    /// Returns `false` on timeout. The caller is then expected to terminate
    /// the call out-of-band and `complete` it itself so no waiter hangs.
    pub async fn wait(&self, call_sid: &str, timeout: Duration) -> bool {
        let signal = self.register(call_sid).await;
        signal.wait(timeout).await
    }

    /// Raise the signal for a registered call
    ///
    /// Returns `true` if this call raised it; unknown calls are ignored.
    pub async fn complete(&self, call_sid: &str) -> bool {
        match self.get(call_sid).await {
            Some(signal) => {
                let first = signal.raise();
                debug!("Call {} completed (first signal: {})", call_sid, first);
                first
            }
            None => {
                debug!("Completion for unregistered call {}", call_sid);
                false
            }
        }
    }

    /// Forget the signal for `call_sid`; missing entries are fine
    pub async fn release(&self, call_sid: &str) {
        self.signals.write().await.remove(call_sid);
    }

    pub async fn attach_transcript(&self, call_sid: &str, recorder: TranscriptRecorder) {
        self.transcripts
            .write()
            .await
            .insert(call_sid.to_string(), recorder);
    }

    pub async fn transcript(&self, call_sid: &str) -> Option<TranscriptRecorder> {
        self.transcripts.read().await.get(call_sid).cloned()
    }

    pub async fn active_calls(&self) -> Vec<String> {
        let signals = self.signals.read().await;
        signals
            .iter()
            .filter(|(_, signal)| !signal.is_raised())
            .map(|(sid, _)| sid.clone())
            .collect()
    }
}
