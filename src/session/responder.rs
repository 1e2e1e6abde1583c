use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::state::SessionState;
use crate::audio::FrameChunker;
use crate::dialogue::DialogueOracle;
use crate::media::{MediaSink, OutboundEvent};
use crate::transcript::{Speaker, TranscriptRecorder};
use crate::tts::Synthesizer;

/// What the session should do after a turn was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Keep listening
    Continue,
    /// Goodbye was said; end the call
    Hangup,
    /// The outbound transport is gone
    TransportClosed,
}

#[derive(Debug, Error)]
pub enum SpeakError {
    #[error("speech synthesis failed: {0:#}")]
    Synthesis(anyhow::Error),

    #[error("media send failed: {0:#}")]
    Transport(anyhow::Error),
}

/// Patient side of the conversation for one call
///
/// Owns the dialogue oracle and the outbound sink. At most one turn is in
/// flight: the session hands the responder to `resolve` and only gets it back
/// once the reply has been spoken.
pub struct Responder {
    oracle: Box<dyn DialogueOracle>,
    synthesizer: Arc<dyn Synthesizer>,
    sink: Box<dyn MediaSink>,
    recorder: TranscriptRecorder,
    state: Arc<watch::Sender<SessionState>>,
    config: SessionConfig,
    scenario: String,
    stream_sid: String,

    /// Replies attempted so far
    turn_count: u32,
    sent_opening: bool,
}

impl Responder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        oracle: Box<dyn DialogueOracle>,
        synthesizer: Arc<dyn Synthesizer>,
        sink: Box<dyn MediaSink>,
        recorder: TranscriptRecorder,
        state: Arc<watch::Sender<SessionState>>,
        config: SessionConfig,
        scenario: impl Into<String>,
        stream_sid: impl Into<String>,
    ) -> Self {
        Self {
            oracle,
            synthesizer,
            sink,
            recorder,
            state,
            config,
            scenario: scenario.into(),
            stream_sid: stream_sid.into(),
            turn_count: 0,
            sent_opening: false,
        }
    }

    /// Answer one complete agent turn
    ///
    /// Consumes and returns the responder so the session can run this as a
    /// detached future while it keeps draining the transport.
    pub async fn resolve(mut self, agent_text: String) -> (Self, TurnOutcome) {
        let outcome = if self.should_hang_up(&agent_text).await {
            self.say_goodbye().await
        } else {
            self.reply(&agent_text).await
        };
        (self, outcome)
    }

    async fn should_hang_up(&mut self, agent_text: &str) -> bool {
        if self.turn_count >= self.config.max_turns {
            info!(
                "[{}] Turn limit reached ({}), hanging up",
                self.scenario, self.turn_count
            );
            return true;
        }

        if self.turn_count < self.config.conclusion_floor {
            return false;
        }

        match self.oracle.is_concluding(agent_text).await {
            Ok(true) => {
                info!("[{}] Agent is wrapping up, hanging up", self.scenario);
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!("[{}] Conclusion check failed: {:#}", self.scenario, e);
                false
            }
        }
    }

    async fn reply(&mut self, agent_text: &str) -> TurnOutcome {
        self.turn_count += 1;
        let generated = if self.sent_opening {
            self.oracle.reply(agent_text).await
        } else {
            self.oracle.opening_line().await
        };

        let text = match generated {
            Ok(text) => text,
            Err(e) => {
                warn!("[{}] Failed to generate reply: {:#}", self.scenario, e);
                return TurnOutcome::Continue;
            }
        };

        self.sent_opening = true;
        self.recorder.append(Speaker::Patient, &text).await;
        self.state.send_replace(SessionState::Speaking);

        let mark = format!("turn_{}", self.turn_count);
        match self.speak(&text, &mark).await {
            Ok(()) => TurnOutcome::Continue,
            Err(SpeakError::Synthesis(e)) => {
                warn!("[{}] Speech synthesis failed: {:#}", self.scenario, e);
                TurnOutcome::Continue
            }
            Err(SpeakError::Transport(e)) => {
                warn!("[{}] Media stream went away: {:#}", self.scenario, e);
                TurnOutcome::TransportClosed
            }
        }
    }

    async fn say_goodbye(&mut self) -> TurnOutcome {
        self.state.send_replace(SessionState::Ending);

        // Drop whatever the agent side still has queued for playback
        if let Err(e) = self.sink.send(OutboundEvent::clear(&self.stream_sid)).await {
            warn!("[{}] Failed to clear playback: {:#}", self.scenario, e);
            return TurnOutcome::TransportClosed;
        }

        let line = self.config.goodbye_line.clone();
        self.recorder.append(Speaker::Patient, &line).await;

        match self.speak(&line, "goodbye").await {
            Ok(()) => {}
            Err(SpeakError::Synthesis(e)) => {
                warn!("[{}] Goodbye synthesis failed: {:#}", self.scenario, e);
            }
            Err(SpeakError::Transport(e)) => {
                warn!("[{}] Media stream went away: {:#}", self.scenario, e);
                return TurnOutcome::TransportClosed;
            }
        }

        tokio::time::sleep(self.config.goodbye_grace).await;
        TurnOutcome::Hangup
    }

    /// Synthesize `text` and stream it out in fixed-size frames, then mark
    async fn speak(&mut self, text: &str, mark: &str) -> Result<(), SpeakError> {
        let mut audio = self
            .synthesizer
            .synthesize(text)
            .await
            .map_err(SpeakError::Synthesis)?;

        let mut chunker = FrameChunker::new(self.config.frame_bytes);
        let mut frames_sent = 0usize;

        while let Some(chunk) = audio.next().await {
            let chunk = chunk.map_err(SpeakError::Synthesis)?;
            for frame in chunker.push(&chunk) {
                self.send_frame(&frame).await?;
                frames_sent += 1;
            }
        }

        if let Some(rest) = chunker.finish() {
            self.send_frame(&rest).await?;
            frames_sent += 1;
        }

        self.sink
            .send(OutboundEvent::mark(&self.stream_sid, mark))
            .await
            .map_err(SpeakError::Transport)?;

        debug!(
            "[{}] Sent {} frames for mark {}",
            self.scenario, frames_sent, mark
        );
        Ok(())
    }

    async fn send_frame(&mut self, frame: &[u8]) -> Result<(), SpeakError> {
        self.sink
            .send(OutboundEvent::media(&self.stream_sid, frame))
            .await
            .map_err(SpeakError::Transport)
    }
}
