use serde::Serialize;
use std::fmt;

/// Lifecycle state of a call session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Transport connected, no call metadata yet
    AwaitingStart,
    /// Listening to the agent
    Active,
    /// Playing a patient line
    Speaking,
    /// Saying goodbye
    Ending,
    /// Torn down
    Closed,
}

/// Why a session closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The provider sent `stop`
    StreamStopped,
    /// The media stream ended or a send failed
    TransportClosed,
    TransportError(String),
    /// No inbound message within the receive timeout
    ReceiveTimeout,
    /// The patient said goodbye
    Hangup,
    TranscriptionFailed(String),
    /// A media payload could not be decoded
    InvalidMedia(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::StreamStopped => write!(f, "media stream stopped"),
            CloseReason::TransportClosed => write!(f, "transport closed"),
            CloseReason::TransportError(e) => write!(f, "transport error: {}", e),
            CloseReason::ReceiveTimeout => write!(f, "receive timeout"),
            CloseReason::Hangup => write!(f, "conversation concluded"),
            CloseReason::TranscriptionFailed(e) => write!(f, "transcription failed: {}", e),
            CloseReason::InvalidMedia(e) => write!(f, "invalid media payload: {}", e),
        }
    }
}
