use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Event received from the telephony media stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum InboundEvent {
    Connected,
    Start { start: StartMetadata },
    Media { media: MediaPayload },
    Mark { mark: MarkPayload },
    Stop,
    /// Anything else the provider sends (e.g. `dtmf`)
    #[serde(other)]
    Unknown,
}

/// Call metadata carried by the `start` event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMetadata {
    pub stream_sid: String,
    #[serde(default)]
    pub call_sid: String,
    #[serde(default)]
    pub custom_parameters: HashMap<String, String>,
}

impl StartMetadata {
    pub fn scenario(&self) -> Option<&str> {
        self.custom_parameters.get("scenario").map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPayload {
    /// Base64-encoded mu-law audio
    pub payload: String,
}

impl MediaPayload {
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(&self.payload)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkPayload {
    pub name: String,
}

/// Event sent back over the media stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum OutboundEvent {
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: MediaPayload,
    },
    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkPayload,
    },
    /// Drop any audio the provider has queued but not yet played
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

impl OutboundEvent {
    pub fn media(stream_sid: &str, audio: &[u8]) -> Self {
        OutboundEvent::Media {
            stream_sid: stream_sid.to_string(),
            media: MediaPayload {
                payload: base64::engine::general_purpose::STANDARD.encode(audio),
            },
        }
    }

    pub fn mark(stream_sid: &str, name: impl Into<String>) -> Self {
        OutboundEvent::Mark {
            stream_sid: stream_sid.to_string(),
            mark: MarkPayload { name: name.into() },
        }
    }

    pub fn clear(stream_sid: &str) -> Self {
        OutboundEvent::Clear {
            stream_sid: stream_sid.to_string(),
        }
    }

    pub fn mark_name(&self) -> Option<&str> {
        match self {
            OutboundEvent::Mark { mark, .. } => Some(&mark.name),
            _ => None,
        }
    }
}
